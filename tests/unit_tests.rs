use std::fs;
use std::path::Path;

use convert_dataset::conversion::{ConversionTable, STANDARD_CONVERSIONS};
use convert_dataset::kitti::{format_kitti_line, parse_kitti_line, read_kitti_labels};
use convert_dataset::lisa::{read_lisa_annotations, LisaWriter};
use convert_dataset::voc::{format_voc_document, parse_voc_document};
use convert_dataset::yolo::{format_yolo_line, parse_yolo_line};
use convert_dataset::{
    Annotation, BoundingBox, CenterBox, ConvertError, CornerBox, Format, ImageSize, LabelIndex,
};

fn labels() -> LabelIndex {
    LabelIndex::new(["Car", "Pedestrian"]).unwrap()
}

#[test]
fn test_parse_kitti_line() {
    let line = "Car 0.00 0 -1.58 587.01 173.33 614.12 200.12 1.65 1.67 3.64 -0.65 1.71 46.70 -1.59";
    let annotation = parse_kitti_line(line, Path::new("000001.txt"), 1)
        .unwrap()
        .unwrap();

    assert_eq!(annotation.class_label, "Car");
    assert_eq!(
        annotation.bbox,
        BoundingBox::Corners(CornerBox::new(587, 173, 614, 200))
    );
    assert_eq!(annotation.truncated, Some(0.0));
    assert_eq!(annotation.occluded, Some(0));
    assert_eq!(annotation.alpha, Some(-1.58));
}

#[test]
fn test_parse_kitti_line_accepts_dont_care_and_score() {
    let line = "DontCare -1 -1 -10 503.89 169.71 590.61 190.13 -1 -1 -1 -1000 -1000 -1000 -10 0.87";
    let annotation = parse_kitti_line(line, Path::new("000002.txt"), 3)
        .unwrap()
        .unwrap();
    assert_eq!(annotation.occluded, Some(-1));
    assert_eq!(
        annotation.bbox,
        BoundingBox::Corners(CornerBox::new(503, 169, 590, 190))
    );

    assert!(parse_kitti_line("   ", Path::new("000002.txt"), 4)
        .unwrap()
        .is_none());
}

#[test]
fn test_kitti_short_line_is_malformed() {
    let result = parse_kitti_line("Car 0 0", Path::new("labels/000003.txt"), 7);
    match result {
        Err(ConvertError::MalformedLabelLine { path, line, .. }) => {
            assert_eq!(path, Path::new("labels/000003.txt"));
            assert_eq!(line, 7);
        }
        other => panic!("expected MalformedLabelLine, got {:?}", other),
    }
}

#[test]
fn test_kitti_non_numeric_coordinate_is_malformed() {
    let line = "Car 0 0 0 ten 20 110 220 0 0 0 0 0 0 0";
    assert!(matches!(
        parse_kitti_line(line, Path::new("a.txt"), 2),
        Err(ConvertError::MalformedLabelLine { line: 2, .. })
    ));
}

#[test]
fn test_read_kitti_labels_missing_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let missing = temp_dir.path().join("missing.txt");
    assert!(matches!(
        read_kitti_labels(&missing),
        Err(ConvertError::LabelFileNotFound { path }) if path == missing
    ));
}

#[test]
fn test_read_kitti_labels_preserves_order() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("000001.txt");
    fs::write(
        &path,
        "Pedestrian 0 0 0 1 2 3 4 0 0 0 0 0 0 0\n\nCar 0 0 0 5 6 7 8 0 0 0 0 0 0 0\n",
    )
    .unwrap();

    let annotations = read_kitti_labels(&path).unwrap();
    let names: Vec<_> = annotations.iter().map(|a| a.class_label.as_str()).collect();
    assert_eq!(names, ["Pedestrian", "Car"]);
}

#[test]
fn test_format_kitti_line_from_normalized_box() {
    let annotation = Annotation::new(
        "Car",
        BoundingBox::Normalized(CenterBox {
            cx: 0.5,
            cy: 0.5,
            w: 0.5,
            h: 0.5,
        }),
    );
    let line = format_kitti_line(&annotation, ImageSize::new(100, 100)).unwrap();
    assert_eq!(line, "Car 0 0 0 25 25 75 75 0 0 0 0 0 0 0");
    assert_eq!(line.split_whitespace().count(), 15);
}

#[test]
fn test_parse_kitti_line_float_occlusion() {
    let line = "Car 0.00 1.00 0.00 10 20 30 40 0 0 0 0 0 0 0";
    let annotation = parse_kitti_line(line, Path::new("a.txt"), 1)
        .unwrap()
        .unwrap();
    assert_eq!(annotation.occluded, Some(1));
}

#[test]
fn test_kitti_non_finite_coordinate_is_malformed() {
    for line in [
        "Car 0 0 0 nan 20 110 220 0 0 0 0 0 0 0",
        "Car 0 0 0 10 20 inf 220 0 0 0 0 0 0 0",
    ] {
        assert!(matches!(
            parse_kitti_line(line, Path::new("a.txt"), 1),
            Err(ConvertError::MalformedLabelLine { line: 1, .. })
        ));
    }
}

#[test]
fn test_format_kitti_line_rejects_multi_word_label() {
    let annotation = Annotation::new(
        "traffic light",
        BoundingBox::Corners(CornerBox::new(1, 2, 30, 40)),
    );
    assert!(matches!(
        format_kitti_line(&annotation, ImageSize::new(100, 100)),
        Err(ConvertError::UnwritableLabel { name, format: Format::Kitti, .. }) if name == "traffic light"
    ));
}

#[test]
fn test_parse_yolo_line() {
    let annotation = parse_yolo_line("1 0.3 0.3 0.5 0.5", &labels(), Path::new("a.txt"), 1)
        .unwrap()
        .unwrap();
    assert_eq!(annotation.class_label, "Pedestrian");
    assert_eq!(
        annotation.bbox,
        BoundingBox::Normalized(CenterBox {
            cx: 0.3,
            cy: 0.3,
            w: 0.5,
            h: 0.5
        })
    );
}

#[test]
fn test_parse_yolo_line_errors() {
    assert!(matches!(
        parse_yolo_line("0 0.5 0.5", &labels(), Path::new("a.txt"), 4),
        Err(ConvertError::MalformedLabelLine { line: 4, .. })
    ));
    assert!(matches!(
        parse_yolo_line("5 0.5 0.5 0.1 0.1", &labels(), Path::new("a.txt"), 1),
        Err(ConvertError::IndexOutOfRange { index: 5, len: 2 })
    ));
    assert!(matches!(
        parse_yolo_line("-1 0.5 0.5 0.1 0.1", &labels(), Path::new("a.txt"), 1),
        Err(ConvertError::IndexOutOfRange { index: -1, .. })
    ));
}

#[test]
fn test_parse_yolo_line_rejects_non_finite() {
    for line in ["0 nan 0.5 0.1 0.1", "0 0.5 0.5 inf 0.1", "1 0.5 -inf 0.1 0.1"] {
        assert!(matches!(
            parse_yolo_line(line, &labels(), Path::new("a.txt"), 2),
            Err(ConvertError::MalformedLabelLine { line: 2, .. })
        ));
    }
}

#[test]
fn test_format_yolo_line() {
    let annotation = Annotation::new(
        "Pedestrian",
        BoundingBox::Corners(CornerBox::new(10, 20, 110, 220)),
    );
    let line = format_yolo_line(&annotation, &labels(), ImageSize::new(200, 400)).unwrap();
    assert_eq!(line, "1 0.300000 0.300000 0.500000 0.500000");

    let unknown = Annotation::new("Bus", BoundingBox::Corners(CornerBox::new(0, 0, 1, 1)));
    assert!(matches!(
        format_yolo_line(&unknown, &labels(), ImageSize::new(200, 400)),
        Err(ConvertError::UnknownLabel { name }) if name == "Bus"
    ));
    assert!(matches!(
        format_yolo_line(&annotation, &labels(), ImageSize::new(0, 400)),
        Err(ConvertError::InvalidImageDimensions { .. })
    ));
}

#[test]
fn test_voc_document_defaults() {
    let annotations = vec![
        Annotation::new("Car", BoundingBox::Corners(CornerBox::new(10, 20, 110, 220))),
        Annotation::new(
            "Pedestrian",
            BoundingBox::Corners(CornerBox::new(1, 2, 3, 4)),
        ),
    ];
    let xml =
        format_voc_document("images", "000001.png", &annotations, ImageSize::new(200, 400))
            .unwrap();

    assert!(xml.contains("<filename>000001.png</filename>"));
    assert!(xml.contains("<width>200</width>"));
    assert!(xml.contains("<height>400</height>"));
    assert!(xml.contains("<pose>Unspecified</pose>"));
    assert!(xml.contains("<truncated>0</truncated>"));
    assert!(xml.contains("<difficult>0</difficult>"));
    assert!(!xml.contains("<truncated>1</truncated>"));

    let parsed = parse_voc_document(&xml, Path::new("000001.xml")).unwrap();
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].class_label, "Car");
    assert_eq!(
        parsed[0].bbox,
        BoundingBox::Corners(CornerBox::new(10, 20, 110, 220))
    );
    assert_eq!(parsed[1].class_label, "Pedestrian");
    assert_eq!(parsed[1].pose.as_deref(), Some("Unspecified"));
}

#[test]
fn test_voc_truncation_passes_through() {
    let mut truncated = Annotation::new("Car", BoundingBox::Corners(CornerBox::new(0, 0, 5, 5)));
    truncated.truncated = Some(0.4);
    truncated.difficult = Some(true);
    let xml = format_voc_document("images", "a.png", &[truncated], ImageSize::new(10, 10)).unwrap();

    let parsed = parse_voc_document(&xml, Path::new("a.xml")).unwrap();
    assert_eq!(parsed[0].truncated, Some(1.0));
    assert_eq!(parsed[0].difficult, Some(true));
}

#[test]
fn test_parse_voc_document() {
    let xml = r#"<annotation>
    <folder>VOC2007</folder>
    <filename>000005.jpg</filename>
    <size><width>500</width><height>375</height><depth>3</depth></size>
    <segmented>0</segmented>
    <object>
        <name>chair</name>
        <pose>Rear</pose>
        <truncated>0</truncated>
        <difficult>0</difficult>
        <bndbox><xmin>263</xmin><ymin>211</ymin><xmax>324</xmax><ymax>339</ymax></bndbox>
    </object>
    <object>
        <name>diningtable</name>
        <bndbox><xmin>12.7</xmin><ymin>1</ymin><xmax>60</xmax><ymax>90</ymax></bndbox>
    </object>
</annotation>"#;

    let annotations = parse_voc_document(xml, Path::new("000005.xml")).unwrap();
    assert_eq!(annotations.len(), 2);
    assert_eq!(annotations[0].class_label, "chair");
    assert_eq!(annotations[0].pose.as_deref(), Some("Rear"));
    assert_eq!(annotations[0].difficult, Some(false));
    assert_eq!(
        annotations[1].bbox,
        BoundingBox::Corners(CornerBox::new(12, 1, 60, 90))
    );
    assert_eq!(annotations[1].pose, None);
}

#[test]
fn test_parse_voc_document_malformed() {
    let xml = "<annotation><object><name>car</name></object></annotation>";
    assert!(matches!(
        parse_voc_document(xml, Path::new("bad.xml")),
        Err(ConvertError::MalformedLabelFile { .. })
    ));
}

#[test]
fn test_parse_voc_document_non_finite_box() {
    let xml = "<annotation><object><name>car</name>\
               <bndbox><xmin>nan</xmin><ymin>0</ymin><xmax>10</xmax><ymax>10</ymax></bndbox>\
               </object></annotation>";
    assert!(matches!(
        parse_voc_document(xml, Path::new("nan.xml")),
        Err(ConvertError::MalformedLabelFile { .. })
    ));
}

#[test]
fn test_read_lisa_annotations_by_header() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("annotations.csv");
    fs::write(
        &path,
        "Annotation tag;Filename;Occluded;Upper left corner Y;Upper left corner X;Lower right corner X;Lower right corner Y\n\
         stop;images/stop_1.png;0;20;10;110;220\n\
         pedestrianCrossing;images/ped_1.png;1;5;6;7;8\n\
         speedLimit25;images/stop_1.png;0;30;40;50;60\n",
    )
    .unwrap();

    let entries = read_lisa_annotations(&path).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].filename, "images/stop_1.png");
    assert_eq!(entries[0].annotations.len(), 2);
    assert_eq!(entries[0].annotations[0].class_label, "stop");
    assert_eq!(
        entries[0].annotations[0].bbox,
        BoundingBox::Corners(CornerBox::new(10, 20, 110, 220))
    );
    assert_eq!(entries[0].annotations[1].class_label, "speedLimit25");
    assert_eq!(entries[1].filename, "images/ped_1.png");
}

#[test]
fn test_read_lisa_annotations_missing_column() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("annotations.csv");
    fs::write(
        &path,
        "Filename;Annotation tag;Upper left corner X;Upper left corner Y;Lower right corner X\n",
    )
    .unwrap();

    assert!(matches!(
        read_lisa_annotations(&path),
        Err(ConvertError::MissingColumn { column, .. }) if column == "Lower right corner Y"
    ));
}

#[test]
fn test_read_lisa_annotations_malformed_row() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("annotations.csv");
    fs::write(
        &path,
        "Filename;Annotation tag;Upper left corner X;Upper left corner Y;Lower right corner X;Lower right corner Y\n\
         a.png;stop;1;2;3;4\n\
         b.png;stop;x;2;3;4\n",
    )
    .unwrap();

    assert!(matches!(
        read_lisa_annotations(&path),
        Err(ConvertError::MalformedLabelLine { line: 3, .. })
    ));
    assert!(matches!(
        read_lisa_annotations(&temp_dir.path().join("missing.csv")),
        Err(ConvertError::LabelFileNotFound { .. })
    ));
}

#[test]
fn test_lisa_writer_round_trip() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("annotations.csv");

    let mut writer = LisaWriter::create(&path).unwrap();
    let annotation = Annotation::new(
        "stop",
        BoundingBox::Normalized(CenterBox {
            cx: 0.5,
            cy: 0.5,
            w: 0.5,
            h: 0.5,
        }),
    );
    writer
        .write_image("images/stop_1.png", &[annotation], ImageSize::new(100, 100))
        .unwrap();
    writer.finish().unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next(),
        Some("Filename;Annotation tag;Upper left corner X;Upper left corner Y;Lower right corner X;Lower right corner Y")
    );
    assert_eq!(lines.next(), Some("images/stop_1.png;stop;25;25;75;75"));

    let entries = read_lisa_annotations(&path).unwrap();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_label_index_load() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("labels.txt");
    fs::write(&path, "Car\nPedestrian\n\nCyclist\n").unwrap();

    let labels = LabelIndex::load(&path).unwrap();
    assert_eq!(labels.names(), ["Car", "Pedestrian", "Cyclist"]);

    let empty = temp_dir.path().join("empty.txt");
    fs::write(&empty, "\n\n").unwrap();
    assert!(matches!(
        LabelIndex::load(&empty),
        Err(ConvertError::EmptyLabelIndex { .. })
    ));
    assert!(matches!(
        LabelIndex::load(&temp_dir.path().join("missing.txt")),
        Err(ConvertError::LabelFileNotFound { .. })
    ));
}

#[test]
fn test_conversion_table() {
    let table = ConversionTable::standard();
    assert_eq!(table.pairs().len(), STANDARD_CONVERSIONS.len());
    for from in Format::ALL {
        for to in Format::ALL {
            assert_eq!(table.is_supported(from, to), from != to);
        }
    }

    let restricted = ConversionTable::with_pairs([(Format::Kitti, Format::Yolo)]);
    assert!(restricted.resolve(Format::Kitti, Format::Yolo).is_ok());
    assert!(matches!(
        restricted.resolve(Format::Lisa, Format::Voc),
        Err(ConvertError::UnsupportedConversion {
            from: Format::Lisa,
            to: Format::Voc
        })
    ));
}
