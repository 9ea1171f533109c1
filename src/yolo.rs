//! YOLO label files, image manifests and `dataset.yaml`.
//!
//! One object per line: `class_index cx cy w h`, all coordinates normalized
//! to the image size.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};
use crate::labels::LabelIndex;
use crate::types::{Annotation, BoundingBox, CenterBox, ImageSize, Split};
use crate::utils::{parse_coordinate, parse_field, read_label_file};

/// Number of columns in a YOLO detection line.
pub const YOLO_FIELDS: usize = 5;

/// Read every annotation of a YOLO label file, resolving class indices
/// against `labels`.
pub fn read_yolo_labels(path: &Path, labels: &LabelIndex) -> Result<Vec<Annotation>> {
    let content = read_label_file(path)?;
    let mut annotations = Vec::new();
    for (line_idx, line) in content.lines().enumerate() {
        if let Some(annotation) = parse_yolo_line(line, labels, path, line_idx + 1)? {
            annotations.push(annotation);
        }
    }
    Ok(annotations)
}

/// Parse one YOLO line. Blank lines yield `None`.
pub fn parse_yolo_line(
    line: &str,
    labels: &LabelIndex,
    path: &Path,
    line_num: usize,
) -> Result<Option<Annotation>> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.is_empty() {
        return Ok(None);
    }
    if fields.len() != YOLO_FIELDS {
        return Err(ConvertError::MalformedLabelLine {
            path: path.to_path_buf(),
            line: line_num,
            reason: format!("expected {} fields, found {}", YOLO_FIELDS, fields.len()),
        });
    }

    let class_index: i64 = parse_field(fields[0], "class index", path, line_num)?;
    let class_label = labels.name_of(class_index)?;
    let center = CenterBox {
        cx: parse_coordinate(fields[1], "x_center", path, line_num)?,
        cy: parse_coordinate(fields[2], "y_center", path, line_num)?,
        w: parse_coordinate(fields[3], "width", path, line_num)?,
        h: parse_coordinate(fields[4], "height", path, line_num)?,
    };

    Ok(Some(Annotation::new(
        class_label,
        BoundingBox::Normalized(center),
    )))
}

/// Format one annotation as a YOLO line, without the trailing newline.
pub fn format_yolo_line(
    annotation: &Annotation,
    labels: &LabelIndex,
    size: ImageSize,
) -> Result<String> {
    let class_id = labels.index_of(&annotation.class_label)?;
    let center = annotation.bbox.to_normalized(size)?;
    Ok(format!(
        "{} {:.6} {:.6} {:.6} {:.6}",
        class_id, center.cx, center.cy, center.w, center.h
    ))
}

/// Write a YOLO label file, replacing any existing file.
pub fn write_yolo_labels(
    path: &Path,
    annotations: &[Annotation],
    labels: &LabelIndex,
    size: ImageSize,
) -> Result<()> {
    let mut yolo_data = String::with_capacity(annotations.len() * 40);
    for annotation in annotations {
        yolo_data.push_str(&format_yolo_line(annotation, labels, size)?);
        yolo_data.push('\n');
    }

    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(yolo_data.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Path of the `train.txt` / `val.txt` manifest for a split.
pub fn manifest_path(root: &Path, split: Split) -> PathBuf {
    root.join(format!("{}.txt", split.as_str()))
}

/// Write a manifest listing one absolute image path per line.
pub fn write_image_manifest(path: &Path, image_paths: &[PathBuf]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for image_path in image_paths {
        writeln!(writer, "{}", image_path.display())?;
    }
    writer.flush()?;
    Ok(())
}

/// Create the dataset.yaml file for YOLO training
pub fn create_dataset_yaml(root: &Path, labels: &LabelIndex) -> Result<()> {
    let dataset_yaml_path = root.join("dataset.yaml");
    let mut dataset_yaml = BufWriter::new(File::create(&dataset_yaml_path)?);
    let absolute_path = fs::canonicalize(root)?;
    let mut yaml_content = format!(
        "path: {}\ntrain: {}\nval: {}\n",
        absolute_path.to_string_lossy(),
        manifest_path(Path::new(""), Split::Train).display(),
        manifest_path(Path::new(""), Split::Val).display()
    );
    yaml_content.push_str("\nnames:\n");
    for (id, label) in labels.names().iter().enumerate() {
        yaml_content.push_str(&format!("    {}: {}\n", id, label));
    }
    dataset_yaml.write_all(yaml_content.as_bytes())?;
    dataset_yaml.flush()?;
    Ok(())
}
