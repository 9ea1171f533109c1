//! Pascal VOC XML annotations.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{ConvertError, Result};
use crate::types::{Annotation, BoundingBox, CornerBox, ImageSize};
use crate::utils::read_label_file;

/// Values written for attributes the source format does not track.
pub const DEFAULT_POSE: &str = "Unspecified";
pub const DEFAULT_DEPTH: u32 = 3;

#[derive(Debug, Deserialize)]
struct VocDocument {
    #[serde(rename = "object", default)]
    objects: Vec<VocObject>,
}

#[derive(Debug, Deserialize)]
struct VocObject {
    name: String,
    pose: Option<String>,
    truncated: Option<f64>,
    difficult: Option<u8>,
    bndbox: VocBndBox,
}

#[derive(Debug, Deserialize)]
struct VocBndBox {
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
}

/// Read every `object` of a VOC annotation document in document order.
pub fn read_voc_labels(path: &Path) -> Result<Vec<Annotation>> {
    let content = read_label_file(path)?;
    parse_voc_document(&content, path)
}

/// Parse VOC XML text. `path` is only used for error reporting.
pub fn parse_voc_document(content: &str, path: &Path) -> Result<Vec<Annotation>> {
    let document: VocDocument =
        quick_xml::de::from_str(content).map_err(|e| ConvertError::MalformedLabelFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut annotations = Vec::with_capacity(document.objects.len());
    for object in document.objects {
        let b = object.bndbox;
        if ![b.xmin, b.ymin, b.xmax, b.ymax].iter().all(|v| v.is_finite()) {
            return Err(ConvertError::MalformedLabelFile {
                path: path.to_path_buf(),
                reason: format!("non-finite bndbox for object '{}'", object.name),
            });
        }
        let corners = CornerBox::from_f64(b.xmin, b.ymin, b.xmax, b.ymax);
        let mut annotation = Annotation::new(object.name, BoundingBox::Corners(corners));
        annotation.truncated = object.truncated;
        annotation.difficult = object.difficult.map(|d| d != 0);
        annotation.pose = object.pose;
        annotations.push(annotation);
    }
    Ok(annotations)
}

fn xml_error(e: impl std::fmt::Display) -> ConvertError {
    ConvertError::Xml {
        reason: e.to_string(),
    }
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)?;
    Ok(())
}

fn start<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_error)
}

fn end<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<()> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)
}

/// Render a VOC annotation document for one image.
///
/// `truncated` is written as `1` only when the source reported a positive
/// truncation; unknown truncation is written as `0`.
pub fn format_voc_document(
    folder: &str,
    filename: &str,
    annotations: &[Annotation],
    size: ImageSize,
) -> Result<String> {
    let mut buffer = Vec::new();
    let mut writer = Writer::new_with_indent(&mut buffer, b' ', 4);

    start(&mut writer, "annotation")?;
    write_text_element(&mut writer, "folder", folder)?;
    write_text_element(&mut writer, "filename", filename)?;

    start(&mut writer, "size")?;
    write_text_element(&mut writer, "width", &size.width.to_string())?;
    write_text_element(&mut writer, "height", &size.height.to_string())?;
    write_text_element(&mut writer, "depth", &DEFAULT_DEPTH.to_string())?;
    end(&mut writer, "size")?;
    write_text_element(&mut writer, "segmented", "0")?;

    for annotation in annotations {
        let corners = annotation.bbox.to_corners(size)?;
        let truncated = annotation.truncated.map_or(0, |t| u8::from(t > 0.0));
        let difficult = annotation.difficult.map_or(0, u8::from);

        start(&mut writer, "object")?;
        write_text_element(&mut writer, "name", &annotation.class_label)?;
        write_text_element(
            &mut writer,
            "pose",
            annotation.pose.as_deref().unwrap_or(DEFAULT_POSE),
        )?;
        write_text_element(&mut writer, "truncated", &truncated.to_string())?;
        write_text_element(&mut writer, "difficult", &difficult.to_string())?;
        start(&mut writer, "bndbox")?;
        write_text_element(&mut writer, "xmin", &corners.xmin.to_string())?;
        write_text_element(&mut writer, "ymin", &corners.ymin.to_string())?;
        write_text_element(&mut writer, "xmax", &corners.xmax.to_string())?;
        write_text_element(&mut writer, "ymax", &corners.ymax.to_string())?;
        end(&mut writer, "bndbox")?;
        end(&mut writer, "object")?;
    }

    end(&mut writer, "annotation")?;

    let mut document = String::from_utf8(buffer).map_err(xml_error)?;
    document.push('\n');
    Ok(document)
}

/// Write a VOC annotation file, replacing any existing file.
pub fn write_voc_labels(
    path: &Path,
    folder: &str,
    filename: &str,
    annotations: &[Annotation],
    size: ImageSize,
) -> Result<()> {
    let document = format_voc_document(folder, filename, annotations, size)?;
    fs::write(path, document)?;
    Ok(())
}
