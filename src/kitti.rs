//! KITTI label files.
//!
//! One object per line, space separated:
//! `type truncated occluded alpha left top right bottom h w l x y z rotation_y [score]`.
//! Only the type and the 2D box carry meaning across formats; truncation,
//! occlusion and alpha are passed through when available and written as `0`
//! otherwise, and the 3D fields are always written as `0`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{ConvertError, Result};
use crate::types::{Annotation, BoundingBox, CornerBox, Format, ImageSize};
use crate::utils::{parse_coordinate, read_label_file};

/// Number of columns in a KITTI training label line.
pub const KITTI_FIELDS: usize = 15;

/// Read every annotation of a KITTI label file in file order.
pub fn read_kitti_labels(path: &Path) -> Result<Vec<Annotation>> {
    let content = read_label_file(path)?;
    let mut annotations = Vec::new();
    for (line_idx, line) in content.lines().enumerate() {
        if let Some(annotation) = parse_kitti_line(line, path, line_idx + 1)? {
            annotations.push(annotation);
        }
    }
    Ok(annotations)
}

/// Parse one KITTI line. Blank lines yield `None`.
pub fn parse_kitti_line(line: &str, path: &Path, line_num: usize) -> Result<Option<Annotation>> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.is_empty() {
        return Ok(None);
    }
    // A 16th score column appears in detection results
    if fields.len() < KITTI_FIELDS || fields.len() > KITTI_FIELDS + 1 {
        return Err(ConvertError::MalformedLabelLine {
            path: path.to_path_buf(),
            line: line_num,
            reason: format!(
                "expected {} fields, found {}",
                KITTI_FIELDS,
                fields.len()
            ),
        });
    }

    let coord = |idx: usize, column: &str| parse_coordinate(fields[idx], column, path, line_num);
    let corners = CornerBox::from_f64(
        coord(4, "left")?,
        coord(5, "top")?,
        coord(6, "right")?,
        coord(7, "bottom")?,
    );

    let mut annotation = Annotation::new(fields[0], BoundingBox::Corners(corners));
    annotation.truncated = Some(coord(1, "truncated")?);
    // Some tools write the occlusion state as a float
    annotation.occluded = Some(coord(2, "occluded")? as i32);
    annotation.alpha = Some(coord(3, "alpha")?);
    Ok(Some(annotation))
}

/// Format one annotation as a KITTI line, without the trailing newline.
///
/// Class names containing whitespace are rejected, since the type column
/// ends at the first space.
pub fn format_kitti_line(annotation: &Annotation, size: ImageSize) -> Result<String> {
    let label = annotation.class_label.as_str();
    if label.is_empty() || label.chars().any(char::is_whitespace) {
        return Err(ConvertError::UnwritableLabel {
            name: label.to_string(),
            format: Format::Kitti,
            reason: "KITTI class names must be a single non-empty token".to_string(),
        });
    }
    let corners = annotation.bbox.to_corners(size)?;
    Ok(format!(
        "{} {} {} {} {} {} {} {} 0 0 0 0 0 0 0",
        label,
        annotation.truncated.unwrap_or(0.0),
        annotation.occluded.unwrap_or(0),
        annotation.alpha.unwrap_or(0.0),
        corners.xmin,
        corners.ymin,
        corners.xmax,
        corners.ymax
    ))
}

/// Write a KITTI label file, replacing any existing file.
pub fn write_kitti_labels(path: &Path, annotations: &[Annotation], size: ImageSize) -> Result<()> {
    let mut lines = String::with_capacity(annotations.len() * 48);
    for annotation in annotations {
        lines.push_str(&format_kitti_line(annotation, size)?);
        lines.push('\n');
    }

    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(lines.as_bytes())?;
    writer.flush()?;
    Ok(())
}
