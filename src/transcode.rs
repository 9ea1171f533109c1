//! Bounding-box transcoding between absolute corners and normalized centers.

use crate::error::{ConvertError, Result};
use crate::types::{CenterBox, CornerBox};

fn checked_dimensions(width: u32, height: u32) -> Result<(f64, f64)> {
    if width == 0 || height == 0 {
        return Err(ConvertError::InvalidImageDimensions { width, height });
    }
    Ok((width as f64, height as f64))
}

/// Convert corner coordinates to a center point and size normalized by the
/// image dimensions. Boxes outside the image produce values outside `[0, 1]`.
pub fn to_normalized_center(
    xmin: i64,
    ymin: i64,
    xmax: i64,
    ymax: i64,
    width: u32,
    height: u32,
) -> Result<CenterBox> {
    let (width, height) = checked_dimensions(width, height)?;
    let (xmin, ymin, xmax, ymax) = (xmin as f64, ymin as f64, xmax as f64, ymax as f64);

    Ok(CenterBox {
        cx: (xmax + xmin) / 2.0 / width,
        cy: (ymax + ymin) / 2.0 / height,
        w: (xmax - xmin) / width,
        h: (ymax - ymin) / height,
    })
}

/// Convert a normalized center box back to pixel corners.
///
/// Results are truncated toward zero, not rounded, so a round trip through
/// [`to_normalized_center`] may lose up to one pixel per coordinate.
pub fn to_corners(cx: f64, cy: f64, w: f64, h: f64, width: u32, height: u32) -> Result<CornerBox> {
    let (width, height) = checked_dimensions(width, height)?;

    Ok(CornerBox::from_f64(
        width * (2.0 * cx - w) / 2.0,
        height * (2.0 * cy - h) / 2.0,
        width * (2.0 * cx + w) / 2.0,
        height * (2.0 * cy + h) / 2.0,
    ))
}
