use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ConvertError, Result};

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
                label
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Create a directory and any missing parents, returning its path
pub fn create_output_directory(path: &Path) -> std::io::Result<PathBuf> {
    fs::create_dir_all(path)?;
    Ok(path.to_path_buf())
}

/// Read a whole label file, reporting a missing file as such
pub fn read_label_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConvertError::LabelFileNotFound {
            path: path.to_path_buf(),
        },
        _ => ConvertError::Io(e),
    })
}

/// Parse one whitespace-separated column of a label line
pub fn parse_field<T: FromStr>(value: &str, column: &str, path: &Path, line: usize) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConvertError::MalformedLabelLine {
            path: path.to_path_buf(),
            line,
            reason: format!("invalid {} value '{}'", column, value),
        })
}

/// Parse a numeric column, rejecting `nan` and infinities
pub fn parse_coordinate(value: &str, column: &str, path: &Path, line: usize) -> Result<f64> {
    let number: f64 = parse_field(value, column, path, line)?;
    if !number.is_finite() {
        return Err(ConvertError::MalformedLabelLine {
            path: path.to_path_buf(),
            line,
            reason: format!("non-finite {} value '{}'", column, value),
        });
    }
    Ok(number)
}
