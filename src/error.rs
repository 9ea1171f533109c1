//! Error types for dataset conversion.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::Format;

/// Errors that can occur while converting a dataset.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Image width or height is zero.
    #[error("Invalid image dimensions {width}x{height}")]
    InvalidImageDimensions { width: u32, height: u32 },

    /// Class name is not part of the label index.
    #[error("Unknown label '{name}'")]
    UnknownLabel { name: String },

    /// Class index falls outside the label index.
    #[error("Label index {index} is out of range for {len} label(s)")]
    IndexOutOfRange { index: i64, len: usize },

    /// Label file or annotation CSV does not exist.
    #[error("Label file not found: {path}")]
    LabelFileNotFound { path: PathBuf },

    /// A line did not split into the expected fields.
    #[error("Malformed label line {path}:{line}: {reason}")]
    MalformedLabelLine {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// A whole label document could not be parsed.
    #[error("Malformed label file {path}: {reason}")]
    MalformedLabelFile { path: PathBuf, reason: String },

    /// Class name cannot be represented in the destination format.
    #[error("Label '{name}' cannot be written as {format}: {reason}")]
    UnwritableLabel {
        name: String,
        format: Format,
        reason: String,
    },

    /// Two source records map to the same output name within a split.
    #[error("Output name '{name}' from {path} is already used in this split")]
    DuplicateOutputName { name: String, path: PathBuf },

    /// A required CSV header is absent.
    #[error("Missing column '{column}' in {path}")]
    MissingColumn { path: PathBuf, column: String },

    /// No converter is registered for this format pair.
    #[error("Conversion from {from} to {to} is not supported")]
    UnsupportedConversion { from: Format, to: Format },

    /// Label file exists but the paired image does not.
    #[error("Image not found for label {label_path}")]
    ImageNotFound { label_path: PathBuf },

    /// A label list is required for index-based formats.
    #[error("A label file is required when converting from {from} to {to}")]
    MissingLabelFile { from: Format, to: Format },

    /// The label list repeats a class name.
    #[error("Duplicate label '{name}'")]
    DuplicateLabel { name: String },

    /// The label list holds no class names.
    #[error("Label file {path} contains no labels")]
    EmptyLabelIndex { path: PathBuf },

    /// Source dataset root does not exist.
    #[error("Source dataset not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Destination exists and overwriting was not requested.
    #[error("Destination {path} already exists (pass --overwrite to replace it)")]
    DestinationExists { path: PathBuf },

    /// Destination is not usable as an output root.
    #[error("Invalid destination {path}: {reason}")]
    InvalidDestination { path: PathBuf, reason: String },

    /// Image header could not be read.
    #[error("Failed to read image dimensions of {path}: {reason}")]
    ImageProbe { path: PathBuf, reason: String },

    /// Image could not be decoded or re-encoded.
    #[error("Failed to re-encode image {path}: {source}")]
    ImageEncode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// CSV read or write failure.
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// XML write failure.
    #[error("XML write error: {reason}")]
    Xml { reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    /// Returns true for errors confined to a single record, which the batch
    /// logs and skips instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ConvertError::InvalidImageDimensions { .. }
                | ConvertError::UnknownLabel { .. }
                | ConvertError::IndexOutOfRange { .. }
                | ConvertError::LabelFileNotFound { .. }
                | ConvertError::MalformedLabelLine { .. }
                | ConvertError::MalformedLabelFile { .. }
                | ConvertError::MissingColumn { .. }
                | ConvertError::UnwritableLabel { .. }
                | ConvertError::DuplicateOutputName { .. }
                | ConvertError::ImageNotFound { .. }
                | ConvertError::ImageProbe { .. }
                | ConvertError::ImageEncode { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
