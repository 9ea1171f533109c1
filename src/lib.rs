//! Object detection dataset converter
//!
//! This library converts annotations between the KITTI, LISA, VOC and YOLO
//! on-disk formats, renormalizing bounding boxes against image dimensions and
//! mapping class names to and from label indices.

pub mod config;
pub mod conversion;
pub mod dataset;
pub mod error;
pub mod io;
pub mod kitti;
pub mod labels;
pub mod lisa;
pub mod transcode;
pub mod types;
pub mod utils;
pub mod voc;
pub mod yolo;

// Re-export commonly used types and functions
pub use config::{Args, ConvertOptions};
pub use conversion::{ConversionTable, Converter};
pub use dataset::{convert_dataset, convert_dataset_with};
pub use error::{ConvertError, Result};
pub use labels::LabelIndex;
pub use transcode::{to_corners, to_normalized_center};
pub use types::{
    Annotation, BoundingBox, CenterBox, CornerBox, Format, ImageRecord, ImageSize,
    ProcessingStats, Split,
};
