use clap::ValueEnum;
use log::info;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::transcode::{to_corners, to_normalized_center};

// Supported image formats, probed in this order after the format's own extension
pub const IMG_FORMATS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

/// On-disk annotation conventions understood by the converter.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Debug)]
pub enum Format {
    Kitti,
    Lisa,
    Voc,
    Yolo,
}

impl Format {
    pub const ALL: [Format; 4] = [Format::Kitti, Format::Lisa, Format::Voc, Format::Yolo];

    pub fn as_str(self) -> &'static str {
        match self {
            Format::Kitti => "kitti",
            Format::Lisa => "lisa",
            Format::Voc => "voc",
            Format::Yolo => "yolo",
        }
    }

    /// Extension used for image assets written in this format.
    pub fn image_extension(self) -> &'static str {
        match self {
            Format::Yolo => "jpg",
            Format::Kitti | Format::Lisa | Format::Voc => "png",
        }
    }

    /// Extension of the per-image label files, `None` for LISA which keeps a
    /// single CSV per split.
    pub fn label_extension(self) -> Option<&'static str> {
        match self {
            Format::Kitti | Format::Yolo => Some("txt"),
            Format::Voc => Some("xml"),
            Format::Lisa => None,
        }
    }

    /// Whether classes are stored as indices into a label list.
    pub fn uses_label_index(self) -> bool {
        matches!(self, Format::Yolo)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dataset partition.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Split {
    Train,
    Val,
}

impl Split {
    pub const ALL: [Split; 2] = [Split::Train, Split::Val];

    pub fn as_str(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pixel dimensions of an image asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Absolute pixel corners, truncated to integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CornerBox {
    pub xmin: i64,
    pub ymin: i64,
    pub xmax: i64,
    pub ymax: i64,
}

impl CornerBox {
    pub fn new(xmin: i64, ymin: i64, xmax: i64, ymax: i64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Build from float corners, truncating toward zero.
    pub fn from_f64(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self::new(xmin as i64, ymin as i64, xmax as i64, ymax as i64)
    }
}

/// Center point and size, normalized to the image dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterBox {
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

/// A bounding box in whichever encoding its source format stores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundingBox {
    Corners(CornerBox),
    Normalized(CenterBox),
}

impl BoundingBox {
    /// Corner encoding, transcoding only when the box is stored normalized.
    pub fn to_corners(&self, size: ImageSize) -> Result<CornerBox> {
        match *self {
            BoundingBox::Corners(corners) => Ok(corners),
            BoundingBox::Normalized(c) => to_corners(c.cx, c.cy, c.w, c.h, size.width, size.height),
        }
    }

    /// Normalized center encoding, transcoding only when the box is stored as corners.
    pub fn to_normalized(&self, size: ImageSize) -> Result<CenterBox> {
        match *self {
            BoundingBox::Normalized(center) => Ok(center),
            BoundingBox::Corners(c) => {
                to_normalized_center(c.xmin, c.ymin, c.xmax, c.ymax, size.width, size.height)
            }
        }
    }
}

/// One object instance. Format-specific extras are `None` when the source
/// format does not track them; writers fill in their own defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub class_label: String,
    pub bbox: BoundingBox,
    pub truncated: Option<f64>,
    pub occluded: Option<i32>,
    pub alpha: Option<f64>,
    pub difficult: Option<bool>,
    pub pose: Option<String>,
}

impl Annotation {
    pub fn new(class_label: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            class_label: class_label.into(),
            bbox,
            truncated: None,
            occluded: None,
            alpha: None,
            difficult: None,
            pose: None,
        }
    }
}

/// An image together with its annotations, built per file and discarded once written.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub name: String,
    pub image_path: PathBuf,
    pub size: ImageSize,
    pub annotations: Vec<Annotation>,
}

/// One unit of work discovered in a source split.
#[derive(Debug, Clone)]
pub enum SourceEntry {
    /// A per-image label file (KITTI, VOC, YOLO).
    LabelFile { label_path: PathBuf },
    /// Rows of a LISA annotation CSV that share one `Filename`.
    Lisa {
        csv_path: PathBuf,
        filename: String,
        annotations: Vec<Annotation>,
    },
}

impl SourceEntry {
    /// Base name shared by the label and image files.
    pub fn name(&self) -> String {
        let path = match self {
            SourceEntry::LabelFile { label_path } => label_path.as_path(),
            SourceEntry::Lisa { filename, .. } => Path::new(filename.as_str()),
        };
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File the annotations were read from, used in diagnostics.
    pub fn source_path(&self) -> &Path {
        match self {
            SourceEntry::LabelFile { label_path } => label_path,
            SourceEntry::Lisa { csv_path, .. } => csv_path,
        }
    }
}

// Struct to hold processing statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub total_files_processed: usize,
    pub successful_conversions: usize,
    pub skipped_missing_image: usize,
    pub failed_conversions: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_total(&mut self) {
        self.total_files_processed += 1;
    }

    pub fn increment_successful(&mut self) {
        self.successful_conversions += 1;
    }

    pub fn increment_skipped_missing_image(&mut self) {
        self.skipped_missing_image += 1;
    }

    pub fn increment_failed(&mut self) {
        self.failed_conversions += 1;
    }

    pub fn merge(&mut self, other: &ProcessingStats) {
        self.total_files_processed += other.total_files_processed;
        self.successful_conversions += other.successful_conversions;
        self.skipped_missing_image += other.skipped_missing_image;
        self.failed_conversions += other.failed_conversions;
    }

    pub fn print_summary(&self) {
        info!("=== Processing Summary ===");
        info!("Total files processed: {}", self.total_files_processed);
        info!("Successful conversions: {}", self.successful_conversions);
        info!("Skipped (missing image file): {}", self.skipped_missing_image);
        info!("Failed conversions: {}", self.failed_conversions);

        if self.skipped_missing_image + self.failed_conversions > 0 {
            log::warn!(
                "{} of {} file(s) were not converted",
                self.skipped_missing_image + self.failed_conversions,
                self.total_files_processed
            );
        }
    }
}
