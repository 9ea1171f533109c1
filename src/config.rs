use clap::Parser;
use std::path::PathBuf;

use crate::types::Format;

/// Convert object detection datasets between KITTI, LISA, VOC and YOLO.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Args {
    /// Format to convert the dataset from
    #[arg(long = "from", value_enum)]
    pub from: Format,

    /// Path to the dataset to convert (contains 'train' and 'val')
    #[arg(long = "from-path")]
    pub from_path: PathBuf,

    /// Format to convert the dataset to
    #[arg(long = "to", value_enum)]
    pub to: Format,

    /// Path of the converted dataset
    #[arg(long = "to-path")]
    pub to_path: PathBuf,

    /// Newline-delimited class list, required when YOLO is either side
    #[arg(short = 'l', long = "label")]
    pub label: Option<PathBuf>,

    /// Replace the destination if it already exists
    #[arg(long = "overwrite")]
    pub overwrite: bool,

    /// Log each converted file
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Hide progress bars
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Args {
    pub fn to_options(&self) -> ConvertOptions {
        ConvertOptions {
            from: self.from,
            from_path: self.from_path.clone(),
            to: self.to,
            to_path: self.to_path.clone(),
            label_path: self.label.clone(),
            overwrite: self.overwrite,
            show_progress: !self.quiet,
        }
    }
}

/// Settings for one conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub from: Format,
    pub from_path: PathBuf,
    pub to: Format,
    pub to_path: PathBuf,
    pub label_path: Option<PathBuf>,
    pub overwrite: bool,
    pub show_progress: bool,
}

impl ConvertOptions {
    pub fn new(
        from: Format,
        from_path: impl Into<PathBuf>,
        to: Format,
        to_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            from,
            from_path: from_path.into(),
            to,
            to_path: to_path.into(),
            label_path: None,
            overwrite: false,
            show_progress: false,
        }
    }

    pub fn with_label_path(mut self, label_path: impl Into<PathBuf>) -> Self {
        self.label_path = Some(label_path.into());
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}
