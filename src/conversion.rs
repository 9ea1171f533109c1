//! Reader → transcoder → writer composition for one format pair.

use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};
use crate::io::{images_dir, labels_dir, split_dir, transfer_image};
use crate::kitti::{read_kitti_labels, write_kitti_labels};
use crate::labels::LabelIndex;
use crate::lisa::{LisaWriter, LISA_ANNOTATION_FILE};
use crate::types::{Annotation, Format, ImageRecord, SourceEntry, Split};
use crate::voc::{read_voc_labels, write_voc_labels};
use crate::yolo::{read_yolo_labels, write_yolo_labels};

/// Format pairs with a working converter.
pub const STANDARD_CONVERSIONS: &[(Format, Format)] = &[
    (Format::Kitti, Format::Lisa),
    (Format::Kitti, Format::Voc),
    (Format::Kitti, Format::Yolo),
    (Format::Lisa, Format::Kitti),
    (Format::Lisa, Format::Voc),
    (Format::Lisa, Format::Yolo),
    (Format::Voc, Format::Kitti),
    (Format::Voc, Format::Lisa),
    (Format::Voc, Format::Yolo),
    (Format::Yolo, Format::Kitti),
    (Format::Yolo, Format::Lisa),
    (Format::Yolo, Format::Voc),
];

/// Lookup table from `(from, to)` to whether a converter exists.
#[derive(Debug, Clone)]
pub struct ConversionTable {
    pairs: Vec<(Format, Format)>,
}

impl Default for ConversionTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl ConversionTable {
    /// Every pair of distinct formats.
    pub fn standard() -> Self {
        Self::with_pairs(STANDARD_CONVERSIONS.iter().copied())
    }

    /// A table restricted to the given pairs.
    pub fn with_pairs(pairs: impl IntoIterator<Item = (Format, Format)>) -> Self {
        let mut pairs: Vec<_> = pairs.into_iter().filter(|(from, to)| from != to).collect();
        pairs.sort();
        pairs.dedup();
        Self { pairs }
    }

    pub fn pairs(&self) -> &[(Format, Format)] {
        &self.pairs
    }

    pub fn is_supported(&self, from: Format, to: Format) -> bool {
        self.pairs.binary_search(&(from, to)).is_ok()
    }

    /// Fail with `UnsupportedConversion` unless the pair is registered.
    pub fn resolve(&self, from: Format, to: Format) -> Result<()> {
        if self.is_supported(from, to) {
            Ok(())
        } else {
            Err(ConvertError::UnsupportedConversion { from, to })
        }
    }
}

/// Where a split's labels are written.
pub enum LabelWriter {
    /// One label file per image (KITTI, VOC, YOLO).
    Files { labels_dir: PathBuf },
    /// A single CSV for the split (LISA).
    Lisa(LisaWriter),
}

impl LabelWriter {
    pub fn finish(self) -> Result<()> {
        match self {
            LabelWriter::Files { .. } => Ok(()),
            LabelWriter::Lisa(writer) => writer.finish(),
        }
    }
}

/// Converts records from one format to another.
#[derive(Debug, Clone, Copy)]
pub struct Converter<'a> {
    from: Format,
    to: Format,
    labels: Option<&'a LabelIndex>,
}

impl<'a> Converter<'a> {
    /// Build a converter, requiring a label index whenever either side stores
    /// class indices.
    pub fn new(from: Format, to: Format, labels: Option<&'a LabelIndex>) -> Result<Self> {
        let converter = Self { from, to, labels };
        if converter.needs_label_index() && labels.is_none() {
            return Err(ConvertError::MissingLabelFile { from, to });
        }
        Ok(converter)
    }

    pub fn source_format(&self) -> Format {
        self.from
    }

    pub fn target_format(&self) -> Format {
        self.to
    }

    pub fn needs_label_index(&self) -> bool {
        self.from.uses_label_index() || self.to.uses_label_index()
    }

    fn label_index(&self) -> Result<&'a LabelIndex> {
        self.labels.ok_or(ConvertError::MissingLabelFile {
            from: self.from,
            to: self.to,
        })
    }

    /// Read the annotations of a source entry in source order.
    pub fn read_annotations(&self, entry: &SourceEntry) -> Result<Vec<Annotation>> {
        match entry {
            SourceEntry::Lisa { annotations, .. } => Ok(annotations.clone()),
            SourceEntry::LabelFile { label_path } => match self.from {
                Format::Kitti => read_kitti_labels(label_path),
                Format::Voc => read_voc_labels(label_path),
                Format::Yolo => read_yolo_labels(label_path, self.label_index()?),
                Format::Lisa => Err(ConvertError::MalformedLabelFile {
                    path: label_path.clone(),
                    reason: "LISA annotations are read per split CSV".to_string(),
                }),
            },
        }
    }

    /// Open the label sink for one destination split.
    pub fn open_writer(&self, root: &Path, split: Split) -> Result<LabelWriter> {
        match self.to {
            Format::Lisa => Ok(LabelWriter::Lisa(LisaWriter::create(
                &split_dir(root, split).join(LISA_ANNOTATION_FILE),
            )?)),
            _ => Ok(LabelWriter::Files {
                labels_dir: labels_dir(root, split),
            }),
        }
    }

    /// Serialize one record's annotations into the destination format.
    pub fn write_record(
        &self,
        writer: &mut LabelWriter,
        record: &ImageRecord,
        image_file_name: &str,
    ) -> Result<()> {
        match writer {
            LabelWriter::Lisa(lisa) => lisa.write_image(
                &format!("images/{}", image_file_name),
                &record.annotations,
                record.size,
            ),
            LabelWriter::Files { labels_dir } => {
                let extension = self.to.label_extension().unwrap_or("txt");
                let label_path = labels_dir.join(format!("{}.{}", record.name, extension));
                match self.to {
                    Format::Kitti => {
                        write_kitti_labels(&label_path, &record.annotations, record.size)
                    }
                    Format::Yolo => write_yolo_labels(
                        &label_path,
                        &record.annotations,
                        self.label_index()?,
                        record.size,
                    ),
                    Format::Voc => write_voc_labels(
                        &label_path,
                        "images",
                        image_file_name,
                        &record.annotations,
                        record.size,
                    ),
                    Format::Lisa => Err(ConvertError::InvalidDestination {
                        path: label_path,
                        reason: "LISA labels are written per split CSV".to_string(),
                    }),
                }
            }
        }
    }

    /// Write the destination image and labels for a record, returning the
    /// path of the written image.
    pub fn emit(
        &self,
        writer: &mut LabelWriter,
        record: &ImageRecord,
        root: &Path,
        split: Split,
    ) -> Result<PathBuf> {
        let image_path = transfer_image(
            &record.image_path,
            &images_dir(root, split),
            &record.name,
            self.to.image_extension(),
        )?;
        let image_file_name = image_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Err(e) = self.write_record(writer, record, &image_file_name) {
            // Keep images and labels paired in the output
            if let Err(remove_err) = fs::remove_file(&image_path) {
                warn!(
                    "Failed to remove {} after a label error: {}",
                    image_path.display(),
                    remove_err
                );
            }
            return Err(e);
        }
        debug!(
            "Converted {} ({} object(s))",
            record.name,
            record.annotations.len()
        );
        Ok(image_path)
    }
}
