//! LISA annotation CSVs.
//!
//! Each split keeps a single semicolon-delimited `annotations.csv` with a
//! header row. Columns are located by header name, so extra or reordered
//! columns in the source are tolerated.

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};
use crate::types::{Annotation, BoundingBox, CornerBox, ImageSize};
use crate::utils::parse_coordinate;

pub const LISA_ANNOTATION_FILE: &str = "annotations.csv";

pub const FILENAME_COLUMN: &str = "Filename";
pub const TAG_COLUMN: &str = "Annotation tag";
pub const UPPER_LEFT_X_COLUMN: &str = "Upper left corner X";
pub const UPPER_LEFT_Y_COLUMN: &str = "Upper left corner Y";
pub const LOWER_RIGHT_X_COLUMN: &str = "Lower right corner X";
pub const LOWER_RIGHT_Y_COLUMN: &str = "Lower right corner Y";

const HEADER: [&str; 6] = [
    FILENAME_COLUMN,
    TAG_COLUMN,
    UPPER_LEFT_X_COLUMN,
    UPPER_LEFT_Y_COLUMN,
    LOWER_RIGHT_X_COLUMN,
    LOWER_RIGHT_Y_COLUMN,
];

/// All annotations of one image, in CSV row order.
#[derive(Debug, Clone)]
pub struct LisaEntry {
    pub filename: String,
    pub annotations: Vec<Annotation>,
}

struct ColumnIndices {
    filename: usize,
    tag: usize,
    xmin: usize,
    ymin: usize,
    xmax: usize,
    ymax: usize,
}

impl ColumnIndices {
    fn locate(headers: &StringRecord, path: &Path) -> Result<Self> {
        let find = |column: &str| {
            headers
                .iter()
                .position(|header| header.trim() == column)
                .ok_or_else(|| ConvertError::MissingColumn {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                })
        };

        Ok(Self {
            filename: find(FILENAME_COLUMN)?,
            tag: find(TAG_COLUMN)?,
            xmin: find(UPPER_LEFT_X_COLUMN)?,
            ymin: find(UPPER_LEFT_Y_COLUMN)?,
            xmax: find(LOWER_RIGHT_X_COLUMN)?,
            ymax: find(LOWER_RIGHT_Y_COLUMN)?,
        })
    }
}

fn csv_error(path: &Path, source: csv::Error) -> ConvertError {
    if source.is_io_error() {
        return ConvertError::Csv {
            path: path.to_path_buf(),
            source,
        };
    }
    ConvertError::MalformedLabelLine {
        path: path.to_path_buf(),
        line: source.position().map_or(0, |p| p.line() as usize),
        reason: source.to_string(),
    }
}

/// Read a LISA CSV, grouping rows by `Filename` in order of first appearance.
pub fn read_lisa_annotations(path: &Path) -> Result<Vec<LisaEntry>> {
    if !path.is_file() {
        return Err(ConvertError::LabelFileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;
    let headers = reader.headers().map_err(|e| csv_error(path, e))?.clone();
    let columns = ColumnIndices::locate(&headers, path)?;

    let mut entries: Vec<LisaEntry> = Vec::new();
    let mut entry_index: HashMap<String, usize> = HashMap::new();

    for result in reader.records() {
        let record = result.map_err(|e| csv_error(path, e))?;
        let line = record.position().map_or(0, |p| p.line() as usize);
        let field = |idx: usize| record.get(idx).unwrap_or_default();

        let corners = CornerBox::from_f64(
            parse_coordinate(field(columns.xmin), UPPER_LEFT_X_COLUMN, path, line)?,
            parse_coordinate(field(columns.ymin), UPPER_LEFT_Y_COLUMN, path, line)?,
            parse_coordinate(field(columns.xmax), LOWER_RIGHT_X_COLUMN, path, line)?,
            parse_coordinate(field(columns.ymax), LOWER_RIGHT_Y_COLUMN, path, line)?,
        );
        let annotation = Annotation::new(field(columns.tag).trim(), BoundingBox::Corners(corners));

        let filename = field(columns.filename).trim().to_string();
        match entry_index.get(&filename) {
            Some(&idx) => entries[idx].annotations.push(annotation),
            None => {
                entry_index.insert(filename.clone(), entries.len());
                entries.push(LisaEntry {
                    filename,
                    annotations: vec![annotation],
                });
            }
        }
    }

    Ok(entries)
}

/// Streams rows into a split's LISA CSV.
pub struct LisaWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl LisaWriter {
    /// Create the CSV and write its header row.
    pub fn create(path: &Path) -> Result<Self> {
        let mut writer = WriterBuilder::new()
            .delimiter(b';')
            .from_path(path)
            .map_err(|source| ConvertError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
        writer
            .write_record(HEADER)
            .map_err(|source| ConvertError::Csv {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    /// Append one row per annotation of an image.
    pub fn write_image(
        &mut self,
        filename: &str,
        annotations: &[Annotation],
        size: ImageSize,
    ) -> Result<()> {
        // Transcode everything before writing so a failure leaves no partial rows
        let rows = annotations
            .iter()
            .map(|annotation| {
                let c = annotation.bbox.to_corners(size)?;
                Ok([
                    filename.to_string(),
                    annotation.class_label.clone(),
                    c.xmin.to_string(),
                    c.ymin.to_string(),
                    c.xmax.to_string(),
                    c.ymax.to_string(),
                ])
            })
            .collect::<Result<Vec<_>>>()?;

        for row in &rows {
            self.writer
                .write_record(row)
                .map_err(|source| ConvertError::Csv {
                    path: self.path.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
