//! Dataset-level conversion: setup checks, split iteration and the batch
//! error policy.
//!
//! Setup problems (unsupported pair, missing label list, unusable
//! destination) abort before anything is written. Problems confined to one
//! image are logged, counted and skipped.

use indicatif::ProgressBar;
use log::{error, info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ConvertOptions;
use crate::conversion::{ConversionTable, Converter, LabelWriter};
use crate::error::{ConvertError, Result};
use crate::io::{
    check_destination, find_image, images_dir, labels_dir, list_label_files, probe_image_size,
    setup_output_directories, split_dir,
};
use crate::labels::LabelIndex;
use crate::lisa::{read_lisa_annotations, LISA_ANNOTATION_FILE};
use crate::types::{Format, ImageRecord, ProcessingStats, SourceEntry, Split};
use crate::utils::create_progress_bar;
use crate::yolo::{create_dataset_yaml, manifest_path, write_image_manifest};

/// Convert a dataset with every standard format pair available.
pub fn convert_dataset(options: &ConvertOptions) -> Result<ProcessingStats> {
    convert_dataset_with(&ConversionTable::standard(), options)
}

/// Convert a dataset, accepting only the pairs registered in `table`.
pub fn convert_dataset_with(
    table: &ConversionTable,
    options: &ConvertOptions,
) -> Result<ProcessingStats> {
    let (from, to) = (options.from, options.to);
    if from == to {
        info!("No conversion necessary.");
        return Ok(ProcessingStats::new());
    }
    table.resolve(from, to)?;

    if !options.from_path.is_dir() {
        return Err(ConvertError::SourceNotFound {
            path: options.from_path.clone(),
        });
    }

    let labels = if from.uses_label_index() || to.uses_label_index() {
        let label_path = options
            .label_path
            .as_deref()
            .ok_or(ConvertError::MissingLabelFile { from, to })?;
        Some(LabelIndex::load(label_path)?)
    } else {
        None
    };
    let converter = Converter::new(from, to, labels.as_ref())?;

    check_destination(&options.from_path, &options.to_path, options.overwrite)?;

    info!("Converting {} to {}", from, to);
    if to.image_extension() == "jpg" && from.image_extension() != "jpg" {
        warn!("Images will be re-encoded as JPEG, which is lossy.");
    }

    setup_output_directories(&options.to_path, to, options.overwrite)?;

    let mut stats = ProcessingStats::new();
    for split in Split::ALL {
        let (split_stats, image_paths) = process_split(&converter, options, split)?;
        stats.merge(&split_stats);

        if to == Format::Yolo {
            write_image_manifest(&manifest_path(&options.to_path, split), &image_paths)?;
        }
    }

    if let (Format::Yolo, Some(labels)) = (to, labels.as_ref()) {
        info!("Creating dataset.yaml file...");
        create_dataset_yaml(&options.to_path, labels)?;
    }

    stats.print_summary();
    info!("Conversion complete.");
    Ok(stats)
}

/// Enumerate the records of one source split, or `None` when the split is absent.
pub fn collect_entries(
    format: Format,
    root: &Path,
    split: Split,
) -> Result<Option<Vec<SourceEntry>>> {
    match format.label_extension() {
        Some(extension) => {
            let dir = labels_dir(root, split);
            if !dir.is_dir() {
                return Ok(None);
            }
            let entries = list_label_files(&dir, extension)?
                .into_iter()
                .map(|label_path| SourceEntry::LabelFile { label_path })
                .collect();
            Ok(Some(entries))
        }
        None => {
            let dir = split_dir(root, split);
            if !dir.is_dir() {
                return Ok(None);
            }
            let csv_path = dir.join(LISA_ANNOTATION_FILE);
            let entries = read_lisa_annotations(&csv_path)?
                .into_iter()
                .map(|entry| SourceEntry::Lisa {
                    csv_path: csv_path.clone(),
                    filename: entry.filename,
                    annotations: entry.annotations,
                })
                .collect();
            Ok(Some(entries))
        }
    }
}

/// Locate the image paired with a source record.
pub fn resolve_image(
    format: Format,
    root: &Path,
    split: Split,
    entry: &SourceEntry,
) -> Option<PathBuf> {
    if let SourceEntry::Lisa { filename, .. } = entry {
        let direct = split_dir(root, split).join(filename);
        if direct.is_file() {
            return Some(direct);
        }
    }
    find_image(
        &images_dir(root, split),
        &entry.name(),
        format.image_extension(),
    )
}

fn convert_entry(
    converter: &Converter,
    entry: &SourceEntry,
    options: &ConvertOptions,
    split: Split,
    writer: &mut LabelWriter,
) -> Result<PathBuf> {
    let image_path = resolve_image(
        converter.source_format(),
        &options.from_path,
        split,
        entry,
    )
    .ok_or_else(|| ConvertError::ImageNotFound {
        label_path: entry.source_path().to_path_buf(),
    })?;

    let size = probe_image_size(&image_path)?;
    let annotations = converter.read_annotations(entry)?;
    let record = ImageRecord {
        name: entry.name(),
        image_path,
        size,
        annotations,
    };
    converter.emit(writer, &record, &options.to_path, split)
}

/// Convert every record of one split, returning its statistics and the
/// absolute paths of the images written.
fn process_split(
    converter: &Converter,
    options: &ConvertOptions,
    split: Split,
) -> Result<(ProcessingStats, Vec<PathBuf>)> {
    let mut stats = ProcessingStats::new();
    let mut image_paths = Vec::new();

    let entries = match collect_entries(converter.source_format(), &options.from_path, split) {
        Ok(Some(entries)) => entries,
        Ok(None) => {
            warn!(
                "No {} split found in {}",
                split,
                options.from_path.display()
            );
            return Ok((stats, image_paths));
        }
        Err(e) if e.is_recoverable() => {
            error!("Skipping {} split: {}", split, e);
            stats.increment_total();
            stats.increment_failed();
            return Ok((stats, image_paths));
        }
        Err(e) => return Err(e),
    };
    info!("Found {} {} record(s).", entries.len(), split);

    let mut writer = converter.open_writer(&options.to_path, split)?;
    let pb = if options.show_progress {
        create_progress_bar(entries.len() as u64, split.as_str())
    } else {
        ProgressBar::hidden()
    };

    // Output files are named by stem, so LISA rows from different
    // subdirectories can collide
    let mut output_names = HashSet::new();

    for entry in &entries {
        stats.increment_total();
        let name = entry.name();
        let result = if output_names.contains(&name) {
            let path = match entry {
                SourceEntry::Lisa { filename, .. } => PathBuf::from(filename),
                SourceEntry::LabelFile { label_path } => label_path.clone(),
            };
            Err(ConvertError::DuplicateOutputName {
                name: name.clone(),
                path,
            })
        } else {
            convert_entry(converter, entry, options, split, &mut writer)
        };
        match result {
            Ok(image_path) => {
                output_names.insert(name);
                stats.increment_successful();
                image_paths.push(fs::canonicalize(&image_path).unwrap_or(image_path));
            }
            Err(e @ ConvertError::ImageNotFound { .. }) => {
                warn!("{}", e);
                stats.increment_skipped_missing_image();
            }
            Err(e) if e.is_recoverable() => {
                error!(
                    "Failed to convert {}: {}",
                    entry.source_path().display(),
                    e
                );
                stats.increment_failed();
            }
            Err(e) => {
                pb.abandon();
                return Err(e);
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message(format!("{} processing complete", split));

    writer.finish()?;
    Ok((stats, image_paths))
}
