use glob::glob;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};
use crate::types::{Format, ImageSize, Split, IMG_FORMATS};
use crate::utils::create_output_directory;

/// Directory holding one split of a dataset.
pub fn split_dir(root: &Path, split: Split) -> PathBuf {
    root.join(split.as_str())
}

pub fn images_dir(root: &Path, split: Split) -> PathBuf {
    split_dir(root, split).join("images")
}

pub fn labels_dir(root: &Path, split: Split) -> PathBuf {
    split_dir(root, split).join("labels")
}

/// Refuse destinations that cannot be written without data loss.
pub fn check_destination(source: &Path, destination: &Path, overwrite: bool) -> Result<()> {
    if destination.exists() {
        if !destination.is_dir() {
            return Err(ConvertError::InvalidDestination {
                path: destination.to_path_buf(),
                reason: "not a directory".to_string(),
            });
        }
        let same_tree = match (fs::canonicalize(source), fs::canonicalize(destination)) {
            (Ok(source), Ok(destination)) => {
                source.starts_with(&destination) || destination.starts_with(&source)
            }
            _ => false,
        };
        if same_tree {
            return Err(ConvertError::InvalidDestination {
                path: destination.to_path_buf(),
                reason: "overlaps the source dataset".to_string(),
            });
        }
        if !overwrite {
            return Err(ConvertError::DestinationExists {
                path: destination.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Set up the directory structure for the destination dataset.
///
/// An existing destination is removed first when `overwrite` is set.
pub fn setup_output_directories(root: &Path, format: Format, overwrite: bool) -> Result<()> {
    if root.exists() {
        if !overwrite {
            return Err(ConvertError::DestinationExists {
                path: root.to_path_buf(),
            });
        }
        warn!(
            "Directory {:?} already exists. Deleting and recreating it.",
            root
        );
        fs::remove_dir_all(root)?;
    }

    for split in Split::ALL {
        create_output_directory(&images_dir(root, split))?;
        if format.label_extension().is_some() {
            create_output_directory(&labels_dir(root, split))?;
        }
    }
    Ok(())
}

/// List the label files of one extension directly inside `dir`, sorted by name.
pub fn list_label_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*.{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        extension
    );
    let entries = glob(&pattern).map_err(|e| {
        ConvertError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Find the image named `stem` in `dir`, trying `preferred_ext` first and then
/// every other known image extension.
pub fn find_image(dir: &Path, stem: &str, preferred_ext: &str) -> Option<PathBuf> {
    std::iter::once(preferred_ext)
        .chain(IMG_FORMATS.iter().copied().filter(|ext| *ext != preferred_ext))
        .flat_map(|ext| [ext.to_string(), ext.to_uppercase()])
        .map(|ext| dir.join(format!("{}.{}", stem, ext)))
        .find(|path| path.is_file())
}

/// Read image width and height from the file header without decoding pixels.
pub fn probe_image_size(path: &Path) -> Result<ImageSize> {
    let size = imagesize::size(path).map_err(|e| ConvertError::ImageProbe {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let width = u32::try_from(size.width).map_err(|_| ConvertError::ImageProbe {
        path: path.to_path_buf(),
        reason: format!("image width {} does not fit in u32", size.width),
    })?;
    let height = u32::try_from(size.height).map_err(|_| ConvertError::ImageProbe {
        path: path.to_path_buf(),
        reason: format!("image height {} does not fit in u32", size.height),
    })?;

    if width == 0 || height == 0 {
        return Err(ConvertError::InvalidImageDimensions { width, height });
    }
    Ok(ImageSize::new(width, height))
}

fn same_extension(path: &Path, extension: &str) -> bool {
    let normalize = |ext: &str| match ext.to_ascii_lowercase().as_str() {
        "jpeg" => "jpg".to_string(),
        "tif" => "tiff".to_string(),
        other => other.to_string(),
    };
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| normalize(ext) == normalize(extension))
}

/// Place `source` in `dest_dir` as `<stem>.<extension>`, copying bytes when the
/// encoding already matches and re-encoding otherwise. Re-encoding to JPEG is lossy.
pub fn transfer_image(source: &Path, dest_dir: &Path, stem: &str, extension: &str) -> Result<PathBuf> {
    let destination = dest_dir.join(format!("{}.{}", stem, extension));

    if same_extension(source, extension) {
        fs::copy(source, &destination)?;
        return Ok(destination);
    }

    debug!(
        "Re-encoding {} as {}",
        source.display(),
        destination.display()
    );
    let encode_error = |source_err: image::ImageError| ConvertError::ImageEncode {
        path: source.to_path_buf(),
        source: source_err,
    };
    let img = image::open(source).map_err(encode_error)?;
    if same_extension(&destination, "jpg") {
        // JPEG has no alpha channel
        img.to_rgb8().save(&destination).map_err(encode_error)?;
    } else {
        img.save(&destination).map_err(encode_error)?;
    }
    Ok(destination)
}
