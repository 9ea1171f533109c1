//! Ordered class-name list used by index-based formats.

use log::debug;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{ConvertError, Result};

/// Ordered, duplicate-free list of class names. Position is the class index,
/// so the same list must be used for reading and writing index-based labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelIndex {
    names: Vec<String>,
}

impl LabelIndex {
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(ConvertError::DuplicateLabel { name: name.clone() });
            }
        }
        Ok(Self { names })
    }

    /// Load a newline-delimited label file. Surrounding whitespace is trimmed
    /// and blank lines are skipped.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConvertError::LabelFileNotFound {
                path: path.to_path_buf(),
            },
            _ => ConvertError::Io(e),
        })?;

        let index = Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        )?;
        if index.is_empty() {
            return Err(ConvertError::EmptyLabelIndex {
                path: path.to_path_buf(),
            });
        }

        debug!("Loaded {} label(s) from {}", index.len(), path.display());
        Ok(index)
    }

    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|label| label == name)
            .ok_or_else(|| ConvertError::UnknownLabel {
                name: name.to_string(),
            })
    }

    pub fn name_of(&self, index: i64) -> Result<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
            .ok_or(ConvertError::IndexOutOfRange {
                index,
                len: self.names.len(),
            })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
