//! Label files: class names and per-image validation labels.

use std::fs;
use std::path::Path;

use corrupt_core::{Error, Result};
use tracing::debug;

/// Ordered class names; a label is an index into this list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassNames {
    names: Vec<String>,
}

impl ClassNames {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Parses one class name per line, skipping blank lines
    pub fn parse(content: &str) -> Self {
        Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read class names {}: {e}", path.display()))
        })?;
        let names = Self::parse(&content);
        debug!("Loaded {} class names from {}", names.len(), path.display());
        Ok(names)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name of the class at `label`
    pub fn name(&self, label: usize) -> Option<&str> {
        self.names.get(label).map(String::as_str)
    }

    /// Label index of `name`
    pub fn index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Parses a validation labels file: one integer label per line, in the
/// alphabetical order of the validation image file names
pub fn parse_validation_labels(content: &str) -> Result<Vec<usize>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            line.trim().parse::<usize>().map_err(|e| {
                Error::Config(format!("Invalid label on line {}: '{}' ({e})", i + 1, line.trim()))
            })
        })
        .collect()
}

pub fn read_validation_labels(path: &Path) -> Result<Vec<usize>> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read labels {}: {e}", path.display()))
    })?;
    parse_validation_labels(&content)
}
