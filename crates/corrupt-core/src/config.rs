//! Configuration structures for corrupted dataset generation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::{CorruptionSpec, ImageEncoding};
use crate::Result;

/// Seed for the general-purpose generator during a deterministic batch
pub const GENERAL_SEED: u64 = 135;

/// Seed for the image-library generator during a deterministic batch
pub const IMAGE_LIBRARY_SEED: u64 = 357;

/// Canonical dataset version
pub const VERSION: &str = "0.0.1";

/// Additional versions the configurations can be generated as
pub const SUPPORTED_VERSIONS: &[&str] = &["3.0.0"];

/// Top-level configuration for a generation run
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GenerationConfig {
    /// Configuration name such as `gaussian_noise_3`
    pub config_name: Option<String>,
    /// Base validation data
    pub source: SourceConfig,
    /// Output layout
    pub output: OutputConfig,
}

impl GenerationConfig {
    /// Resolves the configured dataset name into a spec
    pub fn spec(&self) -> Result<Option<CorruptionSpec>> {
        self.config_name
            .as_deref()
            .map(CorruptionSpec::from_config_name)
            .transpose()
    }
}

/// Location of the uncorrupted validation images
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory containing the validation images
    pub images_dir: PathBuf,
    /// One label per line, in alphabetical order of the image file names
    pub labels_file: Option<PathBuf>,
    /// One class name per line
    pub class_names_file: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from("data/validation"),
            labels_file: None,
            class_names_file: None,
        }
    }
}

/// Where and how corrupted examples are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root output directory; one subdirectory per configuration
    pub dir: PathBuf,
    /// Image encoding for written files
    pub encoding: ImageEncoding,
    /// Replace an existing configuration directory
    pub overwrite: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/corrupted"),
            encoding: ImageEncoding::Png,
            overwrite: false,
        }
    }
}
