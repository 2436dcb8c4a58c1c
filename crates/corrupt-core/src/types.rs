//! Core type definitions for corrupted dataset generation.

use std::io::Cursor;
use std::str::FromStr;

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One of the twelve supported image corruptions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CorruptionType {
    GaussianNoise,
    ShotNoise,
    ImpulseNoise,
    DefocusBlur,
    FrostedGlassBlur,
    ZoomBlur,
    Fog,
    Brightness,
    Contrast,
    Elastic,
    Pixelate,
    JpegCompression,
}

impl CorruptionType {
    /// All corruption types in canonical order.
    pub const ALL: [CorruptionType; 12] = [
        CorruptionType::GaussianNoise,
        CorruptionType::ShotNoise,
        CorruptionType::ImpulseNoise,
        CorruptionType::DefocusBlur,
        CorruptionType::FrostedGlassBlur,
        CorruptionType::ZoomBlur,
        CorruptionType::Fog,
        CorruptionType::Brightness,
        CorruptionType::Contrast,
        CorruptionType::Elastic,
        CorruptionType::Pixelate,
        CorruptionType::JpegCompression,
    ];

    /// Snake-case name used in configuration names
    pub fn name(&self) -> &'static str {
        match self {
            CorruptionType::GaussianNoise => "gaussian_noise",
            CorruptionType::ShotNoise => "shot_noise",
            CorruptionType::ImpulseNoise => "impulse_noise",
            CorruptionType::DefocusBlur => "defocus_blur",
            CorruptionType::FrostedGlassBlur => "frosted_glass_blur",
            CorruptionType::ZoomBlur => "zoom_blur",
            CorruptionType::Fog => "fog",
            CorruptionType::Brightness => "brightness",
            CorruptionType::Contrast => "contrast",
            CorruptionType::Elastic => "elastic",
            CorruptionType::Pixelate => "pixelate",
            CorruptionType::JpegCompression => "jpeg_compression",
        }
    }
}

impl std::fmt::Display for CorruptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CorruptionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CorruptionType::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| Error::UnknownCorruptionType(s.to_string()))
    }
}

/// Corruption intensity, always within 1..=5
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "i64", into = "u8")]
pub struct Severity(u8);

impl Severity {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Validates a raw severity value
    pub fn new(value: i64) -> Result<Self> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(Error::InvalidSeverity(value))
        }
    }

    /// All five severities in increasing order
    pub fn all() -> impl Iterator<Item = Severity> {
        (Self::MIN..=Self::MAX).map(Severity)
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// Zero-based position in per-severity parameter tables
    pub fn index(&self) -> usize {
        (self.0 - 1) as usize
    }
}

impl TryFrom<i64> for Severity {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        Severity::new(value)
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> u8 {
        severity.0
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A (corruption type, severity) pair selecting one of the 60 datasets
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CorruptionSpec {
    pub corruption_type: CorruptionType,
    pub severity: Severity,
}

impl CorruptionSpec {
    /// Parses and validates a type name and severity
    pub fn new(corruption_type: &str, severity: i64) -> Result<Self> {
        Ok(Self {
            corruption_type: corruption_type.parse()?,
            severity: Severity::new(severity)?,
        })
    }

    /// Parses a configuration name such as `zoom_blur_4`
    pub fn from_config_name(name: &str) -> Result<Self> {
        let (type_name, severity) = name
            .rsplit_once('_')
            .ok_or_else(|| Error::UnknownCorruptionType(name.to_string()))?;
        let severity: i64 = severity
            .parse()
            .map_err(|_| Error::UnknownCorruptionType(name.to_string()))?;
        Self::new(type_name, severity)
    }

    /// Configuration name, e.g. `fog_3`
    pub fn config_name(&self) -> String {
        format!("{}_{}", self.corruption_type, self.severity)
    }

    pub fn description(&self) -> String {
        format!(
            "corruption type = {}, severity = {}",
            self.corruption_type, self.severity
        )
    }
}

impl std::fmt::Display for CorruptionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.corruption_type, self.severity)
    }
}

/// A record from the base dataset's validation stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawExample {
    /// Source file name, e.g. `ILSVRC2012_val_00000001.JPEG`
    pub file_name: String,
    /// Encoded image bytes
    pub image: Vec<u8>,
    /// Class index
    pub label: usize,
}

impl RawExample {
    pub fn new(file_name: impl Into<String>, image: Vec<u8>, label: usize) -> Self {
        Self {
            file_name: file_name.into(),
            image,
            label,
        }
    }
}

/// A validation record after corruption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorruptedExample {
    pub file_name: String,
    pub image: RgbImage,
    pub label: usize,
}

impl CorruptedExample {
    /// Encodes the corrupted pixels for serialization
    pub fn encode(&self, encoding: ImageEncoding) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        let written = match encoding {
            ImageEncoding::Png => self.image.write_to(&mut cursor, ImageFormat::Png),
            ImageEncoding::Jpeg { quality } => {
                JpegEncoder::new_with_quality(&mut cursor, quality).encode_image(&self.image)
            }
        };
        written.map_err(|e| Error::Encode(format!("{}: {}", self.file_name, e)))?;
        Ok(cursor.into_inner())
    }
}

/// Image encoding used when serializing corrupted examples
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageEncoding {
    #[default]
    Png,
    /// JPEG at the given quality (1-100)
    Jpeg { quality: u8 },
}

impl ImageEncoding {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageEncoding::Png => "png",
            ImageEncoding::Jpeg { .. } => "jpg",
        }
    }
}
