//! Writes a corrupted split to disk: encoded images plus a JSON-lines manifest.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use corrupt_core::{CorruptedExample, Error, ImageEncoding, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::builder::DatasetInfo;

pub const MANIFEST_FILE: &str = "manifest.jsonl";
pub const INFO_FILE: &str = "dataset_info.json";
pub const IMAGES_DIR: &str = "images";

/// One manifest line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub file_name: String,
    /// Encoded image path, relative to the output directory
    pub image: String,
    pub label: usize,
}

/// Streams corrupted examples into an output directory
pub struct DatasetWriter {
    dir: PathBuf,
    encoding: ImageEncoding,
    manifest: BufWriter<File>,
    written: usize,
}

impl DatasetWriter {
    /// Prepares `dir`; refuses to reuse a directory holding a manifest unless `overwrite`
    pub fn create(dir: impl Into<PathBuf>, encoding: ImageEncoding, overwrite: bool) -> Result<Self> {
        let dir = dir.into();
        let manifest_path = dir.join(MANIFEST_FILE);
        if manifest_path.exists() && !overwrite {
            return Err(Error::InvalidArgument(format!(
                "{} already contains a dataset (use overwrite to replace it)",
                dir.display()
            )));
        }

        fs::create_dir_all(dir.join(IMAGES_DIR))?;
        let manifest = BufWriter::new(File::create(&manifest_path)?);
        info!("Writing corrupted examples to {}", dir.display());

        Ok(Self {
            dir,
            encoding,
            manifest,
            written: 0,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of examples written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn write(&mut self, example: &CorruptedExample) -> Result<()> {
        let stem = Path::new(&example.file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                Error::InvalidArgument(format!("Unusable file name '{}'", example.file_name))
            })?;
        let relative = format!("{}/{}.{}", IMAGES_DIR, stem, self.encoding.extension());

        let bytes = example.encode(self.encoding)?;
        fs::write(self.dir.join(&relative), bytes)?;

        let entry = ManifestEntry {
            file_name: example.file_name.clone(),
            image: relative,
            label: example.label,
        };
        serde_json::to_writer(&mut self.manifest, &entry)?;
        self.manifest.write_all(b"\n")?;

        self.written += 1;
        debug!(file_name = %example.file_name, "Wrote example");
        Ok(())
    }

    /// Stores the dataset metadata next to the manifest
    pub fn write_info(&self, info: &DatasetInfo) -> Result<()> {
        let json = serde_json::to_string_pretty(info)?;
        fs::write(self.dir.join(INFO_FILE), json)?;
        Ok(())
    }

    /// Flushes the manifest and returns the number of examples written
    pub fn finish(mut self) -> Result<usize> {
        self.manifest.flush()?;
        info!(
            "Wrote {} examples to {}",
            self.written,
            self.dir.display()
        );
        Ok(self.written)
    }
}

/// Reads back a manifest written by [`DatasetWriter`]
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestEntry>> {
    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(&line)?);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BuilderConfig, CorruptedImagenet};
    use crate::source::InMemorySource;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn example(name: &str, label: usize) -> CorruptedExample {
        CorruptedExample {
            file_name: name.to_string(),
            image: RgbImage::from_pixel(6, 5, Rgb([10, 200, 30])),
            label,
        }
    }

    #[test]
    fn test_write_images_and_manifest() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("pixelate_2");
        let mut writer = DatasetWriter::create(&out, ImageEncoding::Png, false).unwrap();
        writer.write(&example("ILSVRC2012_val_00000001.JPEG", 65)).unwrap();
        writer.write(&example("ILSVRC2012_val_00000002.JPEG", 970)).unwrap();
        assert_eq!(writer.finish().unwrap(), 2);

        let entries = read_manifest(&out.join(MANIFEST_FILE)).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].file_name, "ILSVRC2012_val_00000001.JPEG");
        assert_eq!(entries[0].image, "images/ILSVRC2012_val_00000001.png");
        assert_eq!(entries[1].label, 970);

        let decoded = image::open(out.join(&entries[0].image)).unwrap().to_rgb8();
        assert_eq!(decoded, example("x", 0).image);
    }

    #[test]
    fn test_refuses_existing_dataset_without_overwrite() {
        let dir = TempDir::new().unwrap();
        DatasetWriter::create(dir.path(), ImageEncoding::Png, false)
            .unwrap()
            .finish()
            .unwrap();

        assert!(matches!(
            DatasetWriter::create(dir.path(), ImageEncoding::Png, false),
            Err(Error::InvalidArgument(_))
        ));
        assert!(DatasetWriter::create(dir.path(), ImageEncoding::Png, true).is_ok());
    }

    #[test]
    fn test_jpeg_extension_and_info() {
        let dir = TempDir::new().unwrap();
        let mut writer = DatasetWriter::create(dir.path(), ImageEncoding::Jpeg { quality: 95 }, false).unwrap();
        writer.write(&example("a.JPEG", 1)).unwrap();

        let dataset = CorruptedImagenet::new(
            InMemorySource::default(),
            BuilderConfig::from_name("zoom_blur_4").unwrap(),
        );
        writer.write_info(&dataset.info()).unwrap();
        writer.finish().unwrap();

        assert!(dir.path().join("images/a.jpg").is_file());
        let info: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(INFO_FILE)).unwrap()).unwrap();
        assert_eq!(info["config"]["name"], "zoom_blur_4");
        assert_eq!(info["config"]["version"], "0.0.1");
    }
}
