//! Base validation streams the corruptions are applied to.

use std::fs;
use std::path::{Path, PathBuf};

use corrupt_core::{Error, RawExample, Result};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::labels::{read_validation_labels, ClassNames};

/// Boxed stream of raw validation records
pub type RawExamples<'a> = Box<dyn Iterator<Item = Result<RawExample>> + 'a>;

/// Something that can produce the validation split as raw encoded records
pub trait ValidationSource {
    /// Starts a new pass over the validation split
    fn validation_examples(&self) -> Result<RawExamples<'_>>;

    /// Number of records a pass yields
    fn num_examples(&self) -> usize;
}

/// Validation records already held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    examples: Vec<RawExample>,
}

impl InMemorySource {
    pub fn new(examples: Vec<RawExample>) -> Self {
        Self { examples }
    }
}

impl ValidationSource for InMemorySource {
    fn validation_examples(&self) -> Result<RawExamples<'_>> {
        Ok(Box::new(self.examples.iter().cloned().map(Ok)))
    }

    fn num_examples(&self) -> usize {
        self.examples.len()
    }
}

const IMAGE_EXTENSIONS: [&str; 5] = ["jpeg", "jpg", "png", "bmp", "gif"];

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Image files directly under `dir`, sorted by file name
fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::NotFound(format!(
            "Image directory not found: {}",
            dir.display()
        )));
    }
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_image_file(p))
        .collect();
    files.sort();
    Ok(files)
}

#[derive(Debug, Clone)]
struct LabeledFile {
    path: PathBuf,
    file_name: String,
    label: usize,
}

/// Validation images read from disk.
///
/// Two layouts are supported:
///
/// ```text
/// flat:                              per class:
/// val/                               val/
/// ├── ILSVRC2012_val_00000001.JPEG   ├── n01440764/
/// ├── ILSVRC2012_val_00000002.JPEG   │   └── ILSVRC2012_val_00000293.JPEG
/// └── ...                            └── n01443537/
///  + labels.txt                          └── ...
/// ```
///
/// In the flat layout labels come from a labels file, one per image in file
/// name order. In the per-class layout the label is the position of the
/// folder name in the class list (or in the sorted folder names).
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    files: Vec<LabeledFile>,
}

impl DirectorySource {
    /// Flat directory of images with a parallel labels file
    pub fn flat(images_dir: impl Into<PathBuf>, labels_file: &Path) -> Result<Self> {
        let root = images_dir.into();
        let images = list_images(&root)?;
        let labels = read_validation_labels(labels_file)?;
        if labels.len() != images.len() {
            return Err(Error::InvalidArgument(format!(
                "{} has {} labels but {} contains {} images",
                labels_file.display(),
                labels.len(),
                root.display(),
                images.len()
            )));
        }

        let files = images
            .into_iter()
            .zip(labels)
            .map(|(path, label)| LabeledFile {
                file_name: file_name_of(&path),
                path,
                label,
            })
            .collect::<Vec<_>>();
        info!("Found {} validation images in {}", files.len(), root.display());
        Ok(Self { root, files })
    }

    /// One sub-directory per class
    pub fn per_class(images_dir: impl Into<PathBuf>, class_names: Option<&ClassNames>) -> Result<Self> {
        let root = images_dir.into();
        if !root.is_dir() {
            return Err(Error::NotFound(format!(
                "Image directory not found: {}",
                root.display()
            )));
        }

        let mut class_dirs: Vec<String> = Vec::new();
        for entry in fs::read_dir(&root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    class_dirs.push(name.to_string());
                }
            }
        }
        class_dirs.sort();
        info!("Found {} class directories", class_dirs.len());

        let mut files = Vec::new();
        for (position, class_dir) in class_dirs.iter().enumerate() {
            let label = match class_names {
                Some(names) => names.index(class_dir).ok_or_else(|| {
                    Error::NotFound(format!("Class '{}' is not in the class list", class_dir))
                })?,
                None => position,
            };
            let images = list_images(&root.join(class_dir))?;
            debug!("Class '{}' (label {}): {} images", class_dir, label, images.len());
            files.extend(images.into_iter().map(|path| LabeledFile {
                file_name: file_name_of(&path),
                path,
                label,
            }));
        }
        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        info!("Found {} validation images in {}", files.len(), root.display());
        Ok(Self { root, files })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl ValidationSource for DirectorySource {
    fn validation_examples(&self) -> Result<RawExamples<'_>> {
        Ok(Box::new(self.files.iter().map(|file| -> Result<RawExample> {
            let bytes = fs::read(&file.path)?;
            Ok(RawExample::new(file.file_name.clone(), bytes, file.label))
        })))
    }

    fn num_examples(&self) -> usize {
        self.files.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path, bytes: &[u8]) {
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_in_memory_source_repeatable() {
        let source = InMemorySource::new(vec![
            RawExample::new("a", vec![1], 0),
            RawExample::new("b", vec![2], 1),
        ]);
        let first: Vec<_> = source.validation_examples().unwrap().collect::<Result<_>>().unwrap();
        let second: Vec<_> = source.validation_examples().unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(first, second);
        assert_eq!(source.num_examples(), 2);
    }

    #[test]
    fn test_flat_layout_pairs_sorted_names_with_labels() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("val_0002.JPEG"), b"two");
        touch(&dir.path().join("val_0001.JPEG"), b"one");
        touch(&dir.path().join("README.txt"), b"skip me");
        let labels = dir.path().join("labels.txt");
        touch(&labels, b"7\n3\n");

        let source = DirectorySource::flat(dir.path(), &labels).unwrap();
        let examples: Vec<_> = source.validation_examples().unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].file_name, "val_0001.JPEG");
        assert_eq!(examples[0].label, 7);
        assert_eq!(examples[0].image, b"one");
        assert_eq!(examples[1].label, 3);
    }

    #[test]
    fn test_flat_layout_label_count_mismatch() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("a.png"), b"x");
        let labels = dir.path().join("labels.txt");
        touch(&labels, b"1\n2\n");
        assert!(matches!(
            DirectorySource::flat(dir.path(), &labels),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_per_class_layout() {
        let dir = TempDir::new().unwrap();
        for (class, file) in [("n02", "val_1.JPEG"), ("n01", "val_2.JPEG"), ("n02", "val_3.JPEG")] {
            fs::create_dir_all(dir.path().join(class)).unwrap();
            touch(&dir.path().join(class).join(file), b"img");
        }

        let source = DirectorySource::per_class(dir.path(), None).unwrap();
        let labels: Vec<(String, usize)> = source
            .validation_examples()
            .unwrap()
            .map(|e| e.map(|e| (e.file_name, e.label)))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(
            labels,
            vec![
                ("val_1.JPEG".to_string(), 1),
                ("val_2.JPEG".to_string(), 0),
                ("val_3.JPEG".to_string(), 1),
            ]
        );

        let names = ClassNames::parse("n00\nn01\nn02\n");
        let source = DirectorySource::per_class(dir.path(), Some(&names)).unwrap();
        let first = source.validation_examples().unwrap().next().unwrap().unwrap();
        assert_eq!(first.label, 2);
    }

    #[test]
    fn test_missing_directory() {
        assert!(matches!(
            DirectorySource::per_class("/nonexistent/val", None),
            Err(Error::NotFound(_))
        ));
        let err = DirectorySource::flat("/nonexistent/val", Path::new("labels.txt")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
