//! Dataset assembly: the 60 named configurations, dataset metadata and the
//! corrupted validation split.

use corrupt_core::{CorruptionSpec, CorruptionType, Result, Severity, SUPPORTED_VERSIONS, VERSION};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::labels::ClassNames;
use crate::resolver::BoundCorruption;
use crate::rng::RandomState;
use crate::source::{RawExamples, ValidationSource};
use crate::transform::{CorruptedStream, ExampleTransformer};

/// Registered dataset name
pub const DATASET_NAME: &str = "imagenet2012_corrupted";

/// The only split the corrupted dataset has
pub const VALIDATION_SPLIT: &str = "validation";

/// Number of ImageNet classes, used when no class list is attached
pub const NUM_CLASSES: usize = 1000;

const DESCRIPTION: &str = "\
ImageNet 2012 validation images with one of twelve common corruptions applied \
at one of five severities, introduced to benchmark the robustness of image \
classifiers to everyday degradations. Labels and file names are those of the \
uncorrupted validation split.";

const CITATION: &str = r#"@inproceedings{
  hendrycks2018benchmarking,
  title={Benchmarking Neural Network Robustness to Common Corruptions and Perturbations},
  author={Dan Hendrycks and Thomas Dietterich},
  booktitle={International Conference on Learning Representations},
  year={2019},
  url={https://openreview.net/forum?id=HJz6tiCqYm},
}"#;

const HOMEPAGE: &str = "https://openreview.net/forum?id=HJz6tiCqYm";

/// One of the 60 named dataset variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderConfig {
    pub name: String,
    pub description: String,
    pub version: String,
    pub supported_versions: Vec<String>,
    pub spec: CorruptionSpec,
}

impl BuilderConfig {
    pub fn new(spec: CorruptionSpec) -> Self {
        Self {
            name: spec.config_name(),
            description: spec.description(),
            version: VERSION.to_string(),
            supported_versions: SUPPORTED_VERSIONS.iter().map(|v| v.to_string()).collect(),
            spec,
        }
    }

    /// Looks up a configuration by name, e.g. `"frosted_glass_blur_2"`
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(Self::new(CorruptionSpec::from_config_name(name)?))
    }
}

/// All configurations, type-major in canonical corruption order
pub fn builder_configs() -> Vec<BuilderConfig> {
    CorruptionType::ALL
        .iter()
        .flat_map(|&corruption_type| {
            Severity::all().map(move |severity| {
                BuilderConfig::new(CorruptionSpec {
                    corruption_type,
                    severity,
                })
            })
        })
        .collect()
}

/// A single feature of the record schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Feature {
    /// Encoded image of any size with three channels
    Image { channels: u8 },
    /// Integer class index, with the class names when they are known
    ClassLabel {
        num_classes: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        names: Option<Vec<String>>,
    },
    Text,
}

/// Static description of one configuration of the dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub name: String,
    pub config: BuilderConfig,
    pub description: String,
    pub citation: String,
    pub homepage: String,
    pub features: Vec<(String, Feature)>,
    pub supervised_keys: (String, String),
    pub splits: Vec<SplitInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitInfo {
    pub name: String,
    pub num_examples: usize,
}

/// The corrupted dataset: a base validation source plus a configuration
#[derive(Debug, Clone)]
pub struct CorruptedImagenet<S> {
    source: S,
    config: BuilderConfig,
    class_names: Option<ClassNames>,
}

impl<S: ValidationSource> CorruptedImagenet<S> {
    pub fn new(source: S, config: BuilderConfig) -> Self {
        Self {
            source,
            config,
            class_names: None,
        }
    }

    /// Attaches the class list that names the label feature
    pub fn with_class_names(mut self, class_names: ClassNames) -> Self {
        self.class_names = Some(class_names);
        self
    }

    pub fn from_config_name(source: S, name: &str) -> Result<Self> {
        Ok(Self::new(source, BuilderConfig::from_name(name)?))
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn class_names(&self) -> Option<&ClassNames> {
        self.class_names.as_ref()
    }

    pub fn info(&self) -> DatasetInfo {
        let label = match &self.class_names {
            Some(class_names) => Feature::ClassLabel {
                num_classes: class_names.len(),
                names: Some(class_names.names().to_vec()),
            },
            None => Feature::ClassLabel {
                num_classes: NUM_CLASSES,
                names: None,
            },
        };
        DatasetInfo {
            name: DATASET_NAME.to_string(),
            config: self.config.clone(),
            description: DESCRIPTION.to_string(),
            citation: CITATION.to_string(),
            homepage: HOMEPAGE.to_string(),
            features: vec![
                ("image".to_string(), Feature::Image { channels: 3 }),
                ("label".to_string(), label),
                ("file_name".to_string(), Feature::Text),
            ],
            supervised_keys: ("image".to_string(), "label".to_string()),
            splits: vec![SplitInfo {
                name: VALIDATION_SPLIT.to_string(),
                num_examples: self.source.num_examples(),
            }],
        }
    }

    /// Starts one deterministic pass over the corrupted validation split.
    ///
    /// The general-purpose generator of `rng` is restored when the returned
    /// stream ends or is dropped.
    pub fn generate_examples<'a>(
        &'a self,
        rng: &'a mut RandomState,
    ) -> Result<CorruptedStream<'a, RawExamples<'a>>> {
        let source = self.source.validation_examples()?;
        info!(
            config = %self.config.name,
            examples = self.source.num_examples(),
            "Generating corrupted validation split"
        );
        let transformer = ExampleTransformer::new(BoundCorruption::new(self.config.spec));
        Ok(CorruptedStream::new(source, transformer, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemorySource;
    use corrupt_core::{CorruptedExample, Error, RawExample};
    use image::{ImageFormat, Rgb, RgbImage};
    use std::collections::HashSet;
    use std::f32::consts::PI;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32, phase: f32) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, |x, y| {
            let v = 128.0 + 90.0 * (2.0 * PI * (x as f32 + phase) / 24.0).sin();
            Rgb([v as u8, (y * 255 / height.max(1)) as u8, 60])
        });
        let mut cursor = Cursor::new(Vec::new());
        image.write_to(&mut cursor, ImageFormat::Png).unwrap();
        cursor.into_inner()
    }

    fn source(count: usize, size: u32) -> InMemorySource {
        InMemorySource::new(
            (0..count)
                .map(|i| {
                    RawExample::new(
                        format!("ILSVRC2012_val_{:08}.JPEG", i + 1),
                        png_bytes(size, size, i as f32 * 3.0),
                        i * 7,
                    )
                })
                .collect(),
        )
    }

    fn run(dataset: &CorruptedImagenet<InMemorySource>, rng: &mut RandomState) -> Vec<CorruptedExample> {
        dataset
            .generate_examples(rng)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap()
    }

    #[test]
    fn test_sixty_unique_configs() {
        let configs = builder_configs();
        assert_eq!(configs.len(), 60);
        let names: HashSet<_> = configs.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.len(), 60);

        assert_eq!(configs[0].name, "gaussian_noise_1");
        assert_eq!(configs[59].name, "jpeg_compression_5");
        for config in &configs {
            assert_eq!(config.version, "0.0.1");
            assert_eq!(config.supported_versions, vec!["3.0.0".to_string()]);
            assert_eq!(
                config.description,
                format!(
                    "corruption type = {}, severity = {}",
                    config.spec.corruption_type,
                    config.spec.severity.get()
                )
            );
        }
    }

    #[test]
    fn test_config_by_name() {
        let config = BuilderConfig::from_name("frosted_glass_blur_2").unwrap();
        assert_eq!(config.spec.corruption_type, CorruptionType::FrostedGlassBlur);
        assert!(matches!(
            BuilderConfig::from_name("motion_blur_2"),
            Err(Error::UnknownCorruptionType(_))
        ));
    }

    #[test]
    fn test_info() {
        let dataset = CorruptedImagenet::from_config_name(source(3, 8), "fog_1").unwrap();
        let info = dataset.info();
        assert_eq!(info.name, "imagenet2012_corrupted");
        assert_eq!(info.supervised_keys, ("image".to_string(), "label".to_string()));
        assert_eq!(info.splits[0].num_examples, 3);
        assert!(info.citation.contains("Hendrycks"));
        let names: Vec<&str> = info.features.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["image", "label", "file_name"]);
        assert_eq!(
            info.features[1].1,
            Feature::ClassLabel {
                num_classes: NUM_CLASSES,
                names: None
            }
        );
    }

    #[test]
    fn test_info_carries_class_names() {
        let class_names = ClassNames::parse("n01440764\nn01443537\nn01484850\n");
        let dataset = CorruptedImagenet::from_config_name(source(2, 8), "pixelate_1")
            .unwrap()
            .with_class_names(class_names);
        let info = dataset.info();
        match &info.features[1].1 {
            Feature::ClassLabel { num_classes, names } => {
                assert_eq!(*num_classes, 3);
                assert_eq!(names.as_deref().unwrap()[1], "n01443537");
            }
            other => panic!("unexpected label feature {other:?}"),
        }

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["features"][1][1]["names"][2], "n01484850");
    }

    #[test]
    fn test_two_passes_are_identical() {
        let dataset = CorruptedImagenet::from_config_name(source(4, 24), "frosted_glass_blur_3").unwrap();
        let first = run(&dataset, &mut RandomState::seed_from_u64(1));
        let second = run(&dataset, &mut RandomState::seed_from_u64(999));
        assert_eq!(first.len(), 4);
        assert_eq!(first, second);

        let first_png: Vec<Vec<u8>> = first.iter().map(|e| e.encode(Default::default()).unwrap()).collect();
        let second_png: Vec<Vec<u8>> = second.iter().map(|e| e.encode(Default::default()).unwrap()).collect();
        assert_eq!(first_png, second_png);
    }

    #[test]
    fn test_repeated_pass_with_same_state_is_identical() {
        let dataset = CorruptedImagenet::from_config_name(source(3, 16), "impulse_noise_4").unwrap();
        let mut rng = RandomState::seed_from_u64(5);
        let first = run(&dataset, &mut rng);
        let second = run(&dataset, &mut rng);
        assert_eq!(first, second);
    }

    #[test]
    fn test_general_rng_restored_after_pass() {
        let dataset = CorruptedImagenet::from_config_name(source(3, 16), "elastic_2").unwrap();
        let mut rng = RandomState::seed_from_u64(77);
        let before = rng.general_state();
        let image_before = rng.image_library_state();

        run(&dataset, &mut rng);

        assert_eq!(rng.general_state(), before);
        assert_ne!(rng.image_library_state(), image_before);
    }

    #[test]
    fn test_general_rng_restored_after_early_stop() {
        let dataset = CorruptedImagenet::from_config_name(source(5, 16), "gaussian_noise_2").unwrap();
        let mut rng = RandomState::seed_from_u64(13);
        let before = rng.general_state();

        let taken: Vec<_> = dataset.generate_examples(&mut rng).unwrap().take(2).collect();
        assert_eq!(taken.len(), 2);
        assert_eq!(rng.general_state(), before);
    }

    #[test]
    fn test_gaussian_noise_3_on_224() {
        let dataset = CorruptedImagenet::from_config_name(source(1, 224), "gaussian_noise_3").unwrap();
        let original = image::load_from_memory(&png_bytes(224, 224, 0.0)).unwrap().to_rgb8();

        let a = run(&dataset, &mut RandomState::seed_from_u64(1));
        let b = run(&dataset, &mut RandomState::seed_from_u64(2));
        assert_eq!(a[0].image.dimensions(), (224, 224));
        assert_ne!(a[0].image, original);
        assert_eq!(a[0].image, b[0].image);
        assert_eq!(a[0].file_name, "ILSVRC2012_val_00000001.JPEG");
        assert_eq!(a[0].label, 0);
    }

    #[test]
    fn test_jpeg_severity_5_degrades_more_than_1() {
        let base = source(1, 64);
        let original = image::load_from_memory(&png_bytes(64, 64, 0.0)).unwrap().to_rgb8();
        let mse = |image: &RgbImage| -> f64 {
            image
                .iter()
                .zip(original.iter())
                .map(|(&a, &b)| (a as f64 - b as f64).powi(2))
                .sum::<f64>()
                / image.len() as f64
        };

        let light = run(
            &CorruptedImagenet::from_config_name(base.clone(), "jpeg_compression_1").unwrap(),
            &mut RandomState::seed_from_u64(0),
        );
        let heavy = run(
            &CorruptedImagenet::from_config_name(base, "jpeg_compression_5").unwrap(),
            &mut RandomState::seed_from_u64(0),
        );
        assert_ne!(light[0].image, heavy[0].image);
        assert!(mse(&heavy[0].image) > mse(&light[0].image));
    }

    #[test]
    fn test_decode_failure_aborts_pass() {
        let mut examples = vec![RawExample::new("ok.png", png_bytes(8, 8, 0.0), 1)];
        examples.push(RawExample::new("corrupt.JPEG", b"\xff\xd8garbage".to_vec(), 2));
        examples.push(RawExample::new("never.png", png_bytes(8, 8, 1.0), 3));
        let dataset = CorruptedImagenet::from_config_name(InMemorySource::new(examples), "contrast_3").unwrap();

        let mut rng = RandomState::seed_from_u64(4);
        let before = rng.general_state();
        let result: Result<Vec<_>> = dataset.generate_examples(&mut rng).unwrap().collect();

        assert!(matches!(result, Err(Error::Decode { ref file_name, .. }) if file_name == "corrupt.JPEG"));
        assert_eq!(rng.general_state(), before);
    }
}
