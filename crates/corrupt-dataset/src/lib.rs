//! Corrupted validation set generation.
//!
//! This crate applies one of twelve common image corruptions, at one of five
//! severities, to every image of a validation split. Each pass runs under
//! fixed random seeds so regenerating a configuration reproduces it exactly.
//!
//! ```no_run
//! use corrupt_dataset::prelude::*;
//!
//! # fn main() -> corrupt_core::Result<()> {
//! let source = DirectorySource::flat("data/val", std::path::Path::new("data/val_labels.txt"))?;
//! let dataset = CorruptedImagenet::from_config_name(source, "fog_3")?;
//! let mut rng = RandomState::from_entropy();
//! for example in dataset.generate_examples(&mut rng)? {
//!     let example = example?;
//!     println!("{} -> {}", example.file_name, example.label);
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod corruptions;
pub mod export;
pub mod labels;
pub mod resolver;
pub mod rng;
pub mod source;
pub mod transform;

pub use builder::{builder_configs, BuilderConfig, CorruptedImagenet, DatasetInfo};
pub use export::DatasetWriter;
pub use labels::ClassNames;
pub use resolver::{resolve, BoundCorruption};
pub use rng::{DeterministicBatch, RandomState};
pub use source::{DirectorySource, InMemorySource, ValidationSource};
pub use transform::{CorruptedStream, ExampleTransformer, Transform, TransformedExamples};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::builder::*;
    pub use crate::export::*;
    pub use crate::labels::*;
    pub use crate::resolver::*;
    pub use crate::rng::*;
    pub use crate::source::*;
    pub use crate::transform::*;
}
