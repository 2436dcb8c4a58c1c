//! Per-example decoding and corruption, and the lazy corrupted stream.

use std::iter::FusedIterator;

use corrupt_core::{CorruptedExample, Error, RawExample, Result};
use image::RgbImage;
use tracing::{debug, info, warn};

use crate::resolver::BoundCorruption;
use crate::rng::{DeterministicBatch, RandomState};

/// A fallible per-record transformation that may consume randomness
pub trait Transform {
    type Input;
    type Output;

    fn apply(&self, input: Self::Input, rng: &mut RandomState) -> Result<Self::Output>;
}

/// Decodes encoded image bytes to 8-bit RGB, whatever the stored channel layout
pub fn decode_rgb(file_name: &str, bytes: &[u8]) -> Result<RgbImage> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| Error::decode(file_name, e))?
        .to_rgb8();
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::decode(file_name, "image has no pixels"));
    }
    Ok(image)
}

/// Decodes a raw validation record and applies one bound corruption to it
#[derive(Debug, Clone, Copy)]
pub struct ExampleTransformer {
    corruption: BoundCorruption,
}

impl ExampleTransformer {
    pub fn new(corruption: BoundCorruption) -> Self {
        Self { corruption }
    }

    pub fn corruption(&self) -> &BoundCorruption {
        &self.corruption
    }

    /// Label and file name pass through unchanged
    pub fn transform(&self, raw: RawExample, rng: &mut RandomState) -> Result<CorruptedExample> {
        let RawExample {
            file_name,
            image,
            label,
        } = raw;
        let decoded = decode_rgb(&file_name, &image)?;
        let corrupted = self.corruption.apply(&decoded, rng)?;
        debug!(file_name = %file_name, label, "Corrupted example");
        Ok(CorruptedExample {
            file_name,
            image: corrupted,
            label,
        })
    }
}

impl Transform for ExampleTransformer {
    type Input = RawExample;
    type Output = CorruptedExample;

    fn apply(&self, input: RawExample, rng: &mut RandomState) -> Result<CorruptedExample> {
        self.transform(input, rng)
    }
}

/// Lazily applies a [`Transform`] to a base stream inside one deterministic batch.
///
/// The batch starts when the stream is created and ends as soon as the
/// source is exhausted, a record fails, or the stream is dropped. After the
/// first error the stream yields nothing more.
pub struct TransformedExamples<'a, I, T> {
    source: I,
    transform: T,
    batch: Option<DeterministicBatch<'a>>,
    produced: usize,
}

/// The corrupted validation stream
pub type CorruptedStream<'a, I> = TransformedExamples<'a, I, ExampleTransformer>;

impl<'a, I, T> TransformedExamples<'a, I, T>
where
    I: Iterator<Item = Result<T::Input>>,
    T: Transform,
{
    pub fn new(source: I, transform: T, rng: &'a mut RandomState) -> Self {
        info!("Starting deterministic pass");
        Self {
            source,
            transform,
            batch: Some(DeterministicBatch::begin(rng)),
            produced: 0,
        }
    }

    /// Number of records yielded so far
    pub fn produced(&self) -> usize {
        self.produced
    }

    fn finish(&mut self, failed: bool) {
        if let Some(batch) = self.batch.take() {
            if failed {
                warn!(produced = self.produced, "Pass aborted");
            } else {
                info!(produced = self.produced, "Pass finished");
            }
            batch.end();
        }
    }
}

impl<'a, I, T> Iterator for TransformedExamples<'a, I, T>
where
    I: Iterator<Item = Result<T::Input>>,
    T: Transform,
{
    type Item = Result<T::Output>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch = self.batch.as_mut()?;
        let result = match self.source.next() {
            None => {
                self.finish(false);
                return None;
            }
            Some(Ok(input)) => self.transform.apply(input, batch.rng()),
            Some(Err(e)) => Err(e),
        };

        match result {
            Ok(output) => {
                self.produced += 1;
                Some(Ok(output))
            }
            Err(e) => {
                self.finish(true);
                Some(Err(e))
            }
        }
    }
}

impl<'a, I, T> FusedIterator for TransformedExamples<'a, I, T>
where
    I: Iterator<Item = Result<T::Input>>,
    T: Transform,
{
}
