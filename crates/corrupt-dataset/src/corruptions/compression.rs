//! Lossy re-encoding artifacts.

use std::io::Cursor;

use corrupt_core::{Error, Result, Severity};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::rng::RandomState;

const JPEG_QUALITY: [u8; 5] = [25, 18, 15, 10, 7];

/// Round-trips the image through an in-memory JPEG at decreasing quality
pub fn jpeg_compression(
    image: &RgbImage,
    severity: Severity,
    _rng: &mut RandomState,
) -> Result<RgbImage> {
    let quality = JPEG_QUALITY[severity.index()];

    let mut cursor = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut cursor, quality)
        .encode_image(image)
        .map_err(|e| Error::Encode(format!("jpeg quality {}: {}", quality, e)))?;

    let decoded = image::load_from_memory(cursor.get_ref())
        .map_err(|e| Error::decode("<jpeg round trip>", e))?;
    Ok(decoded.to_rgb8())
}
