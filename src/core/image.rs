//! Receipt photo compression pipeline.
//!
//! Turns an arbitrary camera or file-picker photo into a bounded-size JPEG
//! suitable for storage and for the OCR adapter. Oversized inputs are
//! rejected before any decode work, wide images are downscaled to a maximum
//! width preserving aspect ratio (never upscaled), and the whole operation
//! runs on a blocking worker under a timeout so a pathological input can
//! never hang the caller. Every failure path leaves the caller's image slot
//! untouched; a partial or corrupt result is never returned.

use image::{GenericImageView, codecs::jpeg::JpegEncoder, imageops::FilterType};
use std::time::Duration;
use thiserror::Error;

/// Hard ceiling on raw input size, checked before decoding.
pub const MAX_SOURCE_BYTES: usize = 8 * 1024 * 1024;

/// Maximum output width in pixels; height is only ever the aspect-preserving
/// scale of this.
pub const MAX_WIDTH: u32 = 1200;

/// JPEG quality factor. Lower trades fidelity for a smaller payload, which
/// matters on a mobile uplink.
pub const JPEG_QUALITY: u8 = 65;

/// Minimum plausible encoder output; anything below this is treated as a
/// silent encoder failure.
pub const MIN_ENCODED_BYTES: usize = 64;

/// Wall-clock bound on decode + resize + encode.
pub const PROCESSING_TIMEOUT: Duration = Duration::from_secs(30);

/// A bounded-size encoded receipt image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// JPEG bytes
    pub bytes: Vec<u8>,
    /// Pixel width, at most [`MAX_WIDTH`]
    pub width: u32,
    /// Pixel height
    pub height: u32,
}

/// Failure modes of the compression pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImageError {
    /// Input exceeded [`MAX_SOURCE_BYTES`]; nothing was decoded.
    #[error("image is too large ({bytes} bytes, limit {max})")]
    TooLarge {
        /// Size of the rejected input
        bytes: usize,
        /// The configured ceiling
        max: usize,
    },

    /// Input is empty or not a decodable image.
    #[error("could not read the photo: {reason}")]
    Decode {
        /// Decoder failure description
        reason: String,
    },

    /// Re-encoding failed.
    #[error("could not encode the photo: {reason}")]
    Encode {
        /// Encoder failure description
        reason: String,
    },

    /// Encoder produced an implausibly small result.
    #[error("encoded image is empty ({bytes} bytes)")]
    EmptyOutput {
        /// Size of the rejected output
        bytes: usize,
    },

    /// Processing exceeded the timeout; the late result is discarded.
    #[error("image processing timed out")]
    Timeout,

    /// The blocking worker was cancelled or panicked mid-operation.
    #[error("image processing was interrupted")]
    Interrupted,
}

/// Compresses a raw photo into a bounded-size JPEG under the default
/// [`PROCESSING_TIMEOUT`].
///
/// # Errors
/// Returns an [`ImageError`] for oversized, corrupt, or timed-out inputs.
pub async fn compress(raw: Vec<u8>) -> Result<EncodedImage, ImageError> {
    compress_with_timeout(raw, PROCESSING_TIMEOUT).await
}

/// Compresses a raw photo with an explicit timeout bound.
///
/// The size ceiling is enforced before any decode work. Decode, resize, and
/// encode run on a blocking worker; if the timeout fires first the result is
/// dropped and [`ImageError::Timeout`] is returned.
pub async fn compress_with_timeout(
    raw: Vec<u8>,
    timeout: Duration,
) -> Result<EncodedImage, ImageError> {
    if raw.len() > MAX_SOURCE_BYTES {
        return Err(ImageError::TooLarge {
            bytes: raw.len(),
            max: MAX_SOURCE_BYTES,
        });
    }

    let work = tokio::task::spawn_blocking(move || compress_blocking(&raw));

    match tokio::time::timeout(timeout, work).await {
        Ok(Ok(result)) => result,
        Ok(Err(_join_error)) => Err(ImageError::Interrupted),
        Err(_elapsed) => Err(ImageError::Timeout),
    }
}

/// Synchronous decode, downscale, and JPEG re-encode.
fn compress_blocking(raw: &[u8]) -> Result<EncodedImage, ImageError> {
    let decoded = image::load_from_memory(raw).map_err(|e| ImageError::Decode {
        reason: e.to_string(),
    })?;

    let (source_width, _source_height) = decoded.dimensions();

    // Downscale wide images; never upscale small ones. The unbounded height
    // makes the width constraint the only binding one, so the result is
    // exactly MAX_WIDTH wide with aspect-preserved height.
    let resized = if source_width > MAX_WIDTH {
        decoded.resize(MAX_WIDTH, u32::MAX, FilterType::Triangle)
    } else {
        decoded
    };

    let rgb = resized.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut bytes: Vec<u8> = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| ImageError::Encode {
            reason: e.to_string(),
        })?;

    if bytes.len() < MIN_ENCODED_BYTES {
        return Err(ImageError::EmptyOutput { bytes: bytes.len() });
    }

    Ok(EncodedImage {
        bytes,
        width,
        height,
    })
}
