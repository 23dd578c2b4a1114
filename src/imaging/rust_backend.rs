//! Pure in-process resize backend — the fallback path.
//!
//! Decodes with the `image` crate, resamples with bilinear interpolation onto
//! a canvas of exactly the target dimensions, and re-encodes. JPEG output
//! goes through an RGB canvas first since the JPEG encoder has no alpha
//! channel. Always available: no external binaries, nothing to install.

use super::backend::{BackendError, OutputFormat, TranscodeBackend};
use image::DynamicImage;
use image::imageops::FilterType;
use std::io::Cursor;

/// In-process backend using the `image` crate.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscodeBackend for RustBackend {
    fn name(&self) -> &'static str {
        "in-process"
    }

    fn resize(
        &self,
        image: &[u8],
        width: u32,
        height: u32,
        format: OutputFormat,
    ) -> Result<Vec<u8>, BackendError> {
        let decoded = image::load_from_memory(image)
            .map_err(|e| BackendError::ProcessingFailed(format!("decode failed: {e}")))?;

        // Triangle filter is bilinear interpolation; resize_exact draws onto
        // a width x height canvas without preserving aspect ratio (the
        // planner already did that).
        let resized = decoded.resize_exact(width, height, FilterType::Triangle);

        let output = match format {
            OutputFormat::Jpeg => DynamicImage::ImageRgb8(resized.to_rgb8()),
            OutputFormat::Png => resized,
        };

        let mut buf = Cursor::new(Vec::new());
        output
            .write_to(&mut buf, format.image_format())
            .map_err(|e| BackendError::ProcessingFailed(format!("encode failed: {e}")))?;
        Ok(buf.into_inner())
    }
}
