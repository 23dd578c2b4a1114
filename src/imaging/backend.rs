//! Resize backend trait and shared types.
//!
//! [`TranscodeBackend`] is the seam between the pipeline (which decides what
//! to resize) and the code doing the pixel work. Two implementations exist:
//! [`MagickBackend`](super::magick_backend::MagickBackend), which shells out
//! to ImageMagick, and [`RustBackend`](super::rust_backend::RustBackend), the
//! pure in-process fallback. The [`Transcoder`](super::transcoder::Transcoder)
//! tries them in that fixed order.

use thiserror::Error;

/// Failure of a single backend attempt.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Encoding format for resized output.
///
/// Derived from the upload's declared content type, and total: every input
/// maps to an output. Unrecognized content types deliberately default to
/// JPEG rather than erroring on unusual but valid MIME strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
}

impl OutputFormat {
    /// Map a declared content type to its output format.
    ///
    /// `image/png` → PNG; `image/jpg` and `image/jpeg` → JPEG; anything
    /// else → JPEG (the documented default).
    pub fn from_content_type(content_type: &str) -> Self {
        match content_type.to_ascii_lowercase().as_str() {
            "image/png" => OutputFormat::Png,
            "image/jpg" | "image/jpeg" => OutputFormat::Jpeg,
            _ => OutputFormat::Jpeg,
        }
    }

    /// Canonical file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }

    pub fn image_format(self) -> image::ImageFormat {
        match self {
            OutputFormat::Png => image::ImageFormat::Png,
            OutputFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// Trait for resize backends.
///
/// Takes encoded image bytes, produces encoded image bytes of exactly
/// `width` × `height` in the requested format. Implementations must be
/// side-effect-free with respect to their input.
pub trait TranscodeBackend: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Resize the image to exact target dimensions and re-encode.
    fn resize(
        &self,
        image: &[u8],
        width: u32,
        height: u32,
        format: OutputFormat,
    ) -> Result<Vec<u8>, BackendError>;
}
