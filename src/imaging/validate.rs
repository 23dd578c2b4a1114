//! Upload validation: dimensions and format/size policy.
//!
//! These checks run before any resize planning. Failing either aborts the
//! upload with no side effects — no cipher work, no record.

use crate::imaging::backend::OutputFormat;
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("image is {width}x{height}, exceeding the maximum dimension of {max} pixels")]
    Oversized { width: u32, height: u32, max: u32 },
    #[error("cannot decode image: {0}")]
    Undecodable(String),
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),
}

/// Read width and height from encoded image bytes.
///
/// Only the container header is decoded, not the full pixel data. Fails with
/// [`ValidationError::Undecodable`] if the bytes are not a supported raster
/// image.
pub fn read_dimensions(bytes: &[u8]) -> Result<(u32, u32), ValidationError> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ValidationError::Undecodable(e.to_string()))?
        .into_dimensions()
        .map_err(|e| ValidationError::Undecodable(e.to_string()))
}

/// Whether the declared content type passes the upload format policy.
///
/// Two conditions must both hold: the content type is one of the supported
/// raster MIME strings (`image/png`, `image/jpg`, `image/jpeg`), and its
/// canonical extension appears in the configured allow-list.
pub fn is_allowed_format(content_type: &str, allowed_formats: &[String]) -> bool {
    let supported = matches!(
        content_type.to_ascii_lowercase().as_str(),
        "image/png" | "image/jpg" | "image/jpeg"
    );
    if !supported {
        return false;
    }
    let extension = OutputFormat::from_content_type(content_type).extension();
    allowed_formats
        .iter()
        .any(|f| f.eq_ignore_ascii_case(extension) || f.eq_ignore_ascii_case(content_type))
}

/// Whether both dimensions fit under the single configured maximum.
///
/// The same bound applies to width and height independently; this is a
/// per-axis limit, not an area limit.
pub fn is_allowed_size(width: u32, height: u32, max_dimension: u32) -> bool {
    width <= max_dimension && height <= max_dimension
}
