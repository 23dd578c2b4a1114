//! Fixed-priority backend selection.
//!
//! The external ImageMagick path is tried first; any failure there is logged
//! and swallowed, and the in-process path runs instead. Only both paths
//! failing surfaces an error, which carries both failure messages. Successful
//! results are tagged with the backend that produced them so callers can
//! observe which path actually ran.

use super::backend::{OutputFormat, TranscodeBackend};
use crate::config::PhotoConfig;
use super::magick_backend::MagickBackend;
use super::rust_backend::RustBackend;
use thiserror::Error;

/// Which backend produced a resize result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    External,
    InProcess,
}

/// A successful resize, tagged with the backend that ran.
#[derive(Debug, Clone)]
pub struct Transcoded {
    pub bytes: Vec<u8>,
    pub backend: BackendKind,
}

/// Every backend failed for one resize operation.
#[derive(Error, Debug)]
#[error(
    "resize failed on every backend: external: {}; in-process: {fallback}",
    .primary.as_deref().unwrap_or("not attempted")
)]
pub struct TranscodeError {
    /// Primary backend failure, if a primary was configured.
    pub primary: Option<String>,
    pub fallback: String,
}

/// Tries resize backends in fixed priority order.
pub struct Transcoder {
    primary: Option<Box<dyn TranscodeBackend>>,
    fallback: Box<dyn TranscodeBackend>,
}

impl Transcoder {
    /// External ImageMagick primary (located via config), in-process fallback.
    pub fn from_config(config: &PhotoConfig) -> Self {
        Self {
            primary: Some(Box::new(MagickBackend::new(
                config.external_tool_path.as_deref(),
            ))),
            fallback: Box::new(RustBackend::new()),
        }
    }

    /// Explicit backends, for tests and embedders with their own strategy.
    pub fn with_backends(
        primary: Option<Box<dyn TranscodeBackend>>,
        fallback: Box<dyn TranscodeBackend>,
    ) -> Self {
        Self { primary, fallback }
    }

    /// Resize through the first backend that succeeds.
    pub fn resize(
        &self,
        image: &[u8],
        width: u32,
        height: u32,
        format: OutputFormat,
    ) -> Result<Transcoded, TranscodeError> {
        let primary_failure = match &self.primary {
            Some(backend) => match backend.resize(image, width, height, format) {
                Ok(bytes) => {
                    return Ok(Transcoded {
                        bytes,
                        backend: BackendKind::External,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        backend = backend.name(),
                        error = %e,
                        "primary resize backend failed, falling back"
                    );
                    Some(e.to_string())
                }
            },
            None => None,
        };

        match self.fallback.resize(image, width, height, format) {
            Ok(bytes) => Ok(Transcoded {
                bytes,
                backend: BackendKind::InProcess,
            }),
            Err(e) => Err(TranscodeError {
                primary: primary_failure,
                fallback: e.to_string(),
            }),
        }
    }
}
