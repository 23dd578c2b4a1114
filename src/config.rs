//! Pipeline configuration.
//!
//! [`PhotoConfig`] is a read-only options struct. Loading it (from TOML, env,
//! CLI flags, whatever the host application prefers) is the embedder's
//! concern; the pipeline only ever sees the parsed values.

use serde::Deserialize;
use std::path::PathBuf;

/// Options governing validation, resizing, and key storage.
///
/// `max_resize_width` / `max_resize_height` form the bounding box an uploaded
/// image must fit into. Either may be `None` (unbounded on that axis); when
/// both are `None` no resizing ever happens.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PhotoConfig {
    /// Maximum output width in pixels, if bounded.
    pub max_resize_width: Option<u32>,
    /// Maximum output height in pixels, if bounded.
    pub max_resize_height: Option<u32>,
    /// Hard per-axis limit on uploads; images wider or taller are rejected.
    pub max_upload_dimension: u32,
    /// Extensions accepted by the upload policy (lowercase, no dot).
    pub allowed_formats: Vec<String>,
    /// Explicit path to the ImageMagick `convert` binary. When unset, the
    /// binary is resolved from `PATH`.
    pub external_tool_path: Option<PathBuf>,
    /// Location of the base64-encoded symmetric key file.
    pub key_file: PathBuf,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            max_resize_width: None,
            max_resize_height: None,
            max_upload_dimension: 5000,
            allowed_formats: vec!["png".into(), "jpg".into(), "jpeg".into()],
            external_tool_path: None,
            key_file: PathBuf::from("secret.key"),
        }
    }
}
