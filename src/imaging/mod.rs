//! Image validation, resize planning, and transcoding.
//!
//! | Concern | Module |
//! |---|---|
//! | **Dimension & policy checks** | [`validate`] |
//! | **Bounding-box planning** | [`calculations`] (pure, I/O-free) |
//! | **Backend seam** | [`backend`] — [`TranscodeBackend`] trait |
//! | **Primary resize** | [`magick_backend`] — external ImageMagick |
//! | **Fallback resize** | [`rust_backend`] — `image` crate, bilinear |
//! | **Priority/fallback policy** | [`transcoder`] |

pub mod backend;
mod calculations;
pub mod magick_backend;
pub mod rust_backend;
pub mod transcoder;
pub mod validate;

pub use backend::{BackendError, OutputFormat, TranscodeBackend};
pub use calculations::plan_resize;
pub use magick_backend::MagickBackend;
pub use rust_backend::RustBackend;
pub use transcoder::{BackendKind, Transcoded, TranscodeError, Transcoder};
pub use validate::{ValidationError, is_allowed_format, is_allowed_size, read_dimensions};
