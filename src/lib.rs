//! # Photovault
//!
//! An encrypted photo processing pipeline: uploads are validated, resized to
//! a configured bounding box when they exceed it, encrypted with AES-256-CBC,
//! and persisted as opaque records. Plaintext image bytes never reach storage.
//!
//! # Architecture: The Upload Flow
//!
//! Every upload moves through the same fixed sequence, orchestrated by
//! [`pipeline::PhotoPipeline`]:
//!
//! ```text
//! bytes ─→ format check ─→ dimension decode ─→ size check
//!       ─→ resize plan ─→ [transcode] ─→ encrypt ─→ save
//! ```
//!
//! Validation failures abort before any cipher work, so a rejected upload
//! leaves no trace. The transcode step only runs when the planner decides the
//! image is too large; images that already fit are encrypted as received.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Orchestrator — upload, batch upload, retrieve, archive, delete |
//! | [`imaging`] | Validation, resize planning, and the two-backend transcoder |
//! | [`crypto`] | AES-256-CBC encryption with a random per-payload IV |
//! | [`keys`] | File-backed symmetric key: load on first use, generate if absent |
//! | [`archive`] | In-memory ZIP assembly for bulk downloads |
//! | [`record`] | The persisted photo record, its metadata view, and the store trait |
//! | [`config`] | The options struct the embedder fills in |
//!
//! # Design Decisions
//!
//! ## External Tool First, In-Process Fallback
//!
//! Resizing prefers ImageMagick's `convert` for its resampling quality, but
//! treats it as strictly optional: any failure (binary missing, bad exit,
//! hang) falls back to the pure-Rust `image` crate path. A deployment without
//! ImageMagick is degraded, never broken. See [`imaging::Transcoder`].
//!
//! ## Encryption at the Edge of Storage
//!
//! The cipher runs immediately before persistence and immediately after
//! retrieval. Everything in between — validation, planning, transcoding —
//! works on plaintext in memory, and nothing below the pipeline ever sees it.
//! Each payload gets a fresh random IV, prepended to the ciphertext, so the
//! stored blob is self-contained.
//!
//! ## Storage Behind a Trait
//!
//! The pipeline talks to [`record::PhotoStore`], not a concrete database.
//! [`record::MemoryStore`] ships for tests and small deployments; embedders
//! with real persistence implement the trait.
pub mod archive;
pub mod config;
pub mod crypto;
pub mod imaging;
pub mod keys;
pub mod pipeline;
pub mod record;

pub use config::PhotoConfig;
pub use pipeline::{PhotoPipeline, PipelineError, UploadFile};
pub use record::{MemoryStore, PhotoMetadata, PhotoRecord, PhotoStore};

#[cfg(test)]
pub(crate) mod test_helpers;
