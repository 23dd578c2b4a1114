//! The photo pipeline orchestrator.
//!
//! Composes validation, resize planning, transcoding, and encryption into the
//! upload flow, and the reverse (fetch, decrypt) into retrieval. Per upload
//! the flow is:
//!
//! ```text
//! Received -> format check -> dimension decode -> size check
//!          -> resize plan -> [transcode if needed] -> encrypt -> save
//! ```
//!
//! Any validation failure aborts before the cipher runs and before any record
//! exists. Retrieval decrypts the stored payload and returns it alongside the
//! record metadata; `archive_all` bundles every stored photo into one ZIP.

use crate::archive::{ArchiveError, build_zip};
use crate::config::PhotoConfig;
use crate::crypto::{Cipher, CryptoError};
use crate::imaging::{
    OutputFormat, TranscodeError, Transcoder, ValidationError, is_allowed_format, is_allowed_size,
    plan_resize, read_dimensions,
};
use crate::keys::KeyManager;
use crate::record::{PhotoMetadata, PhotoRecord, PhotoStore, StoreError};
use chrono::Utc;
use rayon::prelude::*;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transcode(#[from] TranscodeError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    /// Lookup by storage key or id with no match; distinct so callers can
    /// map it to a "missing resource" response.
    #[error("not found: {0}")]
    NotFound(String),
}

/// One file in a batch upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
}

/// Orchestrates upload, retrieval, archiving, and deletion over a
/// [`PhotoStore`].
pub struct PhotoPipeline<S: PhotoStore> {
    config: PhotoConfig,
    store: S,
    cipher: Cipher,
    transcoder: Transcoder,
}

impl<S: PhotoStore> PhotoPipeline<S> {
    /// Standard wiring: file-backed key manager at the configured location,
    /// ImageMagick primary with in-process fallback.
    pub fn new(config: PhotoConfig, store: S) -> Self {
        let keys = Arc::new(KeyManager::new(config.key_file.clone()));
        let transcoder = Transcoder::from_config(&config);
        Self::assemble(config, store, Cipher::new(keys), transcoder)
    }

    /// Wiring with an explicit transcoder, for tests and embedders that
    /// bring their own backend strategy.
    pub fn with_transcoder(config: PhotoConfig, store: S, transcoder: Transcoder) -> Self {
        let keys = Arc::new(KeyManager::new(config.key_file.clone()));
        Self::assemble(config, store, Cipher::new(keys), transcoder)
    }

    fn assemble(config: PhotoConfig, store: S, cipher: Cipher, transcoder: Transcoder) -> Self {
        Self {
            config,
            store,
            cipher,
            transcoder,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate, optionally resize, encrypt, and persist one upload.
    ///
    /// Returns the stored record with its id assigned. Validation failures
    /// abort before any cipher work and leave no record behind.
    pub fn upload(
        &self,
        bytes: &[u8],
        content_type: &str,
        original_file_name: &str,
    ) -> Result<PhotoRecord, PipelineError> {
        if !is_allowed_format(content_type, &self.config.allowed_formats) {
            return Err(ValidationError::UnsupportedFormat(content_type.to_string()).into());
        }

        let (width, height) = read_dimensions(bytes)?;

        if !is_allowed_size(width, height, self.config.max_upload_dimension) {
            return Err(ValidationError::Oversized {
                width,
                height,
                max: self.config.max_upload_dimension,
            }
            .into());
        }

        let plan = plan_resize(
            width,
            height,
            self.config.max_resize_width,
            self.config.max_resize_height,
        )?;

        let mut record = PhotoRecord {
            id: None,
            original_file_name: original_file_name.to_string(),
            storage_key: generate_storage_key(original_file_name),
            content_type: content_type.to_string(),
            file_size_bytes: bytes.len() as u64,
            original_width: width,
            original_height: height,
            resized_width: None,
            resized_height: None,
            encrypted_payload: Vec::new(),
            uploaded_at: Utc::now(),
            processed_at: None,
            is_processed: false,
        };

        let payload = match plan {
            Some((new_width, new_height)) => {
                let format = OutputFormat::from_content_type(content_type);
                let transcoded = self.transcoder.resize(bytes, new_width, new_height, format)?;
                tracing::debug!(
                    storage_key = %record.storage_key,
                    backend = ?transcoded.backend,
                    from = format!("{width}x{height}"),
                    to = format!("{new_width}x{new_height}"),
                    "resized upload"
                );
                record.resized_width = Some(new_width);
                record.resized_height = Some(new_height);
                record.processed_at = Some(Utc::now());
                record.is_processed = true;
                self.cipher.encrypt(&transcoded.bytes)?
            }
            None => {
                record.resized_width = Some(width);
                record.resized_height = Some(height);
                self.cipher.encrypt(bytes)?
            }
        };

        record.encrypted_payload = payload;
        Ok(self.store.save(record)?)
    }

    /// Upload a batch of files, each processed independently.
    ///
    /// Empty files are silently skipped; one invalid file never aborts its
    /// siblings. Results come back in input order, minus the skipped files.
    pub fn upload_batch(&self, files: &[UploadFile]) -> Vec<Result<PhotoRecord, PipelineError>> {
        files
            .par_iter()
            .filter(|file| !file.bytes.is_empty())
            .map(|file| self.upload(&file.bytes, &file.content_type, &file.file_name))
            .collect()
    }

    /// Fetch and decrypt a stored photo.
    pub fn retrieve(&self, storage_key: &str) -> Result<(PhotoMetadata, Vec<u8>), PipelineError> {
        let record = self.find_record(storage_key)?;
        let plaintext = self.cipher.decrypt(&record.encrypted_payload)?;
        Ok((record.metadata(), plaintext))
    }

    /// Metadata for one photo, without decrypting anything.
    pub fn metadata(&self, storage_key: &str) -> Result<PhotoMetadata, PipelineError> {
        Ok(self.find_record(storage_key)?.metadata())
    }

    /// Metadata for every stored photo.
    pub fn list_metadata(&self) -> Result<Vec<PhotoMetadata>, PipelineError> {
        Ok(self
            .store
            .find_all()?
            .iter()
            .map(PhotoRecord::metadata)
            .collect())
    }

    /// Decrypt every stored photo and pack them into one ZIP, keyed by
    /// original file name.
    ///
    /// Returns `Ok(None)` when the store is empty — an explicit "nothing to
    /// archive" signal, never a zero-byte archive. The record set is a
    /// best-effort snapshot; deletions racing this call may or may not be
    /// reflected.
    pub fn archive_all(&self) -> Result<Option<Vec<u8>>, PipelineError> {
        let records = self.store.find_all()?;
        if records.is_empty() {
            return Ok(None);
        }

        let mut entries = Vec::with_capacity(records.len());
        for record in &records {
            let plaintext = self.cipher.decrypt(&record.encrypted_payload)?;
            entries.push((record.original_file_name.clone(), plaintext));
        }
        Ok(Some(build_zip(&entries)?))
    }

    /// Delete a photo by id; [`PipelineError::NotFound`] if no such record.
    pub fn delete(&self, id: u64) -> Result<(), PipelineError> {
        if !self.store.exists_by_id(id)? {
            return Err(PipelineError::NotFound(format!("no photo with id {id}")));
        }
        self.store.delete_by_id(id)?;
        Ok(())
    }

    fn find_record(&self, storage_key: &str) -> Result<PhotoRecord, PipelineError> {
        self.store.find_by_storage_key(storage_key)?.ok_or_else(|| {
            PipelineError::NotFound(format!("no photo with storage key {storage_key}"))
        })
    }
}

/// Generate a collision-free storage key: a UUIDv4 token with the original
/// file extension preserved (taken from the last `.`; none if absent).
fn generate_storage_key(original_file_name: &str) -> String {
    let token = Uuid::new_v4().to_string();
    match original_file_name.rsplit_once('.') {
        Some((_, extension)) if !extension.is_empty() => format!("{token}.{extension}"),
        _ => token,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::record::MemoryStore;
    use crate::test_helpers::{jpeg_bytes, png_bytes};

    /// Pipeline over a fresh MemoryStore, in-process resizing only, with a
    /// key file in a per-test temp dir.
    fn test_pipeline(
        max_width: Option<u32>,
        max_height: Option<u32>,
    ) -> (tempfile::TempDir, PhotoPipeline<MemoryStore>) {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = PhotoConfig {
            max_resize_width: max_width,
            max_resize_height: max_height,
            key_file: tmp.path().join("secret.key"),
            ..PhotoConfig::default()
        };
        let transcoder = Transcoder::with_backends(None, Box::new(RustBackend::new()));
        let pipeline = PhotoPipeline::with_transcoder(config, MemoryStore::new(), transcoder);
        (tmp, pipeline)
    }

    #[test]
    fn oversize_upload_is_resized_and_marked_processed() {
        let (_tmp, pipeline) = test_pipeline(Some(1920), Some(1080));
        let record = pipeline
            .upload(&png_bytes(3000, 2000), "image/png", "big.png")
            .unwrap();

        // scale = min(1920/3000, 1080/2000) = 0.54
        assert!(record.is_processed);
        assert_eq!(record.resized_width, Some(1620));
        assert_eq!(record.resized_height, Some(1080));
        assert_eq!(record.original_width, 3000);
        assert_eq!(record.original_height, 2000);
        assert!(record.processed_at.is_some());
        assert!(record.id.is_some());
    }

    #[test]
    fn fitting_upload_is_stored_unresized() {
        let (_tmp, pipeline) = test_pipeline(Some(1920), Some(1080));
        let record = pipeline
            .upload(&jpeg_bytes(800, 600), "image/jpeg", "small.jpg")
            .unwrap();

        assert!(!record.is_processed);
        assert_eq!(record.resized_width, Some(800));
        assert_eq!(record.resized_height, Some(600));
        assert!(record.processed_at.is_none());
    }

    #[test]
    fn disallowed_format_rejected_before_any_record() {
        let (_tmp, pipeline) = test_pipeline(Some(1920), Some(1080));
        let result = pipeline.upload(&png_bytes(10, 10), "image/bmp", "pic.bmp");

        assert!(matches!(
            result,
            Err(PipelineError::Validation(
                ValidationError::UnsupportedFormat(_)
            ))
        ));
        assert!(pipeline.store().find_all().unwrap().is_empty());
        // No cipher work happened either: no key file was created.
        assert!(!pipeline.config.key_file.exists());
    }

    #[test]
    fn undecodable_bytes_rejected_before_any_record() {
        let (_tmp, pipeline) = test_pipeline(None, None);
        let result = pipeline.upload(b"not an image", "image/png", "fake.png");
        assert!(matches!(
            result,
            Err(PipelineError::Validation(ValidationError::Undecodable(_)))
        ));
        assert!(pipeline.store().find_all().unwrap().is_empty());
    }

    #[test]
    fn oversized_dimensions_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = PhotoConfig {
            max_upload_dimension: 100,
            key_file: tmp.path().join("secret.key"),
            ..PhotoConfig::default()
        };
        let transcoder = Transcoder::with_backends(None, Box::new(RustBackend::new()));
        let pipeline = PhotoPipeline::with_transcoder(config, MemoryStore::new(), transcoder);

        let result = pipeline.upload(&png_bytes(101, 50), "image/png", "wide.png");
        assert!(matches!(
            result,
            Err(PipelineError::Validation(ValidationError::Oversized {
                width: 101,
                height: 50,
                max: 100,
            }))
        ));
    }

    #[test]
    fn payload_is_encrypted_and_round_trips() {
        let (_tmp, pipeline) = test_pipeline(None, None);
        let original = png_bytes(40, 30);
        let record = pipeline.upload(&original, "image/png", "cat.png").unwrap();

        // Stored payload is IV + ciphertext, never the plaintext.
        assert!(record.encrypted_payload.len() > crate::crypto::IV_LEN);
        assert_ne!(record.encrypted_payload, original);

        let (metadata, plaintext) = pipeline.retrieve(&record.storage_key).unwrap();
        assert_eq!(plaintext, original);
        assert_eq!(metadata.content_type, "image/png");
        assert_eq!(metadata.original_file_name, "cat.png");
    }

    #[test]
    fn retrieve_unknown_key_is_not_found() {
        let (_tmp, pipeline) = test_pipeline(None, None);
        assert!(matches!(
            pipeline.retrieve("no-such-key.png"),
            Err(PipelineError::NotFound(_))
        ));
    }

    #[test]
    fn archive_of_empty_store_is_none() {
        let (_tmp, pipeline) = test_pipeline(None, None);
        assert!(pipeline.archive_all().unwrap().is_none());
    }

    #[test]
    fn batch_skips_empty_files_and_isolates_failures() {
        let (_tmp, pipeline) = test_pipeline(None, None);
        let files = vec![
            UploadFile {
                bytes: png_bytes(20, 20),
                content_type: "image/png".into(),
                file_name: "ok.png".into(),
            },
            UploadFile {
                bytes: Vec::new(),
                content_type: "image/png".into(),
                file_name: "empty.png".into(),
            },
            UploadFile {
                bytes: b"garbage".to_vec(),
                content_type: "image/png".into(),
                file_name: "bad.png".into(),
            },
            UploadFile {
                bytes: jpeg_bytes(15, 10),
                content_type: "image/jpeg".into(),
                file_name: "also-ok.jpg".into(),
            },
        ];

        let results = pipeline.upload_batch(&files);
        // Empty file skipped entirely, not reported as an error.
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
        assert_eq!(pipeline.store().find_all().unwrap().len(), 2);
    }

    #[test]
    fn delete_checks_existence() {
        let (_tmp, pipeline) = test_pipeline(None, None);
        let record = pipeline
            .upload(&png_bytes(10, 10), "image/png", "a.png")
            .unwrap();
        let id = record.id.unwrap();

        pipeline.delete(id).unwrap();
        assert!(matches!(
            pipeline.delete(id),
            Err(PipelineError::NotFound(_))
        ));
        assert!(matches!(
            pipeline.retrieve(&record.storage_key),
            Err(PipelineError::NotFound(_))
        ));
    }

    #[test]
    fn jpeg_variants_produce_jpeg_output_on_resize() {
        let (_tmp, pipeline) = test_pipeline(Some(50), Some(50));
        let record = pipeline
            .upload(&jpeg_bytes(100, 100), "image/jpg", "old-style.jpg")
            .unwrap();
        assert!(record.is_processed);

        let (_, plaintext) = pipeline.retrieve(&record.storage_key).unwrap();
        assert_eq!(
            image::guess_format(&plaintext).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn storage_key_preserves_extension() {
        let with_ext = generate_storage_key("holiday.snap.PNG");
        assert!(with_ext.ends_with(".PNG"));
        assert!(Uuid::parse_str(with_ext.trim_end_matches(".PNG")).is_ok());

        let without_ext = generate_storage_key("README");
        assert!(Uuid::parse_str(&without_ext).is_ok());

        let trailing_dot = generate_storage_key("odd.");
        assert!(Uuid::parse_str(&trailing_dot).is_ok());
    }

    #[test]
    fn storage_keys_are_unique_per_upload() {
        let (_tmp, pipeline) = test_pipeline(None, None);
        let a = pipeline
            .upload(&png_bytes(10, 10), "image/png", "same.png")
            .unwrap();
        let b = pipeline
            .upload(&png_bytes(10, 10), "image/png", "same.png")
            .unwrap();
        assert_ne!(a.storage_key, b.storage_key);
    }
}
