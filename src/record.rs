//! Photo records and the persistence seam.
//!
//! [`PhotoRecord`] is the unit of storage: metadata plus the encrypted
//! payload. Plaintext image bytes never appear in a record. [`PhotoStore`] is
//! the collaborator contract a backing store must satisfy; [`MemoryStore`] is
//! the bundled in-memory implementation used by tests and small embedders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// A stored photo: upload metadata plus the encrypted payload.
///
/// `encrypted_payload` is always IV-prefixed ciphertext as produced by
/// [`Cipher::encrypt`](crate::crypto::Cipher::encrypt). `resized_width` and
/// `resized_height` are `None` only mid-construction; every record the
/// pipeline hands out has them populated (equal to the originals when no
/// resize occurred).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoRecord {
    /// Assigned by the store on `save`; `None` before then.
    pub id: Option<u64>,
    /// Filename as supplied by the uploader; free text, may be empty.
    pub original_file_name: String,
    /// System-generated unique lookup key, immutable once assigned.
    pub storage_key: String,
    /// Declared MIME type at upload time; drives the output format.
    pub content_type: String,
    /// Size of the original upload in bytes, informational.
    pub file_size_bytes: u64,
    pub original_width: u32,
    pub original_height: u32,
    pub resized_width: Option<u32>,
    pub resized_height: Option<u32>,
    /// IV (16 bytes) followed by ciphertext. Never serialized into metadata
    /// responses; see [`PhotoMetadata`].
    #[serde(skip_serializing)]
    #[serde(default)]
    pub encrypted_payload: Vec<u8>,
    pub uploaded_at: DateTime<Utc>,
    /// Set only when a resize actually occurred.
    pub processed_at: Option<DateTime<Utc>>,
    /// True iff a resize occurred.
    pub is_processed: bool,
}

impl PhotoRecord {
    /// Payload-free view for metadata responses.
    pub fn metadata(&self) -> PhotoMetadata {
        PhotoMetadata {
            id: self.id,
            original_file_name: self.original_file_name.clone(),
            storage_key: self.storage_key.clone(),
            content_type: self.content_type.clone(),
            file_size_bytes: self.file_size_bytes,
            original_width: self.original_width,
            original_height: self.original_height,
            resized_width: self.resized_width,
            resized_height: self.resized_height,
            uploaded_at: self.uploaded_at,
            processed_at: self.processed_at,
            is_processed: self.is_processed,
        }
    }
}

/// What callers see when they ask about a photo without downloading it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoMetadata {
    pub id: Option<u64>,
    pub original_file_name: String,
    pub storage_key: String,
    pub content_type: String,
    pub file_size_bytes: u64,
    pub original_width: u32,
    pub original_height: u32,
    pub resized_width: Option<u32>,
    pub resized_height: Option<u32>,
    pub uploaded_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub is_processed: bool,
}

/// Persistence collaborator contract.
///
/// Implementations must provide per-record atomicity for `save`, reads, and
/// `delete_by_id`, but no cross-record transactions: a concurrent `find_all`
/// may observe a snapshot that misses records deleted mid-iteration.
pub trait PhotoStore: Send + Sync {
    /// Persist a record, assigning its id. Returns the stored record.
    fn save(&self, record: PhotoRecord) -> Result<PhotoRecord, StoreError>;
    fn find_by_storage_key(&self, key: &str) -> Result<Option<PhotoRecord>, StoreError>;
    fn find_all(&self) -> Result<Vec<PhotoRecord>, StoreError>;
    fn exists_by_id(&self, id: u64) -> Result<bool, StoreError>;
    fn delete_by_id(&self, id: u64) -> Result<(), StoreError>;
}

/// In-memory [`PhotoStore`] keyed by storage key, with a monotonic id
/// counter. Ids are never reused, even after deletion.
///
/// Cheap to clone; clones share the same underlying map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    records: Mutex<HashMap<String, PhotoRecord>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, PhotoRecord>>, StoreError> {
        self.inner
            .records
            .lock()
            .map_err(|_| StoreError::Backend("store mutex poisoned".into()))
    }
}

impl PhotoStore for MemoryStore {
    fn save(&self, mut record: PhotoRecord) -> Result<PhotoRecord, StoreError> {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        record.id = Some(id);
        let mut records = self.lock()?;
        records.insert(record.storage_key.clone(), record.clone());
        Ok(record)
    }

    fn find_by_storage_key(&self, key: &str) -> Result<Option<PhotoRecord>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn find_all(&self) -> Result<Vec<PhotoRecord>, StoreError> {
        let mut all: Vec<PhotoRecord> = self.lock()?.values().cloned().collect();
        all.sort_by_key(|r| r.id);
        Ok(all)
    }

    fn exists_by_id(&self, id: u64) -> Result<bool, StoreError> {
        Ok(self.lock()?.values().any(|r| r.id == Some(id)))
    }

    fn delete_by_id(&self, id: u64) -> Result<(), StoreError> {
        let mut records = self.lock()?;
        records.retain(|_, r| r.id != Some(id));
        Ok(())
    }
}
