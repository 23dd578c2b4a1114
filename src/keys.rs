//! Symmetric key management.
//!
//! One 256-bit AES key protects every stored photo. The key lives as a single
//! base64-encoded value in a well-known file: the first process to need it
//! generates and persists it, every later call (including after restarts)
//! loads the identical bytes back.
//!
//! Corrupt key material is fatal. Regenerating on a bad read would silently
//! orphan every previously encrypted payload, so a file that exists but does
//! not decode to exactly 32 bytes surfaces [`KeyError::Corrupt`] instead.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use rand::rngs::OsRng;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use thiserror::Error;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("key file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The key file exists but does not hold a valid base64-encoded 256-bit
    /// key. This is a configuration error, not a condition to retry.
    #[error("key file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// Loads the symmetric key from its file, creating it exactly once.
///
/// The loaded key is cached for the lifetime of the manager; concurrent first
/// calls are serialized so only one generates. Across processes, file
/// creation uses `create_new` so two racing services against the same key
/// location converge on whichever key lands first.
pub struct KeyManager {
    path: PathBuf,
    key: OnceLock<[u8; KEY_LEN]>,
    init: Mutex<()>,
}

impl KeyManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            key: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// Return the key, loading or generating it on first use.
    pub fn obtain_key(&self) -> Result<&[u8; KEY_LEN], KeyError> {
        if let Some(key) = self.key.get() {
            return Ok(key);
        }

        // Single-writer guarantee for in-process first use. A poisoned guard
        // only means another thread panicked mid-init; the OnceLock is still
        // consistent, so proceed.
        let _guard = self.init.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(key) = self.key.get() {
            return Ok(key);
        }

        let key = load_or_create(&self.path)?;
        Ok(self.key.get_or_init(|| key))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load_or_create(path: &Path) -> Result<[u8; KEY_LEN], KeyError> {
    match std::fs::read_to_string(path) {
        Ok(encoded) => decode_key(path, &encoded),
        Err(e) if e.kind() == ErrorKind::NotFound => generate_and_save(path),
        Err(e) => Err(KeyError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn decode_key(path: &Path, encoded: &str) -> Result<[u8; KEY_LEN], KeyError> {
    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|e| KeyError::Corrupt {
            path: path.to_path_buf(),
            reason: format!("invalid base64: {e}"),
        })?;
    decoded.try_into().map_err(|bytes: Vec<u8>| KeyError::Corrupt {
        path: path.to_path_buf(),
        reason: format!("expected {KEY_LEN} key bytes, found {}", bytes.len()),
    })
}

fn generate_and_save(path: &Path) -> Result<[u8; KEY_LEN], KeyError> {
    let mut key = [0u8; KEY_LEN];
    OsRng.fill_bytes(&mut key);

    // create_new makes the cross-process race well-defined: exactly one
    // writer wins, everyone else loads the winner's key.
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
    {
        Ok(mut file) => {
            file.write_all(STANDARD.encode(key).as_bytes())
                .map_err(|e| KeyError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            tracing::info!(path = %path.display(), "generated new encryption key");
            Ok(key)
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            // Another process created the file between our read and write.
            let encoded = std::fs::read_to_string(path).map_err(|e| KeyError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
            decode_key(path, &encoded)
        }
        Err(e) => Err(KeyError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
