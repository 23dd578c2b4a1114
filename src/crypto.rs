//! At-rest encryption for photo payloads.
//!
//! AES-256-CBC with PKCS#7 padding. Every encryption draws a fresh random
//! 16-byte IV and prepends it to the ciphertext, so the stored blob is
//! self-contained: `IV ‖ ciphertext`. Identical plaintexts therefore never
//! produce identical stored bytes.
//!
//! This format carries no authentication tag or MAC — it is
//! confidentiality-only, kept bit-compatible with existing stored payloads.
//! Tampered ciphertext surfaces as a padding error on decrypt, not as a
//! detected forgery.

use crate::keys::{KeyError, KeyManager};
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use rand::rngs::OsRng;
use std::sync::Arc;
use thiserror::Error;

/// IV length in bytes; also the AES block size.
pub const IV_LEN: usize = 16;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error("ciphertext too short: {len} bytes, need at least {IV_LEN} for the IV")]
    InputTooShort { len: usize },
    /// Ciphertext is not block-aligned or unpadding failed — the input is
    /// corrupt or was encrypted under a different key.
    #[error("malformed ciphertext or padding")]
    Malformed,
}

/// Encrypts and decrypts photo payloads under the managed key.
///
/// The key manager is an explicit dependency so key lifecycle stays in one
/// place; the cipher never touches the key file itself.
pub struct Cipher {
    keys: Arc<KeyManager>,
}

impl Cipher {
    pub fn new(keys: Arc<KeyManager>) -> Self {
        Self { keys }
    }

    /// Encrypt `plaintext`, returning `IV ‖ ciphertext`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let key = self.keys.obtain_key()?;

        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let ciphertext =
            Aes256CbcEnc::new(key.into(), &iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let mut out = Vec::with_capacity(IV_LEN + ciphertext.len());
        out.extend_from_slice(&iv);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypt an `IV ‖ ciphertext` blob back into plaintext.
    pub fn decrypt(&self, payload: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if payload.len() < IV_LEN {
            return Err(CryptoError::InputTooShort { len: payload.len() });
        }
        let (iv, ciphertext) = payload.split_at(IV_LEN);
        if ciphertext.is_empty() || ciphertext.len() % IV_LEN != 0 {
            return Err(CryptoError::Malformed);
        }

        let key = self.keys.obtain_key()?;
        Aes256CbcDec::new_from_slices(key, iv)
            .map_err(|_| CryptoError::Malformed)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CryptoError::Malformed)
    }
}
