//! Identity-bound protection transforms.
//!
//! A [`Protector`] turns plaintext into an opaque blob that only the same
//! user/machine context can turn back. On Windows this is DPAPI; elsewhere
//! it is [`KeyProtector`] keyed from the OS keyring.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{Result, StorageError};

/// Reversible, identity-bound encryption.
///
/// `unprotect(protect(x)) == x` within one context. Blobs from another
/// context, or corrupted blobs, must fail rather than decode to garbage.
pub trait Protector: Send + Sync {
    fn protect(&self, plaintext: &[u8]) -> Result<Vec<u8>>;

    fn unprotect(&self, blob: &[u8]) -> Result<Zeroizing<Vec<u8>>>;
}

const NONCE_SIZE: usize = 12;
const SALT_SIZE: usize = 32;
const TAG_SIZE: usize = 16;

/// Length of a master key in bytes.
pub const KEY_SIZE: usize = 32;

/// HKDF info string used to domain-separate derived keys.
const HKDF_INFO: &[u8] = b"malbrose-secure-storage-v1";

/// AES-256-GCM with a per-blob key derived from a master key via HKDF-SHA256.
///
/// Blob layout: `salt (32) || nonce (12) || ciphertext || tag (16)`.
pub struct KeyProtector {
    master_key: Zeroizing<Vec<u8>>,
}

impl KeyProtector {
    /// Wrap an existing 256-bit master key.
    pub fn new(master_key: Vec<u8>) -> Result<Self> {
        let master_key = Zeroizing::new(master_key);
        if master_key.len() != KEY_SIZE {
            return Err(StorageError::ProtectFailed(format!(
                "master key must be {KEY_SIZE} bytes, got {}",
                master_key.len()
            )));
        }
        Ok(Self { master_key })
    }

    /// Protector with a fresh random master key.
    pub fn generate() -> Self {
        Self {
            master_key: generate_master_key(),
        }
    }

    fn cipher(&self, salt: &[u8]) -> std::result::Result<Aes256Gcm, String> {
        let hk = Hkdf::<Sha256>::new(Some(salt), &self.master_key);
        let mut okm = Zeroizing::new([0u8; KEY_SIZE]);
        hk.expand(HKDF_INFO, &mut okm[..])
            .map_err(|e| format!("key derivation failed: {e}"))?;
        Aes256Gcm::new_from_slice(&okm[..]).map_err(|e| e.to_string())
    }
}

impl Protector for KeyProtector {
    fn protect(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut salt = [0u8; SALT_SIZE];
        rand::thread_rng().fill_bytes(&mut salt);

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);

        let cipher = self.cipher(&salt).map_err(StorageError::ProtectFailed)?;
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|e| StorageError::ProtectFailed(e.to_string()))?;

        let mut blob = Vec::with_capacity(SALT_SIZE + NONCE_SIZE + ciphertext.len());
        blob.extend_from_slice(&salt);
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    fn unprotect(&self, blob: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        if blob.len() < SALT_SIZE + NONCE_SIZE + TAG_SIZE {
            return Err(StorageError::UnprotectFailed(
                "blob too short".to_string(),
            ));
        }

        let (salt, rest) = blob.split_at(SALT_SIZE);
        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_SIZE);

        let cipher = self.cipher(salt).map_err(StorageError::UnprotectFailed)?;
        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map(Zeroizing::new)
            .map_err(|e| StorageError::UnprotectFailed(e.to_string()))
    }
}

/// Generate a new random 256-bit master key.
pub fn generate_master_key() -> Zeroizing<Vec<u8>> {
    let mut key = Zeroizing::new(vec![0u8; KEY_SIZE]);
    rand::thread_rng().fill_bytes(&mut key);
    key
}
