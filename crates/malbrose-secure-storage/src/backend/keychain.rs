//! OS keyring integration for non-Windows targets.
//!
//! The `keyring` crate maps to the platform secret store: the macOS
//! Keychain, or on Linux the Secret Service with the kernel keyring as a
//! cache in front of it. Both survive a reboot. Two things live there:
//!
//! - one entry per credential, under the app namespace service, whose secret
//!   is a small JSON envelope carrying the value and optional description;
//! - the master key for [`KeyringProtector`], hex-encoded, created on first use.

use malbrose_core::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::credential::{validate_key, Credential};
use crate::error::{Result, StorageError};
use crate::protect::{generate_master_key, KeyProtector, Protector};
use crate::store::CredentialStore;

/// Keyring account holding the protection master key.
const MASTER_KEY_ACCOUNT: &str = "protection_master_key";

fn entry(service: &str, account: &str) -> Result<keyring::Entry> {
    keyring::Entry::new(service, account).map_err(|e| StorageError::Backend(e.to_string()))
}

/// [`Protector`] whose master key lives in the OS keyring.
///
/// The key is read on every call so nothing secret outlives the request.
pub struct KeyringProtector {
    service: String,
}

impl KeyringProtector {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn load_master_key(&self) -> Result<Option<KeyProtector>> {
        match entry(&self.service, MASTER_KEY_ACCOUNT)?.get_secret() {
            Ok(stored) => decode_master_key(&Zeroizing::new(stored)).map(Some),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StorageError::Backend(format!("keyring read failed: {e}"))),
        }
    }

    fn load_or_create_master_key(&self) -> Result<KeyProtector> {
        if let Some(protector) = self.load_master_key()? {
            return Ok(protector);
        }

        debug!(service = %self.service, "generating protection master key");
        let key = generate_master_key();
        entry(&self.service, MASTER_KEY_ACCOUNT)?
            .set_secret(encode_master_key(&key).as_bytes())
            .map_err(|e| StorageError::Backend(format!("keyring write failed: {e}")))?;
        KeyProtector::new(key.to_vec())
    }
}

fn encode_master_key(key: &[u8]) -> Zeroizing<String> {
    Zeroizing::new(hex::encode(key))
}

fn decode_master_key(stored: &[u8]) -> Result<KeyProtector> {
    let hex_str = std::str::from_utf8(stored).map_err(|e| {
        StorageError::Backend(format!("keyring master key is not valid UTF-8: {e}"))
    })?;
    let key = Zeroizing::new(hex::decode(hex_str.trim()).map_err(|e| {
        StorageError::Backend(format!("keyring master key is not valid hex: {e}"))
    })?);
    KeyProtector::new(key.to_vec())
}

impl Protector for KeyringProtector {
    fn protect(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let protector = self
            .load_or_create_master_key()
            .map_err(|e| StorageError::ProtectFailed(e.to_string()))?;
        protector.protect(plaintext)
    }

    fn unprotect(&self, blob: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        // Without a master key nothing this context protected can exist.
        match self.load_master_key() {
            Ok(Some(protector)) => protector.unprotect(blob),
            Ok(None) => Err(StorageError::UnprotectFailed(
                "no protection master key in keyring".to_string(),
            )),
            Err(e) => Err(StorageError::UnprotectFailed(e.to_string())),
        }
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    value: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Deserialize)]
struct Envelope {
    value: SecretString,
    #[serde(default)]
    description: Option<String>,
}

/// [`CredentialStore`] over the OS keyring.
pub struct KeyringCredentialStore {
    service: String,
}

impl KeyringCredentialStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

fn encode_envelope(credential: &Credential) -> Result<Zeroizing<Vec<u8>>> {
    let envelope = EnvelopeRef {
        value: credential.value.expose_secret(),
        description: credential.description.as_deref(),
    };
    Ok(Zeroizing::new(serde_json::to_vec(&envelope)?))
}

/// Entries written by something else hold the raw secret; take it as the value.
fn decode_envelope(key: &str, stored: Zeroizing<Vec<u8>>) -> Result<Credential> {
    match serde_json::from_slice::<Envelope>(&stored) {
        Ok(envelope) => Ok(Credential {
            key: key.to_string(),
            value: envelope.value,
            description: envelope.description,
        }),
        Err(_) => {
            warn!(key, "keyring entry is not an envelope, using raw secret");
            let value = SecretString::from_utf8(stored).map_err(|e| {
                StorageError::Backend(format!("keyring secret is not valid UTF-8: {e}"))
            })?;
            Ok(Credential::new(key, value))
        }
    }
}

fn delete_error(key: &str, error: keyring::Error) -> StorageError {
    match error {
        keyring::Error::NoEntry => StorageError::NotFound(key.to_string()),
        e => StorageError::Backend(e.to_string()),
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn store(&self, credential: &Credential) -> Result<()> {
        validate_key(&credential.key)?;
        let envelope = encode_envelope(credential)?;

        debug!(key = %credential.key, service = %self.service, "writing keyring credential");
        entry(&self.service, &credential.key)?
            .set_secret(&envelope)
            .map_err(|e| StorageError::Backend(e.to_string()))
    }

    fn load(&self, key: &str) -> Result<Option<Credential>> {
        validate_key(key)?;
        match entry(&self.service, key)?.get_secret() {
            Ok(bytes) => decode_envelope(key, Zeroizing::new(bytes)).map(Some),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StorageError::Backend(e.to_string())),
        }
    }

    fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        entry(&self.service, key)?
            .delete_credential()
            .map_err(|e| delete_error(key, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_roundtrip() {
        let cred = Credential::new("till-7", "1234").with_description("Till PIN");
        let stored = encode_envelope(&cred).unwrap();
        let text = std::str::from_utf8(&stored).unwrap();
        assert!(text.contains("\"description\":\"Till PIN\""));

        let decoded = decode_envelope("till-7", stored).unwrap();
        assert_eq!(decoded, cred);
    }

    #[test]
    fn test_envelope_omits_missing_description() {
        let cred = Credential::new("till-7", "1234");
        let stored = encode_envelope(&cred).unwrap();
        assert_eq!(&stored[..], br#"{"value":"1234"}"#);
        assert_eq!(decode_envelope("till-7", stored).unwrap().description, None);
    }

    #[test]
    fn test_raw_secret_is_taken_as_value() {
        let stored = Zeroizing::new(b"plain-password".to_vec());
        let decoded = decode_envelope("legacy", stored).unwrap();
        assert_eq!(decoded.key, "legacy");
        assert_eq!(decoded.value.expose_secret(), "plain-password");
        assert!(decoded.description.is_none());
    }

    #[test]
    fn test_raw_secret_must_be_utf8() {
        let stored = Zeroizing::new(vec![0xff, 0xfe, 0x00]);
        assert!(matches!(
            decode_envelope("legacy", stored),
            Err(StorageError::Backend(_))
        ));
    }

    #[test]
    fn test_master_key_roundtrip() {
        let key = generate_master_key();
        let encoded = encode_master_key(&key);
        assert_eq!(encoded.len(), key.len() * 2);

        let restored = decode_master_key(encoded.as_bytes()).unwrap();
        let original = KeyProtector::new(key.to_vec()).unwrap();
        let blob = original.protect(b"db-key").unwrap();
        assert_eq!(&restored.unprotect(&blob).unwrap()[..], b"db-key");
    }

    #[test]
    fn test_master_key_tolerates_trailing_newline() {
        let encoded = format!("{}\n", hex::encode([3u8; 32]));
        assert!(decode_master_key(encoded.as_bytes()).is_ok());
    }

    #[test]
    fn test_master_key_rejects_bad_hex() {
        assert!(matches!(
            decode_master_key(b"not-hex-at-all"),
            Err(StorageError::Backend(_))
        ));
    }

    #[test]
    fn test_master_key_rejects_wrong_length() {
        let short = hex::encode([1u8; 16]);
        assert!(decode_master_key(short.as_bytes()).is_err());
    }

    #[test]
    fn test_delete_missing_entry_is_not_found() {
        assert!(matches!(
            delete_error("till-7", keyring::Error::NoEntry),
            StorageError::NotFound(key) if key == "till-7"
        ));
        assert!(matches!(
            delete_error("till-7", keyring::Error::NoStorageAccess("locked".into())),
            StorageError::Backend(_)
        ));
    }
}
