//! The logical secret held in the generic credential store.

use malbrose_core::SecretString;

use crate::error::{Result, StorageError};

/// Longest target name the Windows generic credential store accepts, in
/// UTF-16 code units.
pub const MAX_KEY_LEN: usize = 32767;

/// A `(key, value, description)` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Application-chosen identifier, used verbatim as the store target name.
    pub key: String,

    /// Opaque secret text.
    pub value: SecretString,

    /// Optional human-readable comment stored next to the value.
    pub description: Option<String>,
}

impl Credential {
    pub fn new(key: impl Into<String>, value: impl Into<SecretString>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            description: None,
        }
    }

    /// Attach a description. Empty descriptions are dropped.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = (!description.is_empty()).then_some(description);
        self
    }
}

/// Reject keys no backend can address.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey(
            "key must not be empty".to_string(),
        ));
    }
    if key.encode_utf16().count() > MAX_KEY_LEN {
        return Err(StorageError::InvalidKey(format!(
            "key exceeds maximum length of {MAX_KEY_LEN} UTF-16 units"
        )));
    }
    if key.contains('\0') {
        return Err(StorageError::InvalidKey(
            "key must not contain NUL characters".to_string(),
        ));
    }
    Ok(())
}
