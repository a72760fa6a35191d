//! The secure storage bridge: one dispatch function from [`Command`] to [`Reply`].
//!
//! Every backend failure is logged and folded into one of the protocol's
//! named error codes. Nothing here retries or panics.

use malbrose_core::{Config, SecretString};
use tracing::{debug, warn};

use crate::command::{Command, DecodeError};
use crate::credential::Credential;
use crate::error::{Result, StorageError};
use crate::platform::{default_backends, Backends};
use crate::protect::Protector;
use crate::protocol::{ErrorCode, MethodCall, Reply};
use crate::slot::SlotFile;
use crate::store::CredentialStore;

const KEY_NOT_FOUND: &str = "Encryption key not found";
const KEY_SAVE_FAILED: &str = "Failed to save encryption key";
const CRED_SAVE_FAILED: &str = "Failed to save credential";
const CRED_NOT_FOUND: &str = "Credential not found";
const CRED_DELETE_FAILED: &str = "Failed to delete credential";

/// Translates requests into protector, credential store, and slot file calls.
pub struct SecureStorageBridge {
    protector: Box<dyn Protector>,
    credentials: Box<dyn CredentialStore>,
    slot: SlotFile,
}

impl SecureStorageBridge {
    pub fn new(
        protector: Box<dyn Protector>,
        credentials: Box<dyn CredentialStore>,
        slot: SlotFile,
    ) -> Self {
        Self {
            protector,
            credentials,
            slot,
        }
    }

    /// Bridge over the OS-native backends, with the slot file at the
    /// configured location.
    pub fn from_config(config: &Config) -> Result<Self> {
        let Backends {
            protector,
            credentials,
        } = default_backends(config);
        let slot = SlotFile::new(config.slot_path()?);
        Ok(Self::new(protector, credentials, slot))
    }

    pub fn slot(&self) -> &SlotFile {
        &self.slot
    }

    /// Decode and run one call.
    pub fn handle(&self, call: &MethodCall) -> Reply {
        match Command::decode(&call.method, call.arguments.as_ref()) {
            Ok(command) => self.dispatch(command),
            Err(DecodeError::UnknownMethod(method)) => {
                debug!(%method, "method not implemented");
                Reply::NotImplemented
            }
            Err(DecodeError::InvalidArguments(message)) => {
                debug!(method = %call.method, message, "invalid arguments");
                Reply::error(ErrorCode::InvalidArguments, message)
            }
        }
    }

    /// Run a decoded command to completion.
    pub fn dispatch(&self, command: Command) -> Reply {
        let method = command.method();
        debug!(%method, "dispatching");

        match command {
            Command::GetEncryptionKey => match self.get_encryption_key() {
                Ok(key) => Reply::value(key),
                Err(e) => {
                    log_failure(method.as_str(), &e);
                    Reply::error(ErrorCode::NotFound, KEY_NOT_FOUND)
                }
            },
            Command::SetEncryptionKey { key } => match self.set_encryption_key(&key) {
                Ok(()) => Reply::ok(),
                Err(e) => {
                    log_failure(method.as_str(), &e);
                    Reply::error(ErrorCode::SaveFailed, KEY_SAVE_FAILED)
                }
            },
            Command::SetCredential(credential) => match self.credentials.store(&credential) {
                Ok(()) => Reply::ok(),
                Err(e) => {
                    log_failure(method.as_str(), &e);
                    Reply::error(ErrorCode::CredSaveFailed, CRED_SAVE_FAILED)
                }
            },
            Command::GetCredential { key } => match self.get_credential(&key) {
                Ok(value) => Reply::value(value),
                Err(e) => {
                    log_failure(method.as_str(), &e);
                    Reply::error(ErrorCode::NotFound, CRED_NOT_FOUND)
                }
            },
            Command::DeleteCredential { key } => match self.credentials.delete(&key) {
                Ok(()) => Reply::ok(),
                Err(e) => {
                    log_failure(method.as_str(), &e);
                    Reply::error(ErrorCode::DeleteFailed, CRED_DELETE_FAILED)
                }
            },
        }
    }

    fn get_encryption_key(&self) -> Result<SecretString> {
        let blob = self
            .slot
            .read()?
            .ok_or_else(|| StorageError::NotFound(self.slot.path().display().to_string()))?;
        let plaintext = self.protector.unprotect(&blob)?;
        let key = SecretString::from_utf8(plaintext)
            .map_err(|e| StorageError::UnprotectFailed(format!("decrypted key is not UTF-8: {e}")))?;
        if key.is_empty() {
            return Err(StorageError::NotFound("encryption key is empty".to_string()));
        }
        Ok(key)
    }

    fn set_encryption_key(&self, key: &SecretString) -> Result<()> {
        let blob = self.protector.protect(key.as_bytes())?;
        if blob.is_empty() {
            return Err(StorageError::ProtectFailed(
                "protection produced an empty blob".to_string(),
            ));
        }
        self.slot.write(&blob)
    }

    fn get_credential(&self, key: &str) -> Result<SecretString> {
        match self.credentials.load(key)? {
            Some(Credential { value, .. }) if !value.is_empty() => Ok(value),
            _ => Err(StorageError::NotFound(key.to_string())),
        }
    }
}

fn log_failure(method: &str, error: &StorageError) {
    match error {
        StorageError::NotFound(what) => debug!(method, %what, "not found"),
        other => warn!(method, error = %other, "secure storage operation failed"),
    }
}
