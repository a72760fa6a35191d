//! Decoding of method calls into validated commands.

use malbrose_core::SecretString;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::credential::Credential;
use crate::protocol::Method;

pub(crate) const ARGS_NOT_A_MAP: &str = "Arguments must be a map";
pub(crate) const KEY_NOT_STRING: &str = "Key parameter not found or not a string";
pub(crate) const PARAMS_NOT_STRINGS: &str = "Required parameters not found or not strings";

/// A request whose method is known and whose arguments have been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    GetEncryptionKey,
    SetEncryptionKey { key: SecretString },
    SetCredential(Credential),
    GetCredential { key: String },
    DeleteCredential { key: String },
}

/// Why a call could not be turned into a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("{0}")]
    InvalidArguments(&'static str),
}

impl Command {
    /// Decode `method` and its `arguments`.
    ///
    /// `getEncryptionKey` ignores its arguments. Every other method requires a
    /// map whose required entries are strings; anything else is rejected.
    pub fn decode(method: &str, arguments: Option<&Value>) -> Result<Self, DecodeError> {
        let method = Method::from_name(method)
            .ok_or_else(|| DecodeError::UnknownMethod(method.to_string()))?;

        match method {
            Method::GetEncryptionKey => Ok(Command::GetEncryptionKey),
            Method::SetEncryptionKey => {
                let args = as_map(arguments)?;
                let key = string_arg(args, "key")
                    .ok_or(DecodeError::InvalidArguments(KEY_NOT_STRING))?;
                Ok(Command::SetEncryptionKey {
                    key: SecretString::new(key),
                })
            }
            Method::SetCredential => {
                let args = as_map(arguments)?;
                let (key, value) = match (string_arg(args, "key"), string_arg(args, "value")) {
                    (Some(k), Some(v)) => (k, v),
                    _ => return Err(DecodeError::InvalidArguments(PARAMS_NOT_STRINGS)),
                };
                // A non-string description is treated as absent.
                let description = string_arg(args, "description").unwrap_or_default();
                Ok(Command::SetCredential(
                    Credential::new(key, value).with_description(description),
                ))
            }
            Method::GetCredential => {
                let args = as_map(arguments)?;
                let key = string_arg(args, "key")
                    .ok_or(DecodeError::InvalidArguments(KEY_NOT_STRING))?;
                Ok(Command::GetCredential {
                    key: key.to_string(),
                })
            }
            Method::DeleteCredential => {
                let args = as_map(arguments)?;
                let key = string_arg(args, "key")
                    .ok_or(DecodeError::InvalidArguments(KEY_NOT_STRING))?;
                Ok(Command::DeleteCredential {
                    key: key.to_string(),
                })
            }
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Command::GetEncryptionKey => Method::GetEncryptionKey,
            Command::SetEncryptionKey { .. } => Method::SetEncryptionKey,
            Command::SetCredential(_) => Method::SetCredential,
            Command::GetCredential { .. } => Method::GetCredential,
            Command::DeleteCredential { .. } => Method::DeleteCredential,
        }
    }
}

fn as_map(arguments: Option<&Value>) -> Result<&Map<String, Value>, DecodeError> {
    arguments
        .and_then(Value::as_object)
        .ok_or(DecodeError::InvalidArguments(ARGS_NOT_A_MAP))
}

fn string_arg<'a>(args: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str)
}
