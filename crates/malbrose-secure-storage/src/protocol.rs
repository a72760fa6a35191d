//! Request/response types for the secure storage channel.
//!
//! The wire format is one JSON object per line:
//!
//! ```text
//! -> {"id": 7, "method": "getCredential", "arguments": {"key": "db_password"}}
//! <- {"id": 7, "status": "success", "result": "..."}
//! <- {"id": 7, "status": "error", "code": "NOT_FOUND", "message": "Credential not found"}
//! <- {"id": 7, "status": "notImplemented"}
//! ```

use std::fmt;

use malbrose_core::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Methods the bridge understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Method {
    GetEncryptionKey,
    SetEncryptionKey,
    SetCredential,
    GetCredential,
    DeleteCredential,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::GetEncryptionKey,
        Method::SetEncryptionKey,
        Method::SetCredential,
        Method::GetCredential,
        Method::DeleteCredential,
    ];

    /// Wire name of the method.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::GetEncryptionKey => "getEncryptionKey",
            Method::SetEncryptionKey => "setEncryptionKey",
            Method::SetCredential => "setCredential",
            Method::GetCredential => "getCredential",
            Method::DeleteCredential => "deleteCredential",
        }
    }

    /// Look up a method by wire name. Matching is case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named application errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    SaveFailed,
    CredSaveFailed,
    DeleteFailed,
    InvalidArguments,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::SaveFailed => "SAVE_FAILED",
            ErrorCode::CredSaveFailed => "CRED_SAVE_FAILED",
            ErrorCode::DeleteFailed => "DELETE_FAILED",
            ErrorCode::InvalidArguments => "INVALID_ARGUMENTS",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An incoming request.
#[derive(Debug, Clone, Deserialize)]
pub struct MethodCall {
    /// Caller-chosen correlation id, echoed back unchanged.
    #[serde(default)]
    pub id: Option<Value>,

    pub method: String,

    #[serde(default)]
    pub arguments: Option<Value>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Option<Value>) -> Self {
        Self {
            id: None,
            method: method.into(),
            arguments,
        }
    }
}

/// The bridge's answer to one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Completed; carries a text payload for the getters.
    Success(Option<SecretString>),

    /// Failed with a named error.
    Error { code: ErrorCode, message: String },

    /// The method name is not part of the protocol.
    NotImplemented,
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Success(None)
    }

    pub fn value(value: SecretString) -> Self {
        Reply::Success(Some(value))
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Reply::Error {
            code,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Reply::Success(_))
    }

    /// Error code, if this is an error reply.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Reply::Error { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Serialize to a single wire line (without the trailing newline).
    pub fn to_line(&self, id: Option<&Value>) -> serde_json::Result<String> {
        let wire = match self {
            Reply::Success(value) => WireReply::Success {
                id,
                result: value.as_ref().map(SecretString::expose_secret),
            },
            Reply::Error { code, message } => WireReply::Error {
                id,
                code: *code,
                message: message.as_str(),
            },
            Reply::NotImplemented => WireReply::NotImplemented { id },
        };
        serde_json::to_string(&wire)
    }
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
enum WireReply<'a> {
    Success {
        id: Option<&'a Value>,
        result: Option<&'a str>,
    },
    Error {
        id: Option<&'a Value>,
        code: ErrorCode,
        message: &'a str,
    },
    NotImplemented {
        id: Option<&'a Value>,
    },
}
