//! Secure credential bridge for the Malbrose POS runner.
//!
//! The hosted UI layer asks for secrets by method name; the bridge decodes
//! the request into a [`Command`], runs it against a [`Protector`] (the
//! identity-bound encryption transform), a [`CredentialStore`] (the OS
//! generic credential store), and the single-slot key file, and answers with
//! a [`Reply`].

pub mod backend;
pub mod bridge;
pub mod command;
pub mod credential;
pub mod error;
pub mod platform;
pub mod protect;
pub mod protocol;
pub mod slot;
pub mod store;

pub use bridge::SecureStorageBridge;
pub use command::{Command, DecodeError};
pub use credential::Credential;
pub use error::{Result, StorageError};
pub use platform::{default_backends, Backends};
pub use protect::{KeyProtector, Protector};
pub use protocol::{ErrorCode, Method, MethodCall, Reply};
pub use slot::SlotFile;
pub use store::{CredentialStore, MemoryCredentialStore};
