//! Per-platform backend selection.
//!
//! This is the only place outside [`crate::backend`] that knows which OS it
//! is running on.

use malbrose_core::Config;

use crate::protect::Protector;
use crate::store::CredentialStore;

/// The protector and credential store the bridge runs against.
pub struct Backends {
    pub protector: Box<dyn Protector>,
    pub credentials: Box<dyn CredentialStore>,
}

/// Name of the backend pair [`default_backends`] selects.
pub fn platform_name() -> &'static str {
    if cfg!(windows) {
        "windows (DPAPI + Credential Manager)"
    } else {
        "keyring (AES-256-GCM + OS keyring)"
    }
}

/// Build the OS-native backends for the current target.
#[cfg(windows)]
pub fn default_backends(config: &Config) -> Backends {
    use crate::backend::win32::{DpapiProtector, WindowsCredentialStore};

    Backends {
        protector: Box::new(DpapiProtector::new(
            config.storage.protection_description.clone(),
        )),
        credentials: Box::new(WindowsCredentialStore::new(config.app.namespace.clone())),
    }
}

/// Build the OS-native backends for the current target.
#[cfg(not(windows))]
pub fn default_backends(config: &Config) -> Backends {
    use crate::backend::keychain::{KeyringCredentialStore, KeyringProtector};

    Backends {
        protector: Box::new(KeyringProtector::new(config.app.namespace.clone())),
        credentials: Box::new(KeyringCredentialStore::new(config.app.namespace.clone())),
    }
}
