//! OS-backed protectors and credential stores.
//!
//! Only the implementations for the current target are compiled. Callers
//! should go through [`crate::platform::default_backends`] rather than
//! naming these types directly.

#[cfg(windows)]
pub mod win32;

#[cfg(not(windows))]
pub mod keychain;
