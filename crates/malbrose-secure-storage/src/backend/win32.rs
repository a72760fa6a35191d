//! Windows DPAPI and Credential Manager backends.
//!
//! - [`DpapiProtector`]: `CryptProtectData` / `CryptUnprotectData`, bound to
//!   the current user's logon credentials.
//! - [`WindowsCredentialStore`]: generic credentials via `CredWriteW` /
//!   `CredReadW` / `CredDeleteW`, persisted at local-machine scope.
//!
//! Buffers handed out by Windows are owned by RAII guards so they are
//! released on every exit path.

use malbrose_core::SecretString;
use tracing::debug;
use windows::core::{PCWSTR, PWSTR};
use windows::Win32::Foundation::{LocalFree, ERROR_NOT_FOUND, HLOCAL};
use windows::Win32::Security::Credentials::{
    CredDeleteW, CredFree, CredReadW, CredWriteW, CREDENTIALW, CRED_PERSIST_LOCAL_MACHINE,
    CRED_TYPE_GENERIC,
};
use windows::Win32::Security::Cryptography::{
    CryptProtectData, CryptUnprotectData, CRYPTPROTECT_UI_FORBIDDEN, CRYPT_INTEGER_BLOB,
};
use zeroize::Zeroizing;

use crate::credential::{validate_key, Credential};
use crate::error::{Result, StorageError};
use crate::protect::Protector;
use crate::store::CredentialStore;

/// Null-terminated UTF-16 copy of `s`.
fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn blob_len(bytes: &[u8]) -> std::result::Result<u32, String> {
    u32::try_from(bytes.len()).map_err(|_| format!("{} bytes is too large", bytes.len()))
}

/// Output blob allocated by DPAPI, freed with `LocalFree`.
struct LocalBlob(CRYPT_INTEGER_BLOB);

impl LocalBlob {
    fn as_slice(&self) -> &[u8] {
        if self.0.pbData.is_null() {
            return &[];
        }
        // SAFETY: DPAPI returned `cbData` initialised bytes at `pbData`.
        unsafe { std::slice::from_raw_parts(self.0.pbData, self.0.cbData as usize) }
    }
}

impl Drop for LocalBlob {
    fn drop(&mut self) {
        if !self.0.pbData.is_null() {
            // SAFETY: `pbData` was allocated by DPAPI with LocalAlloc.
            unsafe {
                let _ = LocalFree(HLOCAL(self.0.pbData.cast()));
            }
        }
    }
}

/// DPAPI protection transform for the current user.
pub struct DpapiProtector {
    description: String,
}

impl DpapiProtector {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

impl Protector for DpapiProtector {
    fn protect(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let input = CRYPT_INTEGER_BLOB {
            cbData: blob_len(plaintext).map_err(StorageError::ProtectFailed)?,
            pbData: plaintext.as_ptr() as *mut u8,
        };
        let description = to_wide(&self.description);
        let mut output = LocalBlob(CRYPT_INTEGER_BLOB::default());

        // SAFETY: `input` borrows `plaintext` for the duration of the call and
        // DPAPI only reads it; `output` receives a LocalAlloc'd buffer.
        unsafe {
            CryptProtectData(
                &input,
                PCWSTR(description.as_ptr()),
                None,
                None,
                None,
                CRYPTPROTECT_UI_FORBIDDEN,
                &mut output.0,
            )
        }
        .map_err(|e| StorageError::ProtectFailed(format!("CryptProtectData failed: {e}")))?;

        let blob = output.as_slice().to_vec();
        if blob.is_empty() {
            return Err(StorageError::ProtectFailed(
                "CryptProtectData returned an empty blob".to_string(),
            ));
        }
        Ok(blob)
    }

    fn unprotect(&self, blob: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let input = CRYPT_INTEGER_BLOB {
            cbData: blob_len(blob).map_err(StorageError::UnprotectFailed)?,
            pbData: blob.as_ptr() as *mut u8,
        };
        let mut output = LocalBlob(CRYPT_INTEGER_BLOB::default());

        // SAFETY: as in `protect`; DPAPI does not write through `input`.
        unsafe {
            CryptUnprotectData(
                &input,
                None,
                None,
                None,
                None,
                CRYPTPROTECT_UI_FORBIDDEN,
                &mut output.0,
            )
        }
        .map_err(|e| StorageError::UnprotectFailed(format!("CryptUnprotectData failed: {e}")))?;

        Ok(Zeroizing::new(output.as_slice().to_vec()))
    }
}

/// Credential returned by `CredReadW`, freed with `CredFree`.
struct CredGuard(*mut CREDENTIALW);

impl Drop for CredGuard {
    fn drop(&mut self) {
        if !self.0.is_null() {
            // SAFETY: the pointer came from CredReadW.
            unsafe { CredFree(self.0 as *const _) };
        }
    }
}

/// Windows Credential Manager, generic credentials.
pub struct WindowsCredentialStore {
    user_name: String,
}

impl WindowsCredentialStore {
    /// `user_name` is recorded on every credential written.
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
        }
    }
}

impl CredentialStore for WindowsCredentialStore {
    fn store(&self, credential: &Credential) -> Result<()> {
        validate_key(&credential.key)?;

        let target = to_wide(&credential.key);
        let user = to_wide(&self.user_name);
        let comment = credential.description.as_deref().map(to_wide);
        let value = credential.value.as_bytes();

        let raw = CREDENTIALW {
            Type: CRED_TYPE_GENERIC,
            TargetName: PWSTR(target.as_ptr() as *mut u16),
            Comment: comment
                .as_ref()
                .map_or(PWSTR::null(), |c| PWSTR(c.as_ptr() as *mut u16)),
            CredentialBlobSize: blob_len(value).map_err(StorageError::Backend)?,
            CredentialBlob: value.as_ptr() as *mut u8,
            Persist: CRED_PERSIST_LOCAL_MACHINE,
            UserName: PWSTR(user.as_ptr() as *mut u16),
            ..Default::default()
        };

        debug!(key = %credential.key, "writing generic credential");
        // SAFETY: every pointer in `raw` borrows a buffer that outlives the call.
        unsafe { CredWriteW(&raw, 0) }
            .map_err(|e| StorageError::Backend(format!("CredWriteW failed: {e}")))
    }

    fn load(&self, key: &str) -> Result<Option<Credential>> {
        validate_key(key)?;

        let target = to_wide(key);
        let mut raw: *mut CREDENTIALW = std::ptr::null_mut();

        // SAFETY: `target` is NUL-terminated; on success `raw` owns a buffer
        // that `CredGuard` frees.
        let read = unsafe { CredReadW(PCWSTR(target.as_ptr()), CRED_TYPE_GENERIC, 0, &mut raw) };
        let guard = CredGuard(raw);
        match read {
            Ok(()) => {}
            Err(e) if e.code() == ERROR_NOT_FOUND.to_hresult() => return Ok(None),
            Err(e) => return Err(StorageError::Backend(format!("CredReadW failed: {e}"))),
        }
        if guard.0.is_null() {
            return Ok(None);
        }

        // SAFETY: CredReadW succeeded, so `guard.0` points to a valid CREDENTIALW.
        let cred = unsafe { &*guard.0 };
        let bytes = if cred.CredentialBlob.is_null() || cred.CredentialBlobSize == 0 {
            Zeroizing::new(Vec::new())
        } else {
            // SAFETY: the blob holds `CredentialBlobSize` bytes.
            Zeroizing::new(unsafe {
                std::slice::from_raw_parts(cred.CredentialBlob, cred.CredentialBlobSize as usize)
                    .to_vec()
            })
        };
        let description = if cred.Comment.is_null() {
            None
        } else {
            // SAFETY: non-null Comment is a NUL-terminated UTF-16 string.
            unsafe { cred.Comment.to_string() }.ok()
        };

        let value = SecretString::from_utf8(bytes).map_err(|e| {
            StorageError::Backend(format!("credential blob is not valid UTF-8: {e}"))
        })?;

        Ok(Some(Credential {
            key: key.to_string(),
            value,
            description: description.filter(|d| !d.is_empty()),
        }))
    }

    fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;

        let target = to_wide(key);
        // SAFETY: `target` is NUL-terminated and outlives the call.
        match unsafe { CredDeleteW(PCWSTR(target.as_ptr()), CRED_TYPE_GENERIC, 0) } {
            Ok(()) => Ok(()),
            Err(e) if e.code() == ERROR_NOT_FOUND.to_hresult() => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(StorageError::Backend(format!("CredDeleteW failed: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_wide_is_nul_terminated() {
        assert_eq!(to_wide("ab"), vec![b'a' as u16, b'b' as u16, 0]);
        assert_eq!(to_wide(""), vec![0]);
    }

    #[test]
    fn test_dpapi_round_trip() {
        let protector = DpapiProtector::new("MalbrosePOS_EncryptionKey");
        let blob = protector.protect(b"dpapi secret").unwrap();
        assert_ne!(blob.as_slice(), b"dpapi secret");
        let plain = protector.unprotect(&blob).unwrap();
        assert_eq!(plain.as_slice(), b"dpapi secret");
    }

    #[test]
    fn test_dpapi_rejects_garbage() {
        let protector = DpapiProtector::new("MalbrosePOS_EncryptionKey");
        assert!(protector.unprotect(b"definitely not a dpapi blob").is_err());
    }
}
