//! The single-slot encryption key file.
//!
//! The file holds exactly one protected blob with no header or framing.
//! Writes go to a temporary file in the same directory which is then
//! renamed over the target, so readers see either the old blob or the new
//! one and never a partial write.

use std::io::Write;
use std::path::{Path, PathBuf};

use malbrose_core::paths;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::Result;

/// A fixed-path file holding the latest protected blob.
#[derive(Debug, Clone)]
pub struct SlotFile {
    path: PathBuf,
}

impl SlotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the stored blob. A missing file is `Ok(None)`.
    pub fn read(&self) -> Result<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomically replace the slot contents with `blob`.
    ///
    /// The parent directory is created if absent.
    pub fn write(&self, blob: &[u8]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        paths::ensure_dir(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(blob)?;
        tmp.as_file().sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }

        tmp.persist(&self.path).map_err(|e| e.error)?;
        debug!(path = %self.path.display(), bytes = blob.len(), "slot file replaced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_missing() {
        let tmp = TempDir::new().unwrap();
        let slot = SlotFile::new(tmp.path().join("secure_storage.bin"));
        assert!(!slot.exists());
        assert!(slot.read().unwrap().is_none());
    }

    #[test]
    fn test_write_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let slot = SlotFile::new(tmp.path().join("MalbrosePOS").join("secure_storage.bin"));
        slot.write(b"\x01\x02\x03").unwrap();
        assert_eq!(slot.read().unwrap().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_overwrite_replaces_contents() {
        let tmp = TempDir::new().unwrap();
        let slot = SlotFile::new(tmp.path().join("secure_storage.bin"));
        slot.write(b"a much longer first blob").unwrap();
        slot.write(b"short").unwrap();
        assert_eq!(slot.read().unwrap().unwrap(), b"short".to_vec());
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let slot = SlotFile::new(tmp.path().join("secure_storage.bin"));
        slot.write(b"one").unwrap();
        slot.write(b"two").unwrap();

        let names: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("secure_storage.bin")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let slot = SlotFile::new(tmp.path().join("secure_storage.bin"));
        slot.write(b"blob").unwrap();

        let mode = std::fs::metadata(slot.path()).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "slot file should have 0600 permissions");
    }
}
