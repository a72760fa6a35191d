//! DLL search path for the runner process.
//!
//! Native plugins and their runtime dependencies ship next to the
//! executable and in a few well-known sub-directories (`ucrt`). The search
//! path is computed once at startup and installed before any plugin loads.

use std::path::{Path, PathBuf};

use anyhow::Context;
use malbrose_core::config::LoaderConfig;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DllSearchPath {
    app_dir: PathBuf,
    search_paths: Vec<PathBuf>,
}

impl DllSearchPath {
    /// Compute the search path for an executable at `exe_path`.
    ///
    /// Only sub-directories that exist are kept, in the order given.
    pub fn resolve(exe_path: &Path, subdirs: &[String]) -> anyhow::Result<Self> {
        let app_dir = exe_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .with_context(|| format!("Executable path has no parent: {}", exe_path.display()))?
            .to_path_buf();

        let search_paths = subdirs
            .iter()
            .map(|sub| app_dir.join(sub))
            .filter(|dir| dir.is_dir())
            .collect();

        Ok(Self {
            app_dir,
            search_paths,
        })
    }

    pub fn from_current_exe(config: &LoaderConfig) -> anyhow::Result<Self> {
        let exe = std::env::current_exe().context("Failed to locate the running executable")?;
        Self::resolve(&exe, &config.search_subdirs)
    }

    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    /// Extra directories searched after the app dir.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// First existing file called `name`, app dir first.
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        std::iter::once(&self.app_dir)
            .chain(&self.search_paths)
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    /// Make the process loader search these directories.
    pub fn install(&self) -> anyhow::Result<()> {
        install_search_path(self)?;
        debug!(
            app_dir = %self.app_dir.display(),
            extra = self.search_paths.len(),
            "DLL search path installed"
        );
        Ok(())
    }
}

#[cfg(windows)]
fn install_search_path(path: &DllSearchPath) -> anyhow::Result<()> {
    use std::os::windows::ffi::OsStrExt;
    use tracing::warn;
    use windows::core::PCWSTR;
    use windows::Win32::System::LibraryLoader::{
        AddDllDirectory, SetDefaultDllDirectories, SetDllDirectoryW,
        LOAD_LIBRARY_SEARCH_DEFAULT_DIRS, LOAD_LIBRARY_SEARCH_USER_DIRS,
    };

    fn wide(dir: &Path) -> Vec<u16> {
        dir.as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect()
    }

    let app_dir = wide(&path.app_dir);
    unsafe { SetDllDirectoryW(PCWSTR(app_dir.as_ptr())) }
        .context("SetDllDirectoryW failed")?;
    unsafe {
        SetDefaultDllDirectories(LOAD_LIBRARY_SEARCH_DEFAULT_DIRS | LOAD_LIBRARY_SEARCH_USER_DIRS)
    }
    .context("SetDefaultDllDirectories failed")?;

    for dir in std::iter::once(&path.app_dir).chain(&path.search_paths) {
        let w = wide(dir);
        let cookie = unsafe { AddDllDirectory(PCWSTR(w.as_ptr())) };
        if cookie.is_null() {
            warn!(dir = %dir.display(), "AddDllDirectory failed");
        }
    }
    Ok(())
}

#[cfg(not(windows))]
fn install_search_path(path: &DllSearchPath) -> anyhow::Result<()> {
    tracing::info!(
        app_dir = %path.app_dir.display(),
        "DLL search path is Windows-only, leaving loader defaults"
    );
    Ok(())
}
