//! Scratch files: temporary paths that are removed exactly once.

use crate::core::utils::{random_suffix, SUFFIX_LEN};
use std::path::{Path, PathBuf};

/// What a scratch file holds; used as the file name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScratchKind {
    Track,
    Playlist,
}

impl ScratchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScratchKind::Track => "track",
            ScratchKind::Playlist => "playlist",
        }
    }
}

/// Owning handle of `<dir>/<kind>-<suffix>`.
///
/// The file itself is created by whoever writes to [`ScratchFile::path`].
/// [`ScratchFile::remove`] consumes the handle; a handle dropped without it
/// removes the file synchronously.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    removed: bool,
}

impl ScratchFile {
    /// Picks a fresh random path under `dir`. Nothing is created on disk.
    pub fn new(dir: &Path, kind: ScratchKind) -> Self {
        let name = format!("{}-{}", kind.as_str(), random_suffix(SUFFIX_LEN));
        Self {
            path: dir.join(name),
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the file if it exists. Failures are logged, never returned.
    pub async fn remove(mut self) {
        self.removed = true;
        match fs_err::tokio::remove_file(&self.path).await {
            Ok(()) => log::debug!("Removed scratch file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove scratch file: {}", e),
        }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match fs_err::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed scratch file {} on drop", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove scratch file on drop: {}", e),
        }
    }
}
