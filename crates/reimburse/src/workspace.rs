//! Per-request scratch directories

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

const PREFIX: &str = "reimburse-";

/// Private directory for one export's intermediate files
///
/// Removed with everything in it when dropped, whether the export finished
/// or bailed out early.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create under `parent`, or the system temp dir when `None`
    pub fn create(parent: Option<&Path>) -> std::io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(PREFIX);
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        debug!(path = %dir.path().display(), "scratch directory created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file named `name` inside the directory
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        debug!(path = %self.dir.path().display(), "removing scratch directory");
    }
}
