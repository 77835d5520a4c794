//! Per-job scratch space.
//!
//! Everything a render produces on the way to the output (canonical assets,
//! clips, intermediate joins) lives under one directory that is removed when
//! the job ends, whether it succeeded or not.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

/// Scoped scratch directory for one render job.
///
/// Removal happens on drop; `close` does the same but reports failures.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create a fresh directory under `parent`.
    pub fn create(parent: &Path, job_id: &str) -> std::io::Result<Self> {
        std::fs::create_dir_all(parent)?;
        let short_id: String = job_id.chars().take(8).collect();
        let dir = tempfile::Builder::new()
            .prefix(&format!("beatcut-{}-", short_id))
            .tempdir_in(parent)?;
        debug!("Created scratch directory {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Canonical (normalized) form of source asset `index`.
    pub fn canonical_path(&self, index: usize) -> PathBuf {
        self.path().join(format!("canonical_{:03}.mp4", index))
    }

    /// Trimmed clip for position `index` in the final sequence.
    pub fn clip_path(&self, index: usize) -> PathBuf {
        self.path().join(format!("clip_{:04}.mp4", index))
    }

    /// Intermediate artifact with the given name.
    pub fn intermediate(&self, name: &str) -> PathBuf {
        self.path().join(name)
    }

    /// Remove the directory now.
    pub fn close(self) {
        let path = self.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!("Failed to remove scratch directory {}: {}", path.display(), e);
        } else {
            debug!("Removed scratch directory {}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_removed_on_drop() {
        let parent = tempfile::tempdir().unwrap();
        let path = {
            let scratch = ScratchDir::create(parent.path(), "0123456789abcdef").unwrap();
            std::fs::write(scratch.clip_path(0), b"clip").unwrap();
            assert!(scratch.path().starts_with(parent.path()));
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_close_removes_contents() {
        let parent = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::create(parent.path(), "job").unwrap();
        std::fs::write(scratch.canonical_path(2), b"video").unwrap();
        let path = scratch.path().to_path_buf();
        scratch.close();
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(parent.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_artifact_names() {
        let parent = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::create(parent.path(), "job").unwrap();
        assert!(scratch.clip_path(7).ends_with("clip_0007.mp4"));
        assert!(scratch.canonical_path(12).ends_with("canonical_012.mp4"));
        assert_eq!(scratch.intermediate("joined.mp4").parent(), Some(scratch.path()));
    }
}
