//! Filesystem helpers for publishing finished artifacts.
//!
//! The target path must only ever hold a complete file: either whatever was
//! there before, or the new artifact in full.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Move `src` onto `dst`, replacing it atomically.
///
/// A plain rename is atomic when both paths share a filesystem. Across
/// filesystems (EXDEV) the file is first copied to a hidden sibling of
/// `dst` and that sibling is renamed into place, so a half-copied file is
/// never visible under `dst`.
pub async fn replace_atomically(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            tracing::debug!(
                "Cross-device publish, staging next to target: {} -> {}",
                src.display(),
                dst.display()
            );
            publish_via_staging(src, dst).await
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

/// EXDEV is errno 18 on Linux and macOS.
fn is_cross_device_error(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(18)
}

/// Hidden sibling of `dst` used while copying across filesystems.
fn staging_path(dst: &Path) -> PathBuf {
    let name = dst
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    dst.with_file_name(format!(".{}.partial", name))
}

async fn publish_via_staging(src: &Path, dst: &Path) -> MediaResult<()> {
    let staged = staging_path(dst);

    if let Err(e) = fs::copy(src, &staged).await {
        let _ = fs::remove_file(&staged).await;
        return Err(e.into());
    }

    if let Err(e) = fs::rename(&staged, dst).await {
        let _ = fs::remove_file(&staged).await;
        return Err(e.into());
    }

    if let Err(e) = fs::remove_file(src).await {
        tracing::warn!("Failed to remove staged source {}: {}", src.display(), e);
    }

    Ok(())
}
