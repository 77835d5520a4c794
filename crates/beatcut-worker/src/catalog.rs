//! Source asset discovery and probing.

use std::path::{Path, PathBuf};

use beatcut_media::{MediaBackend, VideoInfo};

use crate::error::{RenderError, RenderResult};
use crate::logging::RenderLogger;
use crate::retry::{retry_async, RetryConfig};

/// File extensions treated as video sources (case-insensitive).
pub const SOURCE_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv"];

/// A probed source file, before normalization.
#[derive(Debug, Clone)]
pub struct SourceAsset {
    pub path: PathBuf,
    pub info: VideoInfo,
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            SOURCE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(e))
        })
        .unwrap_or(false)
}

/// List video files directly inside `dir`, sorted by path.
///
/// No tool is touched here, so a bad directory fails fast.
pub async fn discover_assets(dir: &Path) -> RenderResult<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        RenderError::config(format!("Cannot read asset directory {}: {}", dir.display(), e))
    })?;

    let mut found = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && is_source_file(&path) {
            found.push(path);
        }
    }
    found.sort();

    if found.is_empty() {
        return Err(RenderError::config(format!(
            "No video assets ({}) found in {}",
            SOURCE_EXTENSIONS.join(", "),
            dir.display()
        )));
    }
    Ok(found)
}

/// Probe every discovered file, skipping the ones that cannot be used.
///
/// A missing probe tool aborts the job; an unreadable or empty file is
/// logged and left out. At least one usable source is required.
pub async fn catalog_sources(
    backend: &dyn MediaBackend,
    paths: &[PathBuf],
    retry: &RetryConfig,
    logger: &RenderLogger,
) -> RenderResult<Vec<SourceAsset>> {
    let mut sources = Vec::with_capacity(paths.len());

    for path in paths {
        let probed = retry_async(retry, |e: &beatcut_media::MediaError| e.is_transient(), || {
            backend.probe(path)
        })
        .await;

        match probed {
            Ok(info) if info.duration.is_finite() && info.duration > 0.0 => {
                sources.push(SourceAsset {
                    path: path.clone(),
                    info,
                });
            }
            Ok(_) => logger.warning(
                "catalog",
                &format!("Skipping {}: zero duration", path.display()),
            ),
            Err(e) if e.is_tool_missing() => return Err(RenderError::tool("probe", e)),
            Err(e) => logger.warning(
                "catalog",
                &format!("Skipping {}: {}", path.display(), e),
            ),
        }
    }

    if sources.is_empty() {
        return Err(RenderError::config("No usable video assets after probing"));
    }

    logger.stage(
        "catalog",
        &format!("{} of {} source files usable", sources.len(), paths.len()),
    );
    Ok(sources)
}
