//! Duplicate detection ahead of remediation.
//!
//! When a movie or episode folder already holds more than one video file the
//! library has usually picked up a replacement, so the smallest copy is
//! removed and the error is considered handled.

use std::path::{Path, PathBuf};

/// Extensions counted as video files, compared case-insensitively.
pub const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "mov", "wmv", "flv", "m4v"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Remediation should go ahead.
    Proceed,
    /// Nothing more to do for this file in this run.
    Resolved(Resolution),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Several videos shared the folder; `smallest` was the deletion target.
    Duplicate { smallest: PathBuf, removed: bool },
    /// The reported file no longer exists.
    Missing,
}

pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| VIDEO_EXTENSIONS.iter().any(|v| v.eq_ignore_ascii_case(ext)))
}

/// Check the folder of `path` for duplicate videos.
pub async fn check_duplicates(path: &Path) -> GuardOutcome {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        tracing::debug!("{} no longer exists", path.display());
        return GuardOutcome::Resolved(Resolution::Missing);
    }

    let Some(dir) = path.parent() else {
        return GuardOutcome::Proceed;
    };

    let videos = match list_videos(dir).await {
        Ok(videos) => videos,
        Err(e) => {
            tracing::warn!("Cannot list {}: {}", dir.display(), e);
            return GuardOutcome::Proceed;
        }
    };

    if videos.len() <= 1 {
        return GuardOutcome::Proceed;
    }

    let Some((smallest, size)) = videos
        .into_iter()
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
    else {
        return GuardOutcome::Proceed;
    };

    tracing::info!(
        "Found duplicate videos in {}; deleting smallest {} ({} bytes)",
        dir.display(),
        smallest.display(),
        size
    );
    let removed = match tokio::fs::remove_file(&smallest).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Failed to delete duplicate {}: {}", smallest.display(), e);
            false
        }
    };

    GuardOutcome::Resolved(Resolution::Duplicate { smallest, removed })
}

async fn list_videos(dir: &Path) -> std::io::Result<Vec<(PathBuf, u64)>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut videos = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !is_video_file(&path) {
            continue;
        }
        let metadata = match entry.metadata().await {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => continue,
        };
        videos.push((path, metadata.len()));
    }

    Ok(videos)
}
