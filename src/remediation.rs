//! File-level remediation: transcode, repair and delete.
//!
//! Every capability reports success as a plain `bool` so the action tree can
//! branch on it. Tool failures are logged here with the file they concern.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use scenemend_av::{resolve_tool, sibling_output, Encoder, MountPoint};

use crate::config::{Config, RepairStrategy};

/// Suffix of regular transcode outputs.
pub const TRANSCODE_SUFFIX: &str = "_h265";
/// Suffix of stream-copy repair outputs.
pub const REPAIR_SUFFIX: &str = "_repaired";
const OUTPUT_EXTENSION: &str = "mkv";

/// File operations the action executor depends on.
#[async_trait]
pub trait Remediator: Send + Sync {
    /// Re-encode `path`, optionally deleting the original once the new file
    /// exists. Returns whether the encode succeeded.
    async fn transcode(&self, path: &Path, delete_original: bool) -> bool;

    /// Try to make `path` playable again. Same contract as `transcode`
    /// without deletion.
    async fn repair(&self, path: &Path) -> bool;

    /// Best-effort removal.
    async fn delete(&self, path: &Path);
}

pub fn is_disc_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("iso"))
}

/// Output path for a transcode of `input`.
pub fn transcode_output(input: &Path) -> scenemend_av::Result<PathBuf> {
    if is_disc_image(input) {
        sibling_output(input, "", OUTPUT_EXTENSION)
    } else {
        sibling_output(input, TRANSCODE_SUFFIX, OUTPUT_EXTENSION)
    }
}

/// ffmpeg-backed remediation with a single exclusive disc mount point.
#[derive(Debug)]
pub struct FileRemediationService {
    encoder: Encoder,
    mount: MountPoint,
    strategy: RepairStrategy,
}

impl FileRemediationService {
    pub fn new(encoder: Encoder, mount: MountPoint, strategy: RepairStrategy) -> Self {
        Self {
            encoder,
            mount,
            strategy,
        }
    }

    pub fn from_config(config: &Config) -> Arc<Self> {
        let tools = &config.tools;
        let encoder = Encoder::new(
            resolve_tool("ffmpeg", tools.ffmpeg_path.as_deref()),
            Duration::from_secs(tools.transcode_timeout_secs),
        );
        let mount = MountPoint::new(
            &config.remediation.mount_point,
            resolve_tool("mount", tools.mount_path.as_deref()),
            resolve_tool("umount", tools.umount_path.as_deref()),
            Duration::from_secs(tools.mount_timeout_secs),
        );

        Arc::new(Self::new(
            encoder,
            mount,
            config.remediation.repair_strategy,
        ))
    }

    async fn encode_file(&self, path: &Path) -> scenemend_av::Result<()> {
        let output = transcode_output(path)?;
        self.encoder.encode(path, &output).await
    }

    /// Mount the image, encode its main stream next to the image and always
    /// unmount. A failed unmount fails the whole operation so the image is
    /// never deleted while still attached.
    async fn encode_disc(&self, image: &Path) -> scenemend_av::Result<()> {
        let output = transcode_output(image)?;
        let mounted = self.mount.attach(image).await?;

        let encoded = match mounted.find_main_stream() {
            Ok(stream) => {
                tracing::debug!("Main stream of {} is {}", image.display(), stream.display());
                self.encoder.encode(&stream, &output).await
            }
            Err(e) => Err(e),
        };

        let released = mounted.release().await;
        encoded?;
        released
    }

    async fn stream_copy(&self, path: &Path) -> scenemend_av::Result<()> {
        let output = sibling_output(path, REPAIR_SUFFIX, OUTPUT_EXTENSION)?;
        self.encoder.stream_copy(path, &output).await
    }
}

#[async_trait]
impl Remediator for FileRemediationService {
    async fn transcode(&self, path: &Path, delete_original: bool) -> bool {
        let result = if is_disc_image(path) {
            self.encode_disc(path).await
        } else {
            self.encode_file(path).await
        };

        match result {
            Ok(()) => {
                if delete_original {
                    self.delete(path).await;
                }
                true
            }
            Err(e) => {
                tracing::error!("Transcode of {} failed: {}", path.display(), e);
                false
            }
        }
    }

    async fn repair(&self, path: &Path) -> bool {
        if is_disc_image(path) || self.strategy == RepairStrategy::Transcode {
            return self.transcode(path, false).await;
        }

        match self.stream_copy(path).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Repair of {} failed: {}", path.display(), e);
                false
            }
        }
    }

    async fn delete(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => tracing::info!("Deleted {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Cannot delete {}: already gone", path.display())
            }
            Err(e) => tracing::error!("Failed to delete {}: {}", path.display(), e),
        }
    }
}
