//! Exclusive loopback mounting of optical disc images.
//!
//! A single well-known directory serves as the mount point for every image,
//! so at most one image can be attached at a time. [`MountPoint::attach`]
//! serializes callers on an async lock and hands back a [`LoopMount`] guard
//! that unmounts on [`LoopMount::release`], or on drop if the owning task
//! bailed out early or was cancelled by a timeout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};

use crate::command::ToolCommand;
use crate::{Error, Result};

/// Directory layout of a Blu-ray image holding the main transport streams.
const BLURAY_STREAM_DIR: &str = "BDMV/STREAM";

/// The shared mount directory plus the tools that attach images to it.
#[derive(Debug)]
pub struct MountPoint {
    dir: PathBuf,
    mount_bin: PathBuf,
    umount_bin: PathBuf,
    timeout: Duration,
    lock: Mutex<()>,
}

impl MountPoint {
    pub fn new(
        dir: impl Into<PathBuf>,
        mount_bin: impl Into<PathBuf>,
        umount_bin: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            dir: dir.into(),
            mount_bin: mount_bin.into(),
            umount_bin: umount_bin.into(),
            timeout,
            lock: Mutex::new(()),
        }
    }

    /// Mount `image` read-only, waiting for any other image to be released
    /// first.
    pub async fn attach(&self, image: &Path) -> Result<LoopMount<'_>> {
        if !image.exists() {
            return Err(Error::file_not_found(image));
        }

        let permit = self.lock.lock().await;
        tokio::fs::create_dir_all(&self.dir).await?;

        tracing::info!("Mounting image {} at {}", image.display(), self.dir.display());
        ToolCommand::new(&self.mount_bin)
            .args(["-o", "loop,ro"])
            .path_arg(image)
            .path_arg(&self.dir)
            .timeout(self.timeout)
            .execute()
            .await?;

        Ok(LoopMount {
            _permit: permit,
            point: self,
            released: false,
        })
    }
}

/// An attached image. Holds the mount point's lock until released.
#[derive(Debug)]
pub struct LoopMount<'a> {
    _permit: MutexGuard<'a, ()>,
    point: &'a MountPoint,
    released: bool,
}

impl LoopMount<'_> {
    /// Root directory of the mounted image.
    pub fn dir(&self) -> &Path {
        &self.point.dir
    }

    /// First Blu-ray transport stream inside the image.
    pub fn find_main_stream(&self) -> Result<PathBuf> {
        find_bluray_stream(self.dir())
    }

    /// Unmount the image and give up the mount point.
    pub async fn release(mut self) -> Result<()> {
        tracing::info!("Unmounting {}", self.point.dir.display());
        let result = ToolCommand::new(&self.point.umount_bin)
            .path_arg(&self.point.dir)
            .timeout(self.point.timeout)
            .execute()
            .await;
        self.released = true;
        result.map(|_| ())
    }
}

impl Drop for LoopMount<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        tracing::warn!(
            "Mount at {} dropped without release; unmounting",
            self.point.dir.display()
        );
        match std::process::Command::new(&self.point.umount_bin)
            .arg(&self.point.dir)
            .status()
        {
            Ok(status) if status.success() => {}
            Ok(status) => tracing::error!(
                "umount {} exited with {}",
                self.point.dir.display(),
                status
            ),
            Err(e) => tracing::error!("Failed to run umount: {}", e),
        }
    }
}

/// Locate the first `.m2ts` stream (by name) under `BDMV/STREAM`.
pub fn find_bluray_stream(root: &Path) -> Result<PathBuf> {
    let stream_dir = root.join(BLURAY_STREAM_DIR);
    let no_stream = || Error::NoStream {
        mount: root.to_path_buf(),
    };

    let entries = match std::fs::read_dir(&stream_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(no_stream()),
        Err(e) => return Err(e.into()),
    };

    let mut streams: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("m2ts"))
        })
        .collect();
    streams.sort();

    streams.into_iter().next().ok_or_else(no_stream)
}
