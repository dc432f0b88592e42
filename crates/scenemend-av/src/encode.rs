//! Re-encoding and container rebuilds through the ffmpeg CLI.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::command::ToolCommand;
use crate::{Error, Result};

/// Fixed encode profile applied to every transcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeProfile {
    /// ffmpeg video encoder name.
    pub video_codec: &'static str,
    /// Constant rate factor.
    pub crf: u8,
    /// Encoder speed preset.
    pub preset: &'static str,
    /// Audio handling; `copy` keeps streams untouched.
    pub audio_codec: &'static str,
    /// Extension of the output container.
    pub container: &'static str,
}

/// HEVC at CRF 28, medium preset, audio copied, Matroska output.
pub const HEVC_PROFILE: EncodeProfile = EncodeProfile {
    video_codec: "libx265",
    crf: 28,
    preset: "medium",
    audio_codec: "copy",
    container: "mkv",
};

impl EncodeProfile {
    /// ffmpeg arguments that encode `input` into `output` with this profile.
    pub fn args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "-hide_banner".into(),
            "-nostdin".into(),
            "-n".into(),
            "-i".into(),
            input.as_os_str().to_owned(),
            "-c:v".into(),
            self.video_codec.into(),
            "-crf".into(),
            self.crf.to_string().into(),
            "-preset".into(),
            self.preset.into(),
            "-c:a".into(),
            self.audio_codec.into(),
            output.as_os_str().to_owned(),
        ]
    }
}

/// Sibling of `input` named `<stem><suffix>.<ext>`.
///
/// ```
/// use scenemend_av::sibling_output;
/// use std::path::{Path, PathBuf};
///
/// let out = sibling_output(Path::new("/tv/Show/S01/ep.avi"), "_h265", "mkv").unwrap();
/// assert_eq!(out, PathBuf::from("/tv/Show/S01/ep_h265.mkv"));
/// ```
pub fn sibling_output(input: &Path, suffix: &str, ext: &str) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .ok_or_else(|| Error::InvalidInput(format!("no file name in {}", input.display())))?;

    let mut name = stem.to_os_string();
    name.push(suffix);
    name.push(".");
    name.push(ext);

    Ok(input.with_file_name(name))
}

/// Runs ffmpeg with a bounded time budget.
#[derive(Debug, Clone)]
pub struct Encoder {
    ffmpeg: PathBuf,
    timeout: Duration,
    profile: EncodeProfile,
}

impl Encoder {
    pub fn new(ffmpeg: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            timeout,
            profile: HEVC_PROFILE,
        }
    }

    /// Re-encode `input` into `output` using the encode profile.
    pub async fn encode(&self, input: &Path, output: &Path) -> Result<()> {
        if !input.exists() {
            return Err(Error::file_not_found(input));
        }

        tracing::info!("Encoding {} -> {}", input.display(), output.display());

        let mut cmd = ToolCommand::new(&self.ffmpeg);
        cmd.args(self.profile.args(input, output));
        self.write_output(cmd, output).await?;

        tracing::info!("Encode complete: {}", output.display());
        Ok(())
    }

    /// Rebuild the container of `input` without re-encoding, tolerating
    /// bitstream errors.
    pub async fn stream_copy(&self, input: &Path, output: &Path) -> Result<()> {
        if !input.exists() {
            return Err(Error::file_not_found(input));
        }

        tracing::info!(
            "Rebuilding container {} -> {}",
            input.display(),
            output.display()
        );

        let mut cmd = ToolCommand::new(&self.ffmpeg);
        cmd.args(["-hide_banner", "-nostdin", "-n", "-err_detect", "ignore_err", "-i"])
            .path_arg(input)
            .args(["-map", "0", "-c", "copy"])
            .path_arg(output);
        self.write_output(cmd, output).await
    }

    /// Run an ffmpeg invocation that creates `output`. A failed or timed-out
    /// run removes whatever it left at `output`; a file that was already
    /// there is never touched.
    async fn write_output(&self, mut cmd: ToolCommand, output: &Path) -> Result<()> {
        let preexisting = tokio::fs::try_exists(output).await.unwrap_or(true);

        let Err(e) = cmd.timeout(self.timeout).execute().await else {
            return Ok(());
        };

        if e.is_timeout() {
            tracing::warn!("ffmpeg killed after {:?} writing {}", self.timeout, output.display());
        }
        if !preexisting {
            match tokio::fs::remove_file(output).await {
                Ok(()) => tracing::debug!("Removed partial output {}", output.display()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => tracing::warn!(
                    "Failed to remove partial output {}: {}",
                    output.display(),
                    err
                ),
            }
        }
        Err(e)
    }
}
