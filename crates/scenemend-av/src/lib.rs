//! # scenemend-av
//!
//! External media tooling used by the scenemend remediation workflow.
//!
//! This crate provides:
//! - [`ToolCommand`], a subprocess builder with a hard timeout that kills the
//!   child when the budget runs out
//! - [`Encoder`], which re-encodes files with the fixed HEVC profile or
//!   rebuilds their container with a stream copy
//! - [`MountPoint`], the single exclusive loopback mount used to reach the
//!   streams inside optical disc images
//! - tool discovery for `check-tools`
//!
//! ## Example
//!
//! ```no_run
//! use scenemend_av::{sibling_output, Encoder};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! # async fn example() -> scenemend_av::Result<()> {
//! let input = Path::new("/movies/Film/Film.avi");
//! let output = sibling_output(input, "_h265", "mkv")?;
//! Encoder::new("ffmpeg", Duration::from_secs(3600))
//!     .encode(input, &output)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod encode;
mod error;
pub mod mount;
pub mod tools;

// Re-exports
pub use command::{ToolCommand, ToolOutput};
pub use encode::{sibling_output, EncodeProfile, Encoder, HEVC_PROFILE};
pub use error::{Error, Result};
pub use mount::{find_bluray_stream, LoopMount, MountPoint};
pub use tools::{check_tool, check_tools, require_tool, resolve_tool, ToolInfo};
