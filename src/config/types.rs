use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::rules::ActionTree;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub arrs: Vec<ArrConfig>,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub remediation: RemediationConfig,

    /// Fail at startup when a rule pattern does not compile, instead of
    /// skipping the rule during classification.
    #[serde(default)]
    pub strict_patterns: bool,

    /// Replaces the built-in rule table when non-empty.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

/// Where the error log comes from. Exactly one of `container`, `file` or
/// `stdin` must be set before a run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Docker container whose logs are read with `docker logs`.
    #[serde(default)]
    pub container: Option<String>,

    /// Plain log file.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Read the log from standard input.
    #[serde(default)]
    pub stdin: bool,

    /// Component tag that precedes the cause in each error line.
    #[serde(default = "default_origin")]
    pub origin: String,
}

fn default_origin() -> String {
    "BAZARR".to_string()
}

impl SourceConfig {
    /// Same settings with no input selected.
    pub(crate) fn without_inputs(&self) -> Self {
        Self {
            container: None,
            file: None,
            stdin: false,
            origin: self.origin.clone(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            container: None,
            file: None,
            stdin: false,
            origin: default_origin(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArrConfig {
    pub name: String,

    #[serde(rename = "type")]
    pub arr_type: ArrType,

    pub url: String,

    pub api_key: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_enabled() -> bool {
    true
}

pub(crate) fn default_request_timeout() -> u64 {
    30
}

impl ArrConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArrType {
    Radarr,
    Sonarr,
}

impl std::fmt::Display for ArrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArrType::Radarr => write!(f, "radarr"),
            ArrType::Sonarr => write!(f, "sonarr"),
        }
    }
}

/// Retry discipline for catalog updates that are accepted but not applied.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Fixed delay between attempts in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_attempts() -> u32 {
    3
}

fn default_delay_ms() -> u64 {
    5_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            delay_ms: default_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub docker_path: Option<PathBuf>,

    #[serde(default)]
    pub mount_path: Option<PathBuf>,

    #[serde(default)]
    pub umount_path: Option<PathBuf>,

    /// Upper bound for a single ffmpeg run.
    #[serde(default = "default_transcode_timeout")]
    pub transcode_timeout_secs: u64,

    /// Upper bound for mount and umount.
    #[serde(default = "default_mount_timeout")]
    pub mount_timeout_secs: u64,

    /// Upper bound for `docker logs`.
    #[serde(default = "default_log_timeout")]
    pub log_timeout_secs: u64,
}

fn default_transcode_timeout() -> u64 {
    4 * 60 * 60
}

fn default_mount_timeout() -> u64 {
    60
}

fn default_log_timeout() -> u64 {
    120
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            docker_path: None,
            mount_path: None,
            umount_path: None,
            transcode_timeout_secs: default_transcode_timeout(),
            mount_timeout_secs: default_mount_timeout(),
            log_timeout_secs: default_log_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemediationConfig {
    /// The single directory disc images are mounted on.
    #[serde(default = "default_mount_point")]
    pub mount_point: PathBuf,

    #[serde(default)]
    pub repair_strategy: RepairStrategy,
}

fn default_mount_point() -> PathBuf {
    PathBuf::from("/mnt/iso")
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            mount_point: default_mount_point(),
            repair_strategy: RepairStrategy::default(),
        }
    }
}

/// How the `REPAIR` action treats a file.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RepairStrategy {
    /// Same as a transcode.
    #[default]
    Transcode,
    /// Rebuild the container with a stream copy, ignoring bitstream errors.
    StreamCopy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleConfig {
    #[serde(default)]
    pub name: Option<String>,

    /// Regular expression searched for anywhere in the error cause.
    pub pattern: String,

    pub action: ActionTree,
}

/// Values supplied on the command line or through the environment. They win
/// over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub container: Option<String>,
    pub log_file: Option<PathBuf>,
    pub stdin: bool,
    pub radarr_host: Option<String>,
    pub radarr_key: Option<String>,
    pub sonarr_host: Option<String>,
    pub sonarr_key: Option<String>,
}
