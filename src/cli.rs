use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use scenemend::config::ConfigOverrides;

#[derive(Parser)]
#[command(name = "scenemend")]
#[command(
    author,
    version,
    about = "Repairs or replaces media files that Bazarr reports as broken"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Log source and catalog settings that override the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Docker container running Bazarr
    #[arg(long, env = "BAZARR_CONTAINER")]
    pub container: Option<String>,

    /// Read the log from a file; wins over any configured container
    #[arg(long, conflicts_with = "stdin")]
    pub log_file: Option<PathBuf>,

    /// Read the log from standard input
    #[arg(long)]
    pub stdin: bool,

    /// Radarr base URL
    #[arg(long, env = "RADARR_HOST")]
    pub radarr_host: Option<String>,

    /// Radarr API key
    #[arg(long, env = "RADARR_KEY", hide_env_values = true)]
    pub radarr_key: Option<String>,

    /// Sonarr base URL
    #[arg(long, env = "SONARR_HOST")]
    pub sonarr_host: Option<String>,

    /// Sonarr API key
    #[arg(long, env = "SONARR_KEY", hide_env_values = true)]
    pub sonarr_key: Option<String>,
}

impl SourceArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            container: self.container.clone(),
            log_file: self.log_file.clone(),
            stdin: self.stdin,
            radarr_host: self.radarr_host.clone(),
            radarr_key: self.radarr_key.clone(),
            sonarr_host: self.sonarr_host.clone(),
            sonarr_key: self.sonarr_key.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read the log and remediate every reported file
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Number of files processed concurrently
        #[arg(short, long, default_value = "1")]
        jobs: usize,

        /// Output the per-file reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the files and actions a run would handle, without touching anything
    Plan {
        #[command(flatten)]
        source: SourceArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the actions for a single error cause
    Classify {
        /// Error cause text
        #[arg(required = true)]
        cause: String,
    },

    /// Validate configuration file
    Validate {
        #[command(flatten)]
        source: SourceArgs,

        /// Also check that every catalog answers
        #[arg(long)]
        online: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Display version information
    Version,
}
