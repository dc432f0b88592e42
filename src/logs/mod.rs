//! Log retrieval and error extraction.

mod extractor;

pub use extractor::{is_separator, DedupIndex, ErrorExtractor, ErrorRecord};

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use scenemend_av::ToolCommand;
use tokio::io::AsyncReadExt;

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("failed to read logs from {source_name}: {source}")]
    Tool {
        source_name: String,
        #[source]
        source: scenemend_av::Error,
    },

    #[error("failed to read log file {path:?}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read logs from stdin: {0}")]
    Stdin(#[source] std::io::Error),
}

/// Where one run reads its log from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSource {
    /// Output of `docker logs <container>`, both streams.
    Docker { container: String },
    File(PathBuf),
    Stdin,
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSource::Docker { container } => write!(f, "docker container '{}'", container),
            LogSource::File(path) => write!(f, "file {}", path.display()),
            LogSource::Stdin => write!(f, "stdin"),
        }
    }
}

impl LogSource {
    /// Read the whole log. `docker` is the docker binary and `timeout`
    /// bounds the `docker logs` call.
    pub async fn read(&self, docker: &Path, timeout: Duration) -> Result<String, LogError> {
        match self {
            LogSource::Docker { container } => {
                tracing::debug!("Reading logs of container {}", container);
                let output = ToolCommand::new(docker)
                    .arg("logs")
                    .arg(container)
                    .timeout(timeout)
                    .execute()
                    .await
                    .map_err(|source| LogError::Tool {
                        source_name: self.to_string(),
                        source,
                    })?;

                // The container's stderr is replayed on docker's stderr.
                let mut combined = output.stdout;
                if !combined.is_empty() && !combined.ends_with('\n') {
                    combined.push('\n');
                }
                combined.push_str(&output.stderr);
                Ok(combined)
            }
            LogSource::File(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|source| LogError::File {
                    path: path.clone(),
                    source,
                })?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            LogSource::Stdin => {
                let mut bytes = Vec::new();
                tokio::io::stdin()
                    .read_to_end(&mut bytes)
                    .await
                    .map_err(LogError::Stdin)?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
        }
    }
}
