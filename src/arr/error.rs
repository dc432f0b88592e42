use reqwest::StatusCode;

/// Outcome of a failed catalog call.
#[derive(Debug, thiserror::Error)]
pub enum ArrError {
    #[error("{0}: not found")]
    NotFound(String),

    /// Accepted but not applied (202), or a server error.
    #[error("{what}: HTTP {status} (transient)")]
    Transient { what: String, status: StatusCode },

    #[error("{what}: HTTP {status}: {body}")]
    Hard {
        what: String,
        status: StatusCode,
        body: String,
    },

    #[error("{what}: {source}")]
    Transport {
        what: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{catalog} does not support {operation}")]
    Unsupported {
        catalog: String,
        operation: &'static str,
    },

    #[error("{what}: gave up after {attempts} attempts: {last}")]
    Exhausted {
        what: String,
        attempts: u32,
        last: Box<ArrError>,
    },
}

impl ArrError {
    /// Errors worth retrying after a delay.
    pub fn is_transient(&self) -> bool {
        match self {
            ArrError::Transient { .. } => true,
            ArrError::Transport { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    /// Map an unexpected status. 202 and 5xx are transient.
    pub(crate) fn from_status(what: impl Into<String>, status: StatusCode, body: String) -> Self {
        let what = what.into();
        if status == StatusCode::ACCEPTED || status.is_server_error() {
            ArrError::Transient { what, status }
        } else if status == StatusCode::NOT_FOUND {
            ArrError::NotFound(what)
        } else {
            ArrError::Hard { what, status, body }
        }
    }

    pub(crate) fn transport(what: impl Into<String>, source: reqwest::Error) -> Self {
        ArrError::Transport {
            what: what.into(),
            source,
        }
    }
}
