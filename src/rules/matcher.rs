use regex::Regex;
use std::fmt;

/// A rule pattern, compiled once when the rule table is built.
///
/// Patterns that fail to compile are kept so they can be reported, but they
/// never match.
#[derive(Debug, Clone)]
pub enum Pattern {
    Compiled(Regex),
    Malformed { source: String, error: regex::Error },
}

impl Pattern {
    pub fn compile(source: &str) -> Self {
        match Regex::new(source) {
            Ok(regex) => Pattern::Compiled(regex),
            Err(error) => Pattern::Malformed {
                source: source.to_string(),
                error,
            },
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Pattern::Compiled(regex) => regex.as_str(),
            Pattern::Malformed { source, .. } => source,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Pattern::Malformed { .. })
    }

    pub fn error(&self) -> Option<&regex::Error> {
        match self {
            Pattern::Compiled(_) => None,
            Pattern::Malformed { error, .. } => Some(error),
        }
    }

    /// Unanchored search of `cause`. Malformed patterns log and report no
    /// match.
    pub fn matches(&self, cause: &str) -> bool {
        match self {
            Pattern::Compiled(regex) => regex.is_match(cause),
            Pattern::Malformed { source, error } => {
                tracing::debug!("Skipping malformed pattern {:?}: {}", source, error);
                false
            }
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
