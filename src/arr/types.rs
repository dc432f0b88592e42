use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// The fields of a Radarr movie needed to find it by folder.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieSummary {
    pub id: i64,
    #[serde(default)]
    pub path: Option<String>,
}

/// A complete Radarr movie record.
///
/// Only the fields this crate touches are typed; everything else is kept in
/// `extra` so a PUT sends back exactly what was received.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRecord {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub monitored: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Catalog item a file belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemRef {
    /// Radarr movie id.
    Movie { id: i64 },
    /// Sonarr show folder, two levels above the episode file.
    SeriesFolder(PathBuf),
}

impl std::fmt::Display for ItemRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemRef::Movie { id } => write!(f, "movie {}", id),
            ItemRef::SeriesFolder(path) => write!(f, "series folder {}", path.display()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RescanMovieCommand {
    pub name: &'static str,
    pub movie_id: i64,
    pub trigger: &'static str,
}

impl RescanMovieCommand {
    pub fn new(movie_id: i64) -> Self {
        Self {
            name: "RescanMovie",
            movie_id,
            trigger: "manual",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RescanSeriesCommand {
    pub name: &'static str,
    pub path: String,
}

impl RescanSeriesCommand {
    pub fn new(path: &std::path::Path) -> Self {
        Self {
            name: "RescanSeries",
            path: path.to_string_lossy().into_owned(),
        }
    }
}
