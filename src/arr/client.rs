use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use super::retry::{retry_transient, RetryPolicy};
use super::types::{ItemRef, MovieRecord, MovieSummary, RescanMovieCommand, RescanSeriesCommand};
use super::ArrError;
use crate::config::{ArrConfig, ArrType};

/// A Radarr or Sonarr instance as seen by the remediation workflow.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Configured instance name, used in logs and reports.
    fn name(&self) -> &str;

    /// Check connectivity and credentials.
    async fn test_connection(&self) -> Result<(), ArrError>;

    /// Find the item a media file belongs to.
    async fn locate(&self, file: &Path) -> Result<ItemRef, ArrError>;

    /// Ask the instance to rescan the item's folder.
    async fn rescan(&self, item: &ItemRef) -> Result<(), ArrError>;

    fn supports_blacklist(&self) -> bool {
        false
    }

    /// Stop monitoring the item so it is not grabbed again.
    async fn set_blacklisted(&self, _item: &ItemRef) -> Result<(), ArrError> {
        Err(ArrError::Unsupported {
            catalog: self.name().to_string(),
            operation: "blacklisting",
        })
    }
}

/// Create an appropriate client based on config
pub fn create_catalog(config: &ArrConfig, retry: RetryPolicy) -> Arc<dyn Catalog> {
    match config.arr_type {
        ArrType::Radarr => Arc::new(RadarrClient::new(config, retry)),
        ArrType::Sonarr => Arc::new(SonarrClient::new(config)),
    }
}

struct BaseArrClient {
    client: Client,
    name: String,
    base_url: String,
    api_key: String,
}

impl BaseArrClient {
    fn new(config: &ArrConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            name: config.name.clone(),
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v3{}", self.base_url, path)
    }

    fn what(&self, action: &str) -> String {
        format!("{} {}", self.name, action)
    }

    async fn get(&self, path: &str, what: &str) -> Result<reqwest::Response, ArrError> {
        self.client
            .get(self.url(path))
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| ArrError::transport(what, e))
    }

    /// GET a JSON document, failing on anything but a 2xx.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        what: &str,
    ) -> Result<T, ArrError> {
        let response = self.get(path, what).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ArrError::from_status(what, status, body));
        }
        response
            .json()
            .await
            .map_err(|e| ArrError::transport(what, e))
    }

    /// POST to `/command`. Radarr answers 201 and Sonarr 200 depending on
    /// version, so any 2xx counts as queued.
    async fn post_command<T: Serialize>(&self, command: &T, what: &str) -> Result<(), ArrError> {
        let response = self
            .client
            .post(self.url("/command"))
            .header("X-Api-Key", &self.api_key)
            .json(command)
            .send()
            .await
            .map_err(|e| ArrError::transport(what, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ArrError::from_status(what, status, body));
        }
        tracing::debug!("{}: HTTP {}", what, status);
        Ok(())
    }

    async fn test_connection(&self) -> Result<(), ArrError> {
        let what = self.what("status check");
        let response = self.get("/system/status", &what).await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ArrError::from_status(what, status, body))
        }
    }
}

pub struct RadarrClient {
    base: BaseArrClient,
    retry: RetryPolicy,
}

impl RadarrClient {
    pub fn new(config: &ArrConfig, retry: RetryPolicy) -> Self {
        Self {
            base: BaseArrClient::new(config),
            retry,
        }
    }

    fn movie_id(&self, item: &ItemRef) -> Result<i64, ArrError> {
        match item {
            ItemRef::Movie { id } => Ok(*id),
            other => Err(ArrError::NotFound(format!(
                "{}: {} is not a movie",
                self.base.name, other
            ))),
        }
    }

    async fn put_movie(&self, record: &MovieRecord, what: &str) -> Result<(), ArrError> {
        let response = self
            .base
            .client
            .put(self.base.url(&format!("/movie/{}", record.id)))
            .header("X-Api-Key", &self.base.api_key)
            .json(record)
            .send()
            .await
            .map_err(|e| ArrError::transport(what, e))?;

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(ArrError::from_status(what, status, body))
    }
}

#[async_trait]
impl Catalog for RadarrClient {
    fn name(&self) -> &str {
        &self.base.name
    }

    async fn test_connection(&self) -> Result<(), ArrError> {
        self.base.test_connection().await
    }

    async fn locate(&self, file: &Path) -> Result<ItemRef, ArrError> {
        let folder = file
            .parent()
            .ok_or_else(|| ArrError::NotFound(format!("no folder for {}", file.display())))?;
        let folder = folder.to_string_lossy();

        let what = self.base.what("movie lookup");
        let movies: Vec<MovieSummary> = self.base.get_json("/movie", &what).await?;

        match movies
            .iter()
            .find(|m| m.path.as_deref() == Some(folder.as_ref()))
        {
            Some(movie) => {
                tracing::debug!("{}: movie {} for {}", self.base.name, movie.id, folder);
                Ok(ItemRef::Movie { id: movie.id })
            }
            None => Err(ArrError::NotFound(format!(
                "{}: no movie with folder {}",
                self.base.name, folder
            ))),
        }
    }

    async fn rescan(&self, item: &ItemRef) -> Result<(), ArrError> {
        let id = self.movie_id(item)?;
        let what = self.base.what(&format!("rescan of movie {}", id));
        self.base
            .post_command(&RescanMovieCommand::new(id), &what)
            .await?;
        tracing::info!("{}: rescan triggered for movie {}", self.base.name, id);
        Ok(())
    }

    fn supports_blacklist(&self) -> bool {
        true
    }

    async fn set_blacklisted(&self, item: &ItemRef) -> Result<(), ArrError> {
        let id = self.movie_id(item)?;
        let what = self.base.what(&format!("blacklist of movie {}", id));

        let mut record: MovieRecord = self
            .base
            .get_json(&format!("/movie/{}", id), &what)
            .await?;
        record.monitored = false;

        retry_transient(&self.retry, &what, || self.put_movie(&record, &what)).await?;
        tracing::info!("{}: movie {} unmonitored", self.base.name, id);
        Ok(())
    }
}

pub struct SonarrClient(BaseArrClient);

impl SonarrClient {
    pub fn new(config: &ArrConfig) -> Self {
        Self(BaseArrClient::new(config))
    }
}

#[async_trait]
impl Catalog for SonarrClient {
    fn name(&self) -> &str {
        &self.0.name
    }

    async fn test_connection(&self) -> Result<(), ArrError> {
        self.0.test_connection().await
    }

    /// Episodes live in `<show>/<season>/<file>`; the show folder is the
    /// rescan target.
    async fn locate(&self, file: &Path) -> Result<ItemRef, ArrError> {
        file.parent()
            .and_then(Path::parent)
            .map(|show| ItemRef::SeriesFolder(show.to_path_buf()))
            .ok_or_else(|| {
                ArrError::NotFound(format!("{}: no show folder for {}", self.0.name, file.display()))
            })
    }

    async fn rescan(&self, item: &ItemRef) -> Result<(), ArrError> {
        let ItemRef::SeriesFolder(folder) = item else {
            return Err(ArrError::NotFound(format!(
                "{}: {} is not a series folder",
                self.0.name, item
            )));
        };

        let what = self.0.what(&format!("rescan of {}", folder.display()));
        self.0
            .post_command(&RescanSeriesCommand::new(folder), &what)
            .await?;
        tracing::info!("{}: rescan triggered for {}", self.0.name, folder.display());
        Ok(())
    }
}
