use std::fmt;
use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;

use super::{create_catalog, ArrError, Catalog, RetryPolicy};
use crate::config::Config;

/// A catalog call that did not succeed.
#[derive(Debug)]
pub struct CatalogFailure {
    pub catalog: String,
    pub operation: &'static str,
    pub error: ArrError,
}

impl fmt::Display for CatalogFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.catalog, self.operation, self.error)
    }
}

/// Fans catalog operations out to every configured instance.
///
/// Each instance locates the file on its own; a failed lookup only skips the
/// call that depended on it.
#[derive(Clone, Default)]
pub struct CatalogGateway {
    catalogs: Vec<Arc<dyn Catalog>>,
}

impl CatalogGateway {
    pub fn new(catalogs: Vec<Arc<dyn Catalog>>) -> Self {
        Self { catalogs }
    }

    pub fn from_config(config: &Config) -> Self {
        let retry = RetryPolicy::from(&config.retry);
        let catalogs = config
            .arrs
            .iter()
            .filter(|arr| arr.enabled)
            .map(|arr| create_catalog(arr, retry))
            .collect();
        Self { catalogs }
    }

    pub fn catalogs(&self) -> &[Arc<dyn Catalog>] {
        &self.catalogs
    }

    /// Ask every instance to rescan the item `file` belongs to.
    pub async fn rescan(&self, file: &Path) -> Vec<CatalogFailure> {
        let calls = self.catalogs.iter().map(|catalog| async move {
            let item = catalog.locate(file).await?;
            catalog.rescan(&item).await
        });
        collect_failures(&self.catalogs, "rescan", file, join_all(calls).await)
    }

    /// Unmonitor the item `file` belongs to on every instance that supports
    /// it.
    pub async fn blacklist(&self, file: &Path) -> Vec<CatalogFailure> {
        let supporting: Vec<_> = self
            .catalogs
            .iter()
            .filter(|catalog| {
                if !catalog.supports_blacklist() {
                    tracing::debug!("{} does not support blacklisting; skipped", catalog.name());
                }
                catalog.supports_blacklist()
            })
            .cloned()
            .collect();

        let calls = supporting.iter().map(|catalog| async move {
            let item = catalog.locate(file).await?;
            catalog.set_blacklisted(&item).await
        });
        collect_failures(&supporting, "blacklist", file, join_all(calls).await)
    }

    /// Connectivity check of every instance, in configuration order.
    pub async fn check(&self) -> Vec<(String, Result<(), ArrError>)> {
        let calls = self.catalogs.iter().map(|catalog| async move {
            (catalog.name().to_string(), catalog.test_connection().await)
        });
        join_all(calls).await
    }
}

fn collect_failures(
    catalogs: &[Arc<dyn Catalog>],
    operation: &'static str,
    file: &Path,
    results: Vec<Result<(), ArrError>>,
) -> Vec<CatalogFailure> {
    catalogs
        .iter()
        .zip(results)
        .filter_map(|(catalog, result)| {
            let error = result.err()?;
            tracing::error!(
                "{} {} failed for {}: {}",
                catalog.name(),
                operation,
                file.display(),
                error
            );
            Some(CatalogFailure {
                catalog: catalog.name().to_string(),
                operation,
                error,
            })
        })
        .collect()
}
