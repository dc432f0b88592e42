//! One remediation pass over a log.

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use scenemend_av::resolve_tool;

use crate::arr::CatalogGateway;
use crate::config::Config;
use crate::executor::{ActionExecutor, FileReport, Outcome};
use crate::logs::{DedupIndex, ErrorExtractor, ErrorRecord};
use crate::remediation::FileRemediationService;
use crate::rules::RuleTable;

/// Reports of one run, in discovery order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub reports: Vec<FileReport>,
}

impl RunSummary {
    pub fn counts(&self) -> BTreeMap<Outcome, usize> {
        let mut counts = BTreeMap::new();
        for report in &self.reports {
            *counts.entry(report.outcome).or_insert(0) += 1;
        }
        counts
    }

    /// Number of files with at least one failed operation.
    pub fn files_with_failures(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| !r.failures.is_empty())
            .count()
    }
}

/// Extraction, classification and execution wired together.
pub struct Runner {
    table: RuleTable,
    extractor: ErrorExtractor,
    executor: ActionExecutor,
}

impl Runner {
    pub fn new(table: RuleTable, extractor: ErrorExtractor, executor: ActionExecutor) -> Self {
        Self {
            table,
            extractor,
            executor,
        }
    }

    /// Build everything a run needs from validated configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let table = RuleTable::from_config(config)?;
        let extractor = ErrorExtractor::new(&config.source.origin)
            .context("Invalid source.origin")?;
        let executor = ActionExecutor::new(
            FileRemediationService::from_config(config),
            CatalogGateway::from_config(config),
        );
        Ok(Self::new(table, extractor, executor))
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Distinct failing files with their classified actions.
    pub fn extract(&self, text: &str) -> DedupIndex {
        self.extractor.extract(text, &self.table)
    }

    /// Remediate every record, running up to `jobs` at once. Reports keep
    /// discovery order.
    pub async fn execute(&self, records: &[ErrorRecord], jobs: usize) -> RunSummary {
        let reports: Vec<FileReport> = stream::iter(records)
            .map(|record| self.executor.execute(record))
            .buffered(jobs.max(1))
            .collect()
            .await;
        RunSummary { reports }
    }

    pub async fn run(&self, text: &str, jobs: usize) -> RunSummary {
        let index = self.extract(text);
        tracing::info!("Found {} files with errors", index.len());
        let records = index.into_records();
        self.execute(&records, jobs).await
    }
}

/// Read the configured log source.
pub async fn read_log(config: &Config) -> Result<String> {
    let source = config.log_source()?;
    let docker = resolve_tool("docker", config.tools.docker_path.as_deref());
    tracing::info!("Reading log from {}", source);
    source
        .read(
            &docker,
            Duration::from_secs(config.tools.log_timeout_secs),
        )
        .await
        .with_context(|| format!("Failed to read log from {}", source))
}
