//! Per-file evaluation of action trees.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::arr::{CatalogFailure, CatalogGateway};
use crate::guard::{check_duplicates, GuardOutcome, Resolution};
use crate::logs::ErrorRecord;
use crate::remediation::Remediator;
use crate::rules::{ActionNode, ActionTree};

/// Terminal state of one file: the last leaf reached, or the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    FileDeleted,
    FileReplaced,
    FileBlacklisted,
    FileIgnored,
    FileUnmatched,
    GuardResolved,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::FileDeleted => "FILE_DELETED",
            Outcome::FileReplaced => "FILE_REPLACED",
            Outcome::FileBlacklisted => "FILE_BLACKLISTED",
            Outcome::FileIgnored => "FILE_IGNORED",
            Outcome::FileUnmatched => "FILE_UNMATCHED",
            Outcome::GuardResolved => "GUARD_RESOLVED",
        };
        f.write_str(s)
    }
}

/// What happened to one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub cause: String,
    pub rule: Option<String>,
    pub actions: ActionTree,
    pub outcome: Outcome,
    /// Catalog and file operations that failed along the way.
    pub failures: Vec<String>,
}

/// Walks a record's action tree against the file system and the catalogs.
pub struct ActionExecutor {
    remediator: Arc<dyn Remediator>,
    gateway: CatalogGateway,
}

impl ActionExecutor {
    pub fn new(remediator: Arc<dyn Remediator>, gateway: CatalogGateway) -> Self {
        Self {
            remediator,
            gateway,
        }
    }

    pub async fn execute(&self, record: &ErrorRecord) -> FileReport {
        let mut report = FileReport {
            path: record.file_path.clone(),
            cause: record.cause.clone(),
            rule: record.rule.clone(),
            actions: record.actions.clone(),
            outcome: Outcome::FileIgnored,
            failures: Vec::new(),
        };
        let path = record.file_path.as_path();

        if record.actions.is_inert() {
            report.outcome = if record.actions.is_unmatched() {
                tracing::info!("No rule for {}: {}", path.display(), record.cause);
                Outcome::FileUnmatched
            } else {
                tracing::debug!("Ignoring error for {}", path.display());
                Outcome::FileIgnored
            };
            return report;
        }

        match check_duplicates(path).await {
            GuardOutcome::Proceed => {}
            GuardOutcome::Resolved(resolution) => {
                if let Resolution::Duplicate {
                    smallest,
                    removed: false,
                } = &resolution
                {
                    report
                        .failures
                        .push(format!("failed to delete duplicate {}", smallest.display()));
                }
                report.outcome = Outcome::GuardResolved;
                return report;
            }
        }

        tracing::info!(
            "Handling {} ({}): {}",
            path.display(),
            record.cause,
            record.actions
        );

        for (i, node) in record.actions.iter().enumerate() {
            if i > 0 && !file_exists(path).await {
                tracing::info!(
                    "{} is gone; skipping remaining actions after {}",
                    path.display(),
                    report.outcome
                );
                break;
            }
            report.outcome = self.run_node(node, path, &mut report.failures).await;
        }

        tracing::info!("{}: {}", path.display(), report.outcome);
        report
    }

    /// Run one top-level node, following conditional branches down to a leaf.
    async fn run_node(
        &self,
        node: &ActionNode,
        path: &Path,
        failures: &mut Vec<String>,
    ) -> Outcome {
        let mut current = node;

        loop {
            match current {
                ActionNode::Ignore => return Outcome::FileIgnored,
                ActionNode::Unmatched => return Outcome::FileUnmatched,
                ActionNode::Delete => {
                    self.remediator.delete(path).await;
                    return Outcome::FileDeleted;
                }
                ActionNode::Replace => {
                    extend_failures(failures, self.gateway.rescan(path).await);
                    return Outcome::FileReplaced;
                }
                ActionNode::Blacklist => {
                    extend_failures(failures, self.gateway.blacklist(path).await);
                    extend_failures(failures, self.gateway.rescan(path).await);
                    if !self.remediator.transcode(path, true).await {
                        failures.push(format!("transcode of {} failed", path.display()));
                    }
                    return Outcome::FileBlacklisted;
                }
                ActionNode::Remux {
                    on_success,
                    on_fail,
                } => {
                    let ok = self.remediator.transcode(path, false).await;
                    tracing::info!(
                        "Remux of {} {}",
                        path.display(),
                        if ok { "succeeded" } else { "failed" }
                    );
                    current = if ok { on_success.as_ref() } else { on_fail.as_ref() };
                }
                ActionNode::Repair {
                    on_success,
                    on_fail,
                } => {
                    let ok = self.remediator.repair(path).await;
                    tracing::info!(
                        "Repair of {} {}",
                        path.display(),
                        if ok { "succeeded" } else { "failed" }
                    );
                    current = if ok { on_success.as_ref() } else { on_fail.as_ref() };
                }
            }
        }
    }
}

fn extend_failures(failures: &mut Vec<String>, new: Vec<CatalogFailure>) {
    failures.extend(new.iter().map(ToString::to_string));
}

async fn file_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_names() {
        assert_eq!(Outcome::GuardResolved.to_string(), "GUARD_RESOLVED");
        assert_eq!(
            serde_json::to_value(Outcome::FileBlacklisted).unwrap(),
            serde_json::json!("FILE_BLACKLISTED")
        );
    }
}
