//! Shared fakes for integration tests.
//!
//! [`FakeRemediator`] and [`FakeCatalog`] append to one [`CallLog`] so tests
//! can assert the order of file and catalog operations.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use scenemend::arr::{ArrError, Catalog, ItemRef};
use scenemend::config::ArrType;
use scenemend::logs::ErrorRecord;
use scenemend::remediation::Remediator;
use scenemend::rules::ActionTree;

/// Ordered record of every fake call.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, call: impl Into<String>) {
        self.0.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().unwrap().is_empty()
    }
}

/// Remediator with scripted results. Successful transcodes with deletion
/// really remove the file so missing-file handling can be observed.
#[derive(Debug, Default)]
pub struct FakeRemediator {
    pub log: CallLog,
    pub transcode_ok: bool,
    pub repair_ok: bool,
}

impl FakeRemediator {
    pub fn new(log: CallLog, transcode_ok: bool, repair_ok: bool) -> Self {
        Self {
            log,
            transcode_ok,
            repair_ok,
        }
    }
}

#[async_trait]
impl Remediator for FakeRemediator {
    async fn transcode(&self, path: &Path, delete_original: bool) -> bool {
        self.log
            .push(format!("transcode({}, {})", name(path), delete_original));
        if self.transcode_ok && delete_original {
            let _ = std::fs::remove_file(path);
        }
        self.transcode_ok
    }

    async fn repair(&self, path: &Path) -> bool {
        self.log.push(format!("repair({})", name(path)));
        self.repair_ok
    }

    async fn delete(&self, path: &Path) {
        self.log.push(format!("delete({})", name(path)));
        let _ = std::fs::remove_file(path);
    }
}

/// Catalog with scripted results, keyed by operation name.
#[derive(Debug)]
pub struct FakeCatalog {
    pub name: String,
    pub kind: ArrType,
    pub log: CallLog,
    pub fail: HashMap<&'static str, bool>,
}

impl FakeCatalog {
    pub fn radarr(log: CallLog) -> Self {
        Self {
            name: "radarr".into(),
            kind: ArrType::Radarr,
            log,
            fail: HashMap::new(),
        }
    }

    pub fn sonarr(log: CallLog) -> Self {
        Self {
            name: "sonarr".into(),
            kind: ArrType::Sonarr,
            log,
            fail: HashMap::new(),
        }
    }

    pub fn failing(mut self, operation: &'static str) -> Self {
        self.fail.insert(operation, true);
        self
    }

    fn result(&self, operation: &'static str) -> Result<(), ArrError> {
        self.log.push(format!("{}.{}", self.name, operation));
        if self.fail.get(operation).copied().unwrap_or(false) {
            Err(ArrError::NotFound(format!("{} {}", self.name, operation)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    fn name(&self) -> &str {
        &self.name
    }

    async fn test_connection(&self) -> Result<(), ArrError> {
        self.result("status")
    }

    async fn locate(&self, file: &Path) -> Result<ItemRef, ArrError> {
        self.result("locate")?;
        Ok(match self.kind {
            ArrType::Radarr => ItemRef::Movie { id: 1 },
            ArrType::Sonarr => ItemRef::SeriesFolder(
                file.parent()
                    .and_then(Path::parent)
                    .map(Path::to_path_buf)
                    .unwrap_or_default(),
            ),
        })
    }

    async fn rescan(&self, _item: &ItemRef) -> Result<(), ArrError> {
        self.result("rescan")
    }

    fn supports_blacklist(&self) -> bool {
        self.kind == ArrType::Radarr
    }

    async fn set_blacklisted(&self, _item: &ItemRef) -> Result<(), ArrError> {
        self.result("blacklist")
    }
}

/// File name of `path`, for compact call logs.
pub fn name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Write a file of `len` bytes.
pub fn write_sized(path: &Path, len: usize) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, vec![0u8; len]).unwrap();
}

pub fn record(path: PathBuf, cause: &str, actions: ActionTree) -> ErrorRecord {
    ErrorRecord {
        file_path: path,
        cause: cause.to_string(),
        actions,
        rule: None,
    }
}
