//! JSON-based scan report storage.
//!
//! Each scan is stored as its own `<id>.json` file, which keeps writes atomic
//! per scan and makes the history easy to inspect by hand.

use crate::config::Paths;
use crate::error::{StorageError, StorageResult};
use crate::scanner::ScanReport;
use crate::types::ScanId;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// A stored scan report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: ScanId,
    #[serde(flatten)]
    pub report: ScanReport,
}

impl ScanRecord {
    /// Wrap a finished report under a fresh id.
    pub fn new(report: ScanReport) -> Self {
        Self {
            id: ScanId::new(),
            report,
        }
    }

    /// One-line summary for listings.
    pub fn summary(&self) -> String {
        let summary = self.report.summary();
        format!(
            "{} [{}] - {} alive, {} dead, {} open ports [{:.2}s]",
            self.report.target,
            self.report.ports_spec,
            summary.alive,
            summary.dead,
            summary.open_ports,
            self.report.duration_ms as f64 / 1000.0
        )
    }
}

/// JSON file-based scan storage.
pub struct ScanStore {
    scans_dir: PathBuf,
}

impl ScanStore {
    /// Open the store under the default data directory.
    pub fn new() -> StorageResult<Self> {
        Self::with_dir(Paths::get()?.scans_dir())
    }

    /// Open a store rooted at a specific directory.
    pub fn with_dir(scans_dir: PathBuf) -> StorageResult<Self> {
        fs::create_dir_all(&scans_dir).map_err(|e| StorageError::DirectoryError(e.to_string()))?;
        Ok(Self { scans_dir })
    }

    /// Store a report and return the record it was saved as.
    pub fn save(&self, report: ScanReport) -> StorageResult<ScanRecord> {
        let record = ScanRecord::new(report);
        let content = serde_json::to_string_pretty(&record)?;
        fs::write(self.scan_file(&record.id), content)
            .map_err(|e| StorageError::SaveFailed(e.to_string()))?;
        Ok(record)
    }

    pub fn load(&self, id: &ScanId) -> StorageResult<ScanRecord> {
        let file = self.scan_file(id);
        if !file.exists() {
            return Err(StorageError::ScanNotFound(id.to_string()));
        }

        let content =
            fs::read_to_string(&file).map_err(|e| StorageError::LoadFailed(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| StorageError::LoadFailed(e.to_string()))
    }

    /// Find a scan by a unique id prefix, e.g. the short form shown in listings.
    pub fn find_by_prefix(&self, prefix: &str) -> StorageResult<ScanRecord> {
        let matches: Vec<ScanId> = self
            .list_ids()?
            .into_iter()
            .filter(|id| id.matches_prefix(prefix))
            .collect();

        match matches.as_slice() {
            [] => Err(StorageError::ScanNotFound(prefix.to_string())),
            [id] => self.load(id),
            _ => Err(StorageError::AmbiguousPrefix {
                prefix: prefix.to_string(),
                matches: matches.len(),
            }),
        }
    }

    /// Look up a scan by full id or by prefix.
    pub fn find(&self, id_or_prefix: &str) -> StorageResult<ScanRecord> {
        match id_or_prefix.parse::<ScanId>() {
            Ok(id) => self.load(&id),
            Err(_) => self.find_by_prefix(id_or_prefix),
        }
    }

    pub fn list_ids(&self) -> StorageResult<Vec<ScanId>> {
        let mut ids = Vec::new();

        let entries =
            fs::read_dir(&self.scans_dir).map_err(|e| StorageError::DirectoryError(e.to_string()))?;
        for entry in entries {
            let path = entry
                .map_err(|e| StorageError::DirectoryError(e.to_string()))?
                .path();
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|stem| stem.to_string_lossy().parse::<ScanId>().ok())
            {
                ids.push(id);
            }
        }

        Ok(ids)
    }

    /// All readable records, most recent first.
    pub fn list(&self) -> StorageResult<Vec<ScanRecord>> {
        let mut records: Vec<ScanRecord> = Vec::new();
        for id in self.list_ids()? {
            match self.load(&id) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(%id, error = %e, "skipping unreadable scan"),
            }
        }

        records.sort_by(|a, b| b.report.generated_at.cmp(&a.report.generated_at));
        Ok(records)
    }

    pub fn list_recent(&self, count: usize) -> StorageResult<Vec<ScanRecord>> {
        let mut records = self.list()?;
        records.truncate(count);
        Ok(records)
    }

    pub fn delete(&self, id: &ScanId) -> StorageResult<()> {
        let file = self.scan_file(id);
        if !file.exists() {
            return Err(StorageError::ScanNotFound(id.to_string()));
        }
        fs::remove_file(&file).map_err(|e| StorageError::SaveFailed(e.to_string()))
    }

    /// Delete scans older than `max_age`, returning how many were removed.
    pub fn cleanup(&self, max_age: chrono::Duration) -> StorageResult<usize> {
        let cutoff = Utc::now() - max_age;
        let mut deleted = 0;

        for record in self.list()? {
            if record.report.generated_at < cutoff {
                self.delete(&record.id)?;
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    fn scan_file(&self, id: &ScanId) -> PathBuf {
        self.scans_dir.join(format!("{}.json", id))
    }
}
