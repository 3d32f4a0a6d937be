//! Resumable harvest progress and per-session fetch stats.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Which object ids a department harvest has already handled. Persisted as
/// JSON beside the exports so interrupted sessions resume where they left
/// off.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Progress {
    #[serde(rename = "processed_objects")]
    processed: BTreeSet<i64>,
    #[serde(rename = "last_updated")]
    updated_at: Option<String>,
}

impl Progress {
    /// Load saved progress, or start fresh when none exists.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("malformed progress file {}", path.display()))
    }

    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.updated_at = Some(Utc::now().to_rfc3339());
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw).with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn contains(&self, object_id: i64) -> bool {
        self.processed.contains(&object_id)
    }

    /// Record an object as handled. Returns false when it already was.
    pub fn mark(&mut self, object_id: i64) -> bool {
        self.processed.insert(object_id)
    }

    pub fn len(&self) -> usize {
        self.processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }
}

/// Counters for one department's harvest session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub department_id: i64,
    pub attempted: u64,
    pub succeeded: u64,
    pub forbidden: u64,
    pub failed: u64,
    pub artists_written: u64,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
}

impl SessionStats {
    pub fn begin(department_id: i64) -> Self {
        Self {
            department_id,
            started_at: Some(Utc::now().to_rfc3339()),
            ..Default::default()
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now().to_rfc3339());
    }

    /// Write the stats beside the exports, replacing the previous session's.
    pub fn write(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw).with_context(|| format!("failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_progress_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");

        let mut progress = Progress::default();
        assert!(progress.mark(10));
        assert!(progress.mark(3));
        assert!(!progress.mark(10));
        progress.save(&path).unwrap();

        let restored = Progress::load(&path).unwrap();
        assert_eq!(restored.len(), 2);
        assert!(restored.contains(3));
        assert!(!restored.contains(4));
    }

    #[test]
    fn test_progress_missing_file_starts_fresh() {
        let dir = TempDir::new().unwrap();
        let progress = Progress::load(&dir.path().join("progress.json")).unwrap();
        assert!(progress.is_empty());
    }

    #[test]
    fn test_progress_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(&path, "not json").unwrap();
        assert!(Progress::load(&path).is_err());
    }

    #[test]
    fn test_stats_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fetch_stats.json");

        let mut stats = SessionStats::begin(6);
        stats.succeeded = 75;
        stats.finish();
        stats.write(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let parsed: SessionStats = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.department_id, 6);
        assert_eq!(parsed.succeeded, 75);
        assert!(parsed.finished_at.is_some());
    }
}
