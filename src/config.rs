//! Data-directory layout and path resolution.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Get the vitrine data directory (~/.vitrine/).
pub fn vitrine_home() -> PathBuf {
    if let Ok(p) = std::env::var("VITRINE_DATA_DIR") {
        return PathBuf::from(p);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".vitrine")
}

/// On-disk layout of one data directory.
///
/// The harvester writes into it and the build reads out of it:
///
/// ```text
/// <root>/departments.jsonl
/// <root>/collection.db
/// <root>/<id>_<Safe_Name>/objects.jsonl
/// <root>/<id>_<Safe_Name>/artists.jsonl
/// <root>/<id>_<Safe_Name>/progress.json
/// <root>/<id>_<Safe_Name>/fetch_stats.json
/// ```
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The reference list of departments, one JSON record per line.
    pub fn departments_file(&self) -> PathBuf {
        self.root.join("departments.jsonl")
    }

    /// Default location of the built store.
    pub fn default_db_path(&self) -> PathBuf {
        self.root.join("collection.db")
    }

    /// Directory holding one department's export files.
    pub fn department_dir(&self, department_id: i64, display_name: &str) -> DepartmentPaths {
        let dir = self
            .root
            .join(format!("{department_id}_{}", safe_dir_name(display_name)));
        DepartmentPaths { department_id, dir }
    }

    /// Scan the root for existing department export directories.
    ///
    /// Returns them sorted by department id. Entries that do not follow the
    /// `<id>_<name>` convention are ignored.
    pub fn department_dirs(&self) -> Result<Vec<DepartmentPaths>> {
        let mut found = Vec::new();
        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("failed to read data dir: {}", self.root.display()))?;

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some((id_part, _)) = name.split_once('_') else {
                continue;
            };
            if let Ok(department_id) = id_part.parse::<i64>() {
                found.push(DepartmentPaths {
                    department_id,
                    dir: path,
                });
            }
        }

        found.sort_by_key(|d| d.department_id);
        Ok(found)
    }
}

/// Paths to one department's export files.
#[derive(Debug, Clone)]
pub struct DepartmentPaths {
    pub department_id: i64,
    pub dir: PathBuf,
}

impl DepartmentPaths {
    pub fn objects_file(&self) -> PathBuf {
        self.dir.join("objects.jsonl")
    }

    pub fn artists_file(&self) -> PathBuf {
        self.dir.join("artists.jsonl")
    }

    pub fn progress_file(&self) -> PathBuf {
        self.dir.join("progress.json")
    }

    pub fn stats_file(&self) -> PathBuf {
        self.dir.join("fetch_stats.json")
    }
}

/// Make a display name safe for use as a directory name.
///
/// Non-alphanumeric characters become underscores, so
/// "Arts of Africa, Oceania, and the Americas" stays one path segment.
pub fn safe_dir_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
