//! The clean-and-build pipeline, from harvested JSONL to the relational store.
//!
//! Departments load first so every later batch has a reference row to point
//! at. Each department directory is then cleaned and loaded independently:
//! a directory with unreadable exports is skipped with a warning, while a
//! store conflict aborts the whole run.

use crate::config::{DataLayout, DepartmentPaths};
use crate::ingest::{lift_dimensions, normalize, ImputationPolicy, RecordBatch};
use crate::projection::{project_batch, project_departments};
use crate::store::{CollectionStore, DepartmentLoad, LoadReport};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

/// What a build run should read and write.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub layout: DataLayout,
    pub db_path: PathBuf,
    pub department_mode: DepartmentLoad,
    pub show_progress: bool,
}

impl BuildOptions {
    pub fn new(layout: DataLayout) -> Self {
        let db_path = layout.default_db_path();
        Self {
            layout,
            db_path,
            department_mode: DepartmentLoad::Append,
            show_progress: false,
        }
    }
}

/// Per-department result of one build run.
#[derive(Debug, Clone, Serialize)]
pub struct DepartmentOutcome {
    pub department_id: i64,
    pub objects_read: usize,
    pub artists_read: usize,
    pub rejected: usize,
    pub duplicates_dropped: usize,
    pub excluded_artists: usize,
    pub load: LoadReport,
}

/// Summary of one build run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    /// Department reference rows loaded.
    pub departments: usize,
    pub outcomes: Vec<DepartmentOutcome>,
    /// Department directories skipped over missing or unreadable exports.
    pub skipped_dirs: usize,
}

impl BuildReport {
    pub fn art_inserted(&self) -> usize {
        self.outcomes.iter().map(|o| o.load.art_inserted).sum()
    }

    pub fn artists_inserted(&self) -> usize {
        self.outcomes.iter().map(|o| o.load.artists_inserted).sum()
    }
}

/// Clean one department's object export: blank strings become nulls,
/// measurements lift into flat dimension columns, then declared fills apply.
pub fn clean_objects(batch: &RecordBatch) -> RecordBatch {
    let normalized = normalize(batch);
    let lifted = lift_dimensions(&normalized);
    ImputationPolicy::objects().apply(&lifted)
}

/// Clean one department's artist export.
pub fn clean_artists(batch: &RecordBatch) -> RecordBatch {
    let normalized = normalize(batch);
    ImputationPolicy::artists().apply(&normalized)
}

/// Run the full build: seed departments, then clean and load every
/// harvested department directory.
pub fn build(options: &BuildOptions) -> Result<BuildReport> {
    let departments_file = options.layout.departments_file();
    let batch = RecordBatch::from_jsonl(&departments_file)
        .with_context(|| format!("failed to read {}", departments_file.display()))?;
    let departments = project_departments(&batch).context("department list is not loadable")?;

    let mut store = CollectionStore::open(&options.db_path)?;
    store.load_departments(&departments, options.department_mode)?;
    info!("seeded {} departments", departments.len());

    let mut report = BuildReport {
        departments: departments.len(),
        ..Default::default()
    };

    let dirs = options.layout.department_dirs()?;
    let bar = department_bar(options.show_progress, dirs.len() as u64);
    for dept in &dirs {
        let name = dept.dir.file_name().and_then(|n| n.to_str()).unwrap_or("?");
        bar.set_message(name.to_string());
        match load_department(&mut store, dept)? {
            Some(outcome) => report.outcomes.push(outcome),
            None => report.skipped_dirs += 1,
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    info!(
        "build complete: {} departments processed, {} skipped, {} artworks and {} artists inserted",
        report.outcomes.len(),
        report.skipped_dirs,
        report.art_inserted(),
        report.artists_inserted(),
    );
    Ok(report)
}

/// Clean and load one department directory. Returns `None` when the
/// directory has nothing usable to load.
fn load_department(
    store: &mut CollectionStore,
    dept: &DepartmentPaths,
) -> Result<Option<DepartmentOutcome>> {
    let objects_file = dept.objects_file();
    if !objects_file.exists() {
        warn!(
            "department {} has no objects export, skipping",
            dept.department_id
        );
        return Ok(None);
    }

    let objects = match RecordBatch::from_jsonl(&objects_file) {
        Ok(batch) => batch,
        Err(e) => {
            warn!(
                "skipping department {}: {}: {e}",
                dept.department_id,
                objects_file.display()
            );
            return Ok(None);
        }
    };

    let artists_file = dept.artists_file();
    let artists = if artists_file.exists() {
        match RecordBatch::from_jsonl(&artists_file) {
            Ok(batch) => batch,
            Err(e) => {
                warn!(
                    "skipping department {}: {}: {e}",
                    dept.department_id,
                    artists_file.display()
                );
                return Ok(None);
            }
        }
    } else {
        RecordBatch::default()
    };

    let objects_read = objects.len();
    let artists_read = artists.len();

    let cleaned_objects = clean_objects(&objects);
    let cleaned_artists = clean_artists(&artists);
    let projected = project_batch(dept.department_id, &cleaned_objects, &cleaned_artists);

    let load = store
        .load_batch(&projected)
        .with_context(|| format!("failed to load department {}", dept.department_id))?;

    Ok(Some(DepartmentOutcome {
        department_id: dept.department_id,
        objects_read,
        artists_read,
        rejected: projected.rejected,
        duplicates_dropped: projected.duplicates_dropped,
        excluded_artists: projected.excluded_artists,
        load,
    }))
}

fn department_bar(show: bool, total: u64) -> ProgressBar {
    if !show || total == 0 {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("  {bar:30.cyan} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("\u{2588}\u{2593}\u{2591}"),
    );
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write_jsonl(path: &std::path::Path, rows: &[serde_json::Value]) {
        let lines: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
        fs::write(path, lines.join("\n")).unwrap();
    }

    fn seed_data_dir(root: &std::path::Path) {
        write_jsonl(
            &root.join("departments.jsonl"),
            &[
                json!({"department_id": 6, "displayName": "Asian Art"}),
                json!({"department_id": 11, "displayName": "European Paintings"}),
            ],
        );

        let asian = root.join("6_Asian_Art");
        fs::create_dir_all(&asian).unwrap();
        write_jsonl(
            &asian.join("objects.jsonl"),
            &[
                json!({
                    "objectID": 36, "department_id": 6, "title": "Ritual Vessel",
                    "culture": "", "classification": "Bronzes",
                    "measurements": [
                        {"elementName": "Overall",
                         "elementMeasurements": {"Height": 20.5, "Width": 16.0}}
                    ]
                }),
                json!({
                    "objectID": 37, "department_id": 6, "title": "Hanging Scroll",
                    "artistAlphaSort": "Qian Xuan"
                }),
                json!({"objectID": 38, "department_id": 6}),
                json!({"department_id": 6, "title": "Fragment"}),
            ],
        );
        write_jsonl(
            &asian.join("artists.jsonl"),
            &[
                json!({"artistAlphaSort": "Qian Xuan", "artist_name": "Qian Xuan",
                       "artistNationality": "Chinese"}),
            ],
        );
    }

    fn options_for(dir: &TempDir) -> BuildOptions {
        BuildOptions::new(DataLayout::new(dir.path()))
    }

    #[test]
    fn test_build_loads_and_reports() {
        let dir = TempDir::new().unwrap();
        seed_data_dir(dir.path());
        let options = options_for(&dir);

        let report = build(&options).unwrap();

        assert_eq!(report.departments, 2);
        assert_eq!(report.outcomes.len(), 1);
        let outcome = &report.outcomes[0];
        assert_eq!(outcome.objects_read, 4);
        // The record without an object id is rejected; the one without a
        // title was filled with the sentinel during imputation and loads.
        assert_eq!(outcome.rejected, 1);
        assert_eq!(outcome.load.art_inserted, 3);
        assert_eq!(outcome.load.artists_inserted, 1);

        let store = CollectionStore::open(&options.db_path).unwrap();
        let counts = store
            .group_counts("Asian Art", crate::store::GroupField::Culture)
            .unwrap();
        // The blank culture normalized to null and was imputed.
        assert!(counts.iter().any(|c| c.category == "Unknown"));
    }

    #[test]
    fn test_build_is_idempotent() {
        let dir = TempDir::new().unwrap();
        seed_data_dir(dir.path());
        let options = options_for(&dir);

        build(&options).unwrap();
        let second = build(&options).unwrap();

        let outcome = &second.outcomes[0];
        assert_eq!(outcome.load.art_inserted, 0);
        assert_eq!(outcome.load.art_skipped, 3);
        assert_eq!(outcome.load.artists_inserted, 0);

        let store = CollectionStore::open(&options.db_path).unwrap();
        let report = store.integrity_report().unwrap();
        assert_eq!(report.art, 3);
        assert_eq!(report.artists, 1);
        assert!(report.is_clean());
    }

    #[test]
    fn test_build_skips_department_without_objects() {
        let dir = TempDir::new().unwrap();
        seed_data_dir(dir.path());
        fs::create_dir_all(dir.path().join("11_European_Paintings")).unwrap();
        let options = options_for(&dir);

        let report = build(&options).unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.skipped_dirs, 1);
    }

    #[test]
    fn test_build_without_departments_file_fails() {
        let dir = TempDir::new().unwrap();
        let options = options_for(&dir);

        assert!(build(&options).is_err());
    }

    #[test]
    fn test_clean_objects_end_to_end() {
        let batch = RecordBatch::new(vec![
            json!({"objectID": 1, "title": "Jar", "culture": "",
                   "measurements": [{"elementName": "Overall",
                                     "elementMeasurements": {"Height": 10.0}}]})
                .as_object()
                .unwrap()
                .clone(),
            json!({"objectID": 2, "title": "Bowl", "height": 20.0})
                .as_object()
                .unwrap()
                .clone(),
        ]);

        let cleaned = clean_objects(&batch);

        assert_eq!(cleaned.rows()[0]["culture"], json!("Unknown"));
        assert_eq!(cleaned.rows()[0]["height"], json!(10.0));
        assert!(cleaned.rows()[0].get("measurements").is_none());
        assert_eq!(cleaned.rows()[1]["height"], json!(20.0));
        // Width has no readings at all, so the median fill is skipped.
        assert!(cleaned.rows()[1].get("width").is_none());
    }
}
