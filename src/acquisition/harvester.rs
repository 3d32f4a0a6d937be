//! Department-by-department harvest into JSONL exports.
//!
//! Each department gets its own directory of append-only exports plus a
//! progress file, so sessions can stop at the cap and resume later without
//! refetching. Object records land as the API serves them, with only the
//! owning department and the fetched id injected; artist rows get their
//! lifespan years normalized to timestamps on the way out.

use crate::acquisition::client::{ApiDepartment, CollectionClient, ObjectFetch};
use crate::acquisition::progress::{Progress, SessionStats};
use crate::config::DataLayout;
use crate::ingest::Record;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{HashSet, VecDeque};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Successful fetches one session will bank per department.
const SESSION_SUCCESS_LIMIT: u64 = 75;
/// Flush progress to disk after this many successes.
const FLUSH_EVERY: u64 = 25;
/// Back off this long after the API throttles a request.
const THROTTLE_BACKOFF: Duration = Duration::from_secs(10);
/// End the department session after this many throttles in a row.
const MAX_CONSECUTIVE_THROTTLES: u32 = 3;
/// Pause between back-to-back sessions in auto mode.
const SESSION_DELAY: Duration = Duration::from_secs(60);

/// What a harvest session should fetch.
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    pub layout: DataLayout,
    /// Restrict the session to these department ids when non-empty.
    pub departments: Vec<i64>,
    /// Cap on successful fetches per department for each session.
    pub success_limit: u64,
    /// Keep running sessions until the department is exhausted.
    pub auto: bool,
    /// Pause between sessions in auto mode.
    pub session_delay: Duration,
    pub throttle_backoff: Duration,
    pub show_progress: bool,
}

impl HarvestOptions {
    pub fn new(layout: DataLayout) -> Self {
        Self {
            layout,
            departments: Vec::new(),
            success_limit: SESSION_SUCCESS_LIMIT,
            auto: false,
            session_delay: SESSION_DELAY,
            throttle_backoff: THROTTLE_BACKOFF,
            show_progress: false,
        }
    }
}

/// Summary of one harvest run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HarvestReport {
    /// Departments in the refreshed reference list.
    pub departments: usize,
    pub sessions: Vec<SessionStats>,
}

impl HarvestReport {
    pub fn fetched(&self) -> u64 {
        self.sessions.iter().map(|s| s.succeeded).sum()
    }
}

/// Drives the collection client over every selected department.
pub struct Harvester {
    client: CollectionClient,
}

impl Harvester {
    pub fn new(client: CollectionClient) -> Self {
        Self { client }
    }

    /// Refresh the department list, then run capped sessions over each
    /// selected department. A department that fails mid-session is logged
    /// and skipped; its progress file keeps whatever it banked.
    pub async fn run(&self, options: &HarvestOptions) -> Result<HarvestReport> {
        let departments = self.client.departments().await?;
        write_departments(&options.layout, &departments)?;
        info!("refreshed department list ({} departments)", departments.len());

        for id in &options.departments {
            if !departments.iter().any(|d| d.department_id == *id) {
                warn!("department {id} is not in the published list");
            }
        }
        let selected: Vec<&ApiDepartment> = departments
            .iter()
            .filter(|d| {
                options.departments.is_empty() || options.departments.contains(&d.department_id)
            })
            .collect();

        let mut report = HarvestReport {
            departments: departments.len(),
            ..Default::default()
        };
        for dept in selected {
            match self.harvest_department(dept, options).await {
                Ok(sessions) => report.sessions.extend(sessions),
                Err(e) => warn!("department {} harvest failed: {e:#}", dept.department_id),
            }
        }

        info!(
            "harvest complete: {} objects fetched across {} departments",
            report.fetched(),
            report.sessions.len(),
        );
        Ok(report)
    }

    /// Run one session against a department, or back-to-back sessions in
    /// auto mode until its queue drains. Repeated throttling ends the
    /// department early either way.
    async fn harvest_department(
        &self,
        dept: &ApiDepartment,
        options: &HarvestOptions,
    ) -> Result<Vec<SessionStats>> {
        let paths = options
            .layout
            .department_dir(dept.department_id, &dept.display_name);
        fs::create_dir_all(&paths.dir)
            .with_context(|| format!("failed to create {}", paths.dir.display()))?;

        let mut progress = Progress::load(&paths.progress_file())?;
        let ids = self.client.object_ids(dept.department_id).await?;
        let mut queue: VecDeque<i64> = ids
            .iter()
            .copied()
            .filter(|id| !progress.contains(*id))
            .collect();
        info!(
            "department {} ({}): {} of {} objects still to fetch",
            dept.department_id,
            dept.display_name,
            queue.len(),
            ids.len(),
        );

        let mut objects_out = open_append(&paths.objects_file())?;
        let mut artists_out = open_append(&paths.artists_file())?;
        let mut seen_artists = load_artist_names(&paths.artists_file())?;

        let mut sessions = Vec::new();
        loop {
            let target = options.success_limit.min(queue.len() as u64);
            let bar = session_bar(options.show_progress, target, &dept.display_name);

            let mut stats = SessionStats::begin(dept.department_id);
            let mut consecutive_throttles = 0u32;
            let mut throttled_out = false;

            while stats.succeeded < options.success_limit {
                let Some(object_id) = queue.pop_front() else {
                    break;
                };
                stats.attempted += 1;

                match self.client.object(object_id).await {
                    Ok(ObjectFetch::Record(record)) => {
                        consecutive_throttles = 0;
                        if let Some((name, artist)) = extract_artist(&record) {
                            if seen_artists.insert(name) {
                                append_jsonl(&mut artists_out, &artist)?;
                                stats.artists_written += 1;
                            }
                        }
                        let prepared = prepare_object(*record, dept.department_id, object_id);
                        append_jsonl(&mut objects_out, &prepared)?;
                        progress.mark(object_id);
                        stats.succeeded += 1;
                        bar.inc(1);
                        if stats.succeeded % FLUSH_EVERY == 0 {
                            progress.save(&paths.progress_file())?;
                        }
                    }
                    Ok(ObjectFetch::Forbidden) => {
                        consecutive_throttles = 0;
                        debug!("object {object_id} is forbidden");
                        progress.mark(object_id);
                        stats.forbidden += 1;
                    }
                    Ok(ObjectFetch::RateLimited) => {
                        consecutive_throttles += 1;
                        queue.push_front(object_id);
                        if consecutive_throttles >= MAX_CONSECUTIVE_THROTTLES {
                            warn!(
                                "department {}: throttled {consecutive_throttles} times in a row, ending session",
                                dept.department_id,
                            );
                            throttled_out = true;
                            break;
                        }
                        warn!("throttled fetching object {object_id}, backing off");
                        tokio::time::sleep(options.throttle_backoff).await;
                    }
                    Err(e) => {
                        consecutive_throttles = 0;
                        warn!("object {object_id} failed: {e:#}");
                        progress.mark(object_id);
                        stats.failed += 1;
                    }
                }
            }

            bar.finish_and_clear();
            progress.save(&paths.progress_file())?;
            stats.finish();
            stats.write(&paths.stats_file())?;
            info!(
                "department {}: fetched {}, forbidden {}, failed {}, {} new artists",
                dept.department_id, stats.succeeded, stats.forbidden, stats.failed, stats.artists_written,
            );
            sessions.push(stats);

            if !options.auto || throttled_out || queue.is_empty() {
                break;
            }
            info!(
                "department {}: {} objects left, next session in {}s",
                dept.department_id,
                queue.len(),
                options.session_delay.as_secs(),
            );
            tokio::time::sleep(options.session_delay).await;
        }
        Ok(sessions)
    }
}

/// Rewrite the department reference list from the live API.
fn write_departments(layout: &DataLayout, departments: &[ApiDepartment]) -> Result<()> {
    fs::create_dir_all(layout.root())
        .with_context(|| format!("failed to create {}", layout.root().display()))?;
    let path = layout.departments_file();
    let mut out =
        File::create(&path).with_context(|| format!("failed to write {}", path.display()))?;
    for dept in departments {
        let line = json!({
            "department_id": dept.department_id,
            "displayName": dept.display_name,
        });
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))
}

fn append_jsonl(file: &mut File, record: &Record) -> Result<()> {
    let line = serde_json::to_string(record)?;
    writeln!(file, "{line}")?;
    Ok(())
}

/// Display names already present in an artists export, so reruns append
/// only artists the file has never seen.
fn load_artist_names(path: &Path) -> Result<HashSet<String>> {
    let mut names = HashSet::new();
    if !path.exists() {
        return Ok(names);
    }
    let file =
        File::open(path).with_context(|| format!("failed to read {}", path.display()))?;
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let Ok(record) = serde_json::from_str::<Record>(&line) else {
            continue;
        };
        if let Some(name) = record.get("artist_name").and_then(Value::as_str) {
            names.insert(name.to_string());
        }
    }
    Ok(names)
}

/// Pull the artist fields out of an object record. Returns the display
/// name and the export row, or nothing when the object names no artist.
fn extract_artist(record: &Record) -> Option<(String, Record)> {
    let name = record.get("artistDisplayName")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }

    let alpha = record
        .get("artistAlphaSort")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(name);

    let mut artist = Record::new();
    artist.insert("artist_name".to_string(), Value::String(name.to_string()));
    artist.insert("artistAlphaSort".to_string(), Value::String(alpha.to_string()));
    artist.insert(
        "artistNationality".to_string(),
        record.get("artistNationality").cloned().unwrap_or(Value::Null),
    );
    for key in ["artistBeginDate", "artistEndDate"] {
        let converted = year_to_timestamp(record.get(key).unwrap_or(&Value::Null));
        artist.insert(key.to_string(), converted);
    }
    Some((name.to_string(), artist))
}

/// Stamp the owning department and fetched id into a record. Everything
/// else passes through exactly as the API served it.
fn prepare_object(mut record: Record, department_id: i64, object_id: i64) -> Record {
    record.insert("department_id".to_string(), Value::from(department_id));
    record.insert("object_id".to_string(), Value::from(object_id));
    record
}

/// Positive years, bare or quoted, become `YYYY-01-01T00:00:00`;
/// anything else is null.
fn year_to_timestamp(value: &Value) -> Value {
    let year = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match year {
        Some(y) if y > 0 => Value::String(format!("{y}-01-01T00:00:00")),
        _ => Value::Null,
    }
}

fn session_bar(show: bool, target: u64, label: &str) -> ProgressBar {
    if !show || target == 0 {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(target);
    bar.set_style(
        ProgressStyle::with_template("  {bar:30.cyan} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("\u{2588}\u{2593}\u{2591}"),
    );
    bar.set_message(label.to_string());
    bar
}
