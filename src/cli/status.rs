//! Show the data directory and store at a glance.

use crate::acquisition::Progress;
use crate::cli::output::{self, Styled};
use crate::config::DataLayout;
use crate::store::CollectionStore;
use anyhow::Result;
use std::path::Path;

pub fn run(layout: &DataLayout, db_path: &Path) -> Result<()> {
    let s = Styled::new();

    let departments_listed = std::fs::read_to_string(layout.departments_file())
        .map(|raw| raw.lines().filter(|l| !l.trim().is_empty()).count())
        .unwrap_or(0);
    let harvested = layout.department_dirs().unwrap_or_default();

    if output::is_json() {
        let dirs: Vec<serde_json::Value> = harvested
            .iter()
            .map(|d| {
                let processed = Progress::load(&d.progress_file())
                    .map(|p| p.len())
                    .unwrap_or(0);
                let objects_bytes = d
                    .objects_file()
                    .metadata()
                    .map(|m| m.len())
                    .unwrap_or(0);
                serde_json::json!({
                    "department_id": d.department_id,
                    "dir": d.dir.display().to_string(),
                    "processed": processed,
                    "objects_bytes": objects_bytes,
                })
            })
            .collect();
        let counts = CollectionStore::open(db_path)
            .and_then(|store| Ok(store.integrity_report()?))
            .ok();
        output::print_json(&serde_json::json!({
            "data_dir": layout.root().display().to_string(),
            "departments_listed": departments_listed,
            "harvested": dirs,
            "db": db_path.display().to_string(),
            "store": counts,
        }));
        return Ok(());
    }

    output::print_header(&s);

    output::print_section(&s, "Data");
    output::print_check(" ", "Directory:", &layout.root().display().to_string());
    output::print_check(
        " ",
        "Departments:",
        &format!("{departments_listed} listed, {} harvested", harvested.len()),
    );
    eprintln!();

    if !harvested.is_empty() {
        output::print_section(&s, "Harvested");
        for dept in &harvested {
            let name = dept
                .dir
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("?");
            let processed = Progress::load(&dept.progress_file())
                .map(|p| p.len())
                .unwrap_or(0);
            let size = dept
                .objects_file()
                .metadata()
                .map(|m| output::format_size(m.len()))
                .unwrap_or_else(|_| "-".to_string());
            let ago = dept
                .progress_file()
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|t| t.elapsed().ok())
                .map(|d| output::format_duration(d.as_secs()) + " ago")
                .unwrap_or_else(|| "never".to_string());
            eprintln!(
                "    {:<28} {:>6} objects   {:>10}   {:>12}",
                name,
                processed,
                size,
                s.dim(&ago)
            );
        }
        eprintln!();
    }

    output::print_section(&s, "Store");
    if db_path.exists() {
        let size = db_path
            .metadata()
            .map(|m| output::format_size(m.len()))
            .unwrap_or_else(|_| "?".to_string());
        output::print_check(" ", "Path:", &format!("{} ({size})", db_path.display()));
        match CollectionStore::open(db_path).and_then(|store| Ok(store.integrity_report()?)) {
            Ok(report) => {
                output::print_check(
                    " ",
                    "Rows:",
                    &format!(
                        "{} departments, {} artworks, {} artists",
                        report.departments, report.art, report.artists
                    ),
                );
            }
            Err(e) => {
                output::print_check(s.warn_sym(), "Rows:", &format!("unreadable ({e})"));
            }
        }
    } else {
        output::print_check(" ", "Path:", "(none)");
        output::print_detail("Run 'vitrine build' to create the store.");
    }

    Ok(())
}
