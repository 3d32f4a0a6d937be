//! Store integrity checks for `vitrine verify`.
//!
//! Exits non-zero when an enforced invariant is violated, so scripted
//! rebuilds can gate on it.

use crate::cli::output::{self, Styled};
use crate::store::CollectionStore;
use anyhow::Result;
use std::path::Path;

pub fn run(db_path: &Path) -> Result<()> {
    let s = Styled::new();

    if !db_path.exists() {
        if output::is_json() {
            output::print_json(&serde_json::json!({
                "db": db_path.display().to_string(),
                "exists": false,
            }));
        } else {
            eprintln!(
                "  No store at {}. Run 'vitrine build' first.",
                db_path.display()
            );
        }
        std::process::exit(1);
    }

    let store = CollectionStore::open(db_path)?;
    let report = store.integrity_report()?;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "db": db_path.display().to_string(),
            "exists": true,
            "clean": report.is_clean(),
            "report": report,
        }));
        if !report.is_clean() {
            std::process::exit(1);
        }
        return Ok(());
    }

    output::print_header(&s);

    output::print_section(&s, "Tables");
    output::print_check(s.ok_sym(), "Department:", &format!("{} rows", report.departments));
    output::print_check(s.ok_sym(), "Objects:", &format!("{} rows", report.objects));
    output::print_check(s.ok_sym(), "Art:", &format!("{} rows", report.art));
    output::print_check(s.ok_sym(), "Artists:", &format!("{} rows", report.artists));
    eprintln!();

    output::print_section(&s, "Invariants");
    invariant_check(&s, "Linked art:", report.unlinked_art, "every artwork has an Objects row");
    if report.unlinked_art > 0 {
        output::print_detail("Rebuild with 'vitrine build' to restore links.");
    }
    invariant_check(&s, "Departments:", report.orphan_links, "every object points at a known department");
    if report.orphan_links > 0 {
        output::print_detail("Re-run 'vitrine harvest' to refresh the department list, then rebuild.");
    }
    invariant_check(&s, "Titles:", report.untitled_art, "no empty titles");
    invariant_check(&s, "Artist keys:", report.sentinel_artists, "no placeholder artist keys");
    if report.unmatched_artist_refs > 0 {
        output::print_check(
            s.info_sym(),
            "Artist refs:",
            &format!(
                "{} artworks cite an artist the store has not seen",
                report.unmatched_artist_refs
            ),
        );
    } else {
        output::print_check(s.ok_sym(), "Artist refs:", "every cited artist is stored");
    }

    if report.is_clean() {
        output::print_status(&s, &s.green("CLEAN"), "all invariants hold");
        Ok(())
    } else {
        output::print_status(&s, &s.red("ISSUES"), "fix the failures above");
        std::process::exit(1);
    }
}

fn invariant_check(s: &Styled, label: &str, violations: i64, holds: &str) {
    if violations == 0 {
        output::print_check(s.ok_sym(), label, holds);
    } else {
        output::print_check(s.fail_sym(), label, &format!("{violations} violations"));
    }
}
