//! CLI handler for `vitrine build`.

use crate::cli::output::{self, Styled};
use crate::pipeline::{build, BuildOptions};
use anyhow::Result;
use std::time::Instant;

/// Clean every harvested export and load the store.
pub fn run(mut options: BuildOptions) -> Result<()> {
    let s = Styled::new();
    let start = Instant::now();

    options.show_progress = !output::is_quiet() && !output::is_json();
    let report = build(&options)?;
    let elapsed = start.elapsed();

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "db": options.db_path.display().to_string(),
            "departments": report.departments,
            "processed": report.outcomes,
            "skipped_dirs": report.skipped_dirs,
            "duration_ms": elapsed.as_millis() as u64,
        }));
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }

    eprintln!();
    output::print_section(&s, "Build");
    for outcome in &report.outcomes {
        let dropped = outcome.rejected + outcome.duplicates_dropped;
        let sym = if dropped == 0 { s.ok_sym() } else { s.warn_sym() };
        output::print_check(
            sym,
            &format!("dept {}:", outcome.department_id),
            &format!(
                "{} artworks in, {} already stored",
                outcome.load.art_inserted, outcome.load.art_skipped
            ),
        );
        if dropped > 0 {
            output::print_detail(&format!(
                "{} rejected, {} duplicate rows dropped",
                outcome.rejected, outcome.duplicates_dropped
            ));
        }
    }
    if report.skipped_dirs > 0 {
        eprintln!();
        eprintln!(
            "  {} {} directories skipped (see warnings above)",
            s.warn_sym(),
            report.skipped_dirs
        );
    }

    let time_str = if elapsed.as_millis() < 1000 {
        format!("{}ms", elapsed.as_millis())
    } else {
        format!("{:.1}s", elapsed.as_secs_f64())
    };
    output::print_status(
        &s,
        &s.green("OK"),
        &format!(
            "{} artworks, {} artists loaded in {time_str}",
            report.art_inserted(),
            report.artists_inserted()
        ),
    );
    Ok(())
}
