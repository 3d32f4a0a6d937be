//! CLI handler for `vitrine harvest`.

use crate::acquisition::{CollectionClient, HarvestOptions, Harvester};
use crate::cli::output::{self, Styled};
use crate::config::DataLayout;
use anyhow::Result;
use std::time::Duration;

/// Flags for one `vitrine harvest` invocation.
pub struct HarvestArgs {
    pub departments: Vec<i64>,
    pub list: bool,
    pub auto: bool,
    pub session_delay: u64,
    pub session_limit: Option<u64>,
}

/// Run harvest sessions against the live API, or print the department
/// list with `--list`.
pub async fn run(layout: DataLayout, args: HarvestArgs) -> Result<()> {
    let client = CollectionClient::new()?;
    if args.list {
        return list_departments(&client).await;
    }

    let s = Styled::new();
    let mut options = HarvestOptions::new(layout);
    options.departments = args.departments;
    options.auto = args.auto;
    options.session_delay = Duration::from_secs(args.session_delay);
    if let Some(limit) = args.session_limit {
        options.success_limit = limit;
    }
    options.show_progress = !output::is_quiet() && !output::is_json();

    let report = Harvester::new(client).run(&options).await?;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "departments": report.departments,
            "fetched": report.fetched(),
            "sessions": report.sessions,
        }));
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }

    eprintln!();
    output::print_section(&s, "Harvest");
    for session in &report.sessions {
        let sym = if session.failed == 0 {
            s.ok_sym()
        } else {
            s.warn_sym()
        };
        output::print_check(
            sym,
            &format!("dept {}:", session.department_id),
            &format!(
                "{} fetched, {} forbidden, {} failed, {} new artists",
                session.succeeded, session.forbidden, session.failed, session.artists_written
            ),
        );
    }
    output::print_status(
        &s,
        &s.green("DONE"),
        &format!(
            "{} objects fetched across {} sessions",
            report.fetched(),
            report.sessions.len()
        ),
    );
    Ok(())
}

/// Print the published department list without touching the data dir.
async fn list_departments(client: &CollectionClient) -> Result<()> {
    let departments = client.departments().await?;

    if output::is_json() {
        let rows: Vec<serde_json::Value> = departments
            .iter()
            .map(|d| {
                serde_json::json!({
                    "department_id": d.department_id,
                    "display_name": d.display_name,
                })
            })
            .collect();
        output::print_json(&serde_json::json!({ "departments": rows }));
        return Ok(());
    }

    let s = Styled::new();
    output::print_section(&s, "Departments");
    for dept in &departments {
        eprintln!("  {:>4}  {}", dept.department_id, dept.display_name);
    }
    Ok(())
}
