//! CLI handlers for `vitrine query`.

use crate::cli::output::{self, Styled};
use crate::store::{collapse_small_groups, CollectionStore, DetailRecord, GroupField};
use anyhow::Result;
use std::path::Path;

/// List department display names.
pub fn departments(db_path: &Path) -> Result<()> {
    let store = CollectionStore::open(db_path)?;
    let names = store.list_departments()?;

    if output::is_json() {
        output::print_json(&serde_json::json!({ "departments": names }));
        return Ok(());
    }
    if names.is_empty() {
        eprintln!("  No departments. Run 'vitrine build' first.");
        return Ok(());
    }

    for name in &names {
        eprintln!("  {name}");
    }
    print_row_footer(names.len());
    Ok(())
}

/// Category counts for one department and field, optionally collapsing
/// small categories into one bucket.
pub fn groups(
    db_path: &Path,
    department: &str,
    field: GroupField,
    collapse: Option<f64>,
) -> Result<()> {
    let store = CollectionStore::open(db_path)?;
    let mut rows = store.group_counts(department, field)?;
    if let Some(ratio) = collapse {
        rows = collapse_small_groups(&rows, ratio, field);
    }

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "department": department,
            "field": field.column(),
            "rows": rows,
        }));
        return Ok(());
    }
    if rows.is_empty() {
        eprintln!("  No artworks for department '{department}'.");
        return Ok(());
    }

    let s = Styled::new();
    let width = rows.iter().map(|r| r.category.len()).max().unwrap_or(0);
    for row in &rows {
        eprintln!(
            "  {:<width$}   {}",
            row.category,
            s.green(&format!("{:>7}", row.count)),
        );
    }
    print_row_footer(rows.len());
    Ok(())
}

/// Display metadata for artworks in one department.
pub fn details(db_path: &Path, department: &str, limit: Option<usize>) -> Result<()> {
    let store = CollectionStore::open(db_path)?;
    let mut records = store.detail_records(department)?;
    if let Some(limit) = limit {
        records.truncate(limit);
    }

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "department": department,
            "rows": records,
        }));
        return Ok(());
    }
    if records.is_empty() {
        eprintln!("  No artworks for department '{department}'.");
        return Ok(());
    }

    let s = Styled::new();
    let columns = ["Title", "Artist", "Classification", "Culture", "Country", "Highlight", "Public"];
    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    let cells: Vec<[String; 7]> = records.iter().map(detail_cells).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let header: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{:<width$}", c, width = widths[i]))
        .collect();
    eprintln!("  {}", s.dim(&header.join("   ")));
    for row in &cells {
        let parts: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect();
        eprintln!("  {}", parts.join("   "));
    }
    print_row_footer(cells.len());
    Ok(())
}

fn detail_cells(record: &DetailRecord) -> [String; 7] {
    [
        clip(&record.title, 48),
        clip(&record.artist, 28),
        text(&record.classification),
        text(&record.culture),
        text(&record.country),
        record.is_highlight.clone(),
        record.is_public_domain.clone(),
    ]
}

fn text(value: &Option<String>) -> String {
    value.as_deref().unwrap_or("-").to_string()
}

fn clip(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let cut: String = value.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}\u{2026}")
    }
}

fn print_row_footer(rows: usize) {
    let s = Styled::new();
    eprintln!();
    eprintln!("  {} rows", s.blue(&rows.to_string()));
}
