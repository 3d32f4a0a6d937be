//! Read queries the dashboard and CLI consume.

use crate::error::PipelineError;
use crate::ingest::UNKNOWN;
use crate::store::schema::CollectionStore;
use rusqlite::params;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// The closed set of fields a group query may aggregate on. Keeping this an
/// enum is what keeps the column name out of caller hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    Classification,
    Culture,
    Country,
    IsHighlight,
    IsPublicDomain,
}

impl GroupField {
    pub const ALL: [GroupField; 5] = [
        GroupField::Classification,
        GroupField::Culture,
        GroupField::Country,
        GroupField::IsHighlight,
        GroupField::IsPublicDomain,
    ];

    /// The Art column this field aggregates.
    pub fn column(&self) -> &'static str {
        match self {
            GroupField::Classification => "classification",
            GroupField::Culture => "culture",
            GroupField::Country => "country",
            GroupField::IsHighlight => "isHighlight",
            GroupField::IsPublicDomain => "isPublicDomain",
        }
    }

    fn is_boolean(&self) -> bool {
        matches!(self, GroupField::IsHighlight | GroupField::IsPublicDomain)
    }
}

impl fmt::Display for GroupField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for GroupField {
    type Err = String;

    /// Case-insensitive column name match; "all" reads as classification,
    /// the catch-all grouping the dashboard starts on.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(GroupField::Classification);
        }
        GroupField::ALL
            .into_iter()
            .find(|f| f.column().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let known: Vec<&str> = GroupField::ALL.iter().map(|f| f.column()).collect();
                format!("unknown field `{s}` (expected one of: {}, all)", known.join(", "))
            })
    }
}

/// One category and how many artworks fall into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub category: String,
    pub count: i64,
}

/// One artwork's display metadata, with boolean flags already rendered
/// as the labels the dashboard shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailRecord {
    pub title: String,
    pub culture: Option<String>,
    pub country: Option<String>,
    pub classification: Option<String>,
    pub artist: String,
    pub is_highlight: String,
    pub is_public_domain: String,
}

/// Row counts and invariant violations, for `vitrine verify`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IntegrityReport {
    pub departments: i64,
    pub objects: i64,
    pub art: i64,
    pub artists: i64,
    /// Art rows with no ObjectLink row.
    pub unlinked_art: i64,
    /// ObjectLink rows pointing at a department the store does not know.
    pub orphan_links: i64,
    /// Art rows whose title is null or empty.
    pub untitled_art: i64,
    /// Artist rows keyed by the sentinel or the empty string.
    pub sentinel_artists: i64,
    /// Art rows referencing an artist key with no Artists row. Tolerated,
    /// reported for visibility.
    pub unmatched_artist_refs: i64,
}

impl IntegrityReport {
    /// True when every enforced invariant holds.
    pub fn is_clean(&self) -> bool {
        self.unlinked_art == 0
            && self.orphan_links == 0
            && self.untitled_art == 0
            && self.sentinel_artists == 0
    }
}

impl CollectionStore {
    /// Department display names, sorted.
    pub fn list_departments(&self) -> Result<Vec<String>, PipelineError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT display_name FROM Department ORDER BY display_name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<_, _>>()?;
        Ok(names)
    }

    /// Category counts for one department and field, largest first.
    ///
    /// Null categories read as "Unknown"; boolean fields read as
    /// "Yes"/"No"/"Unknown".
    pub fn group_counts(
        &self,
        department: &str,
        field: GroupField,
    ) -> Result<Vec<GroupCount>, PipelineError> {
        let column = field.column();
        let sql = format!(
            "SELECT Art.{column} AS category, COUNT(*) AS n
             FROM Art
             JOIN Objects ON Art.object_id = Objects.object_id
             JOIN Department ON Department.department_id = Objects.department_id
             WHERE Department.display_name = ?1
             GROUP BY Art.{column}
             ORDER BY n DESC"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = if field.is_boolean() {
            stmt.query_map(params![department], |row| {
                Ok(GroupCount {
                    category: flag_label(row.get(0)?),
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<_, _>>()?
        } else {
            stmt.query_map(params![department], |row| {
                let raw: Option<String> = row.get(0)?;
                Ok(GroupCount {
                    category: raw.unwrap_or_else(|| UNKNOWN.to_string()),
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<_, _>>()?
        };

        Ok(rows)
    }

    /// Display metadata for every artwork in one department. Artworks with
    /// no matching artist read as "Unknown"; flags read as labels.
    pub fn detail_records(&self, department: &str) -> Result<Vec<DetailRecord>, PipelineError> {
        let mut stmt = self.conn.prepare(
            "SELECT Art.title, Art.culture, Art.country, Art.classification,
                    COALESCE(Artists.artistName, 'Unknown') AS artist,
                    Art.isHighlight, Art.isPublicDomain
             FROM Art
             JOIN Objects ON Art.object_id = Objects.object_id
             JOIN Department ON Department.department_id = Objects.department_id
             LEFT JOIN Artists ON Art.artistAlphaSort = Artists.artistAlphaSort
             WHERE Department.display_name = ?1
             ORDER BY Art.object_id",
        )?;

        let records = stmt
            .query_map(params![department], |row| {
                Ok(DetailRecord {
                    title: row.get(0)?,
                    culture: row.get(1)?,
                    country: row.get(2)?,
                    classification: row.get(3)?,
                    artist: row.get(4)?,
                    is_highlight: flag_label(row.get(5)?),
                    is_public_domain: flag_label(row.get(6)?),
                })
            })?
            .collect::<Result<_, _>>()?;

        Ok(records)
    }

    /// Count rows and invariant violations across the whole store.
    pub fn integrity_report(&self) -> Result<IntegrityReport, PipelineError> {
        let count = |sql: &str| -> Result<i64, PipelineError> {
            Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
        };

        Ok(IntegrityReport {
            departments: count("SELECT COUNT(*) FROM Department")?,
            objects: count("SELECT COUNT(*) FROM Objects")?,
            art: count("SELECT COUNT(*) FROM Art")?,
            artists: count("SELECT COUNT(*) FROM Artists")?,
            unlinked_art: count(
                "SELECT COUNT(*) FROM Art
                 LEFT JOIN Objects ON Art.object_id = Objects.object_id
                 WHERE Objects.object_id IS NULL",
            )?,
            orphan_links: count(
                "SELECT COUNT(*) FROM Objects
                 LEFT JOIN Department ON Objects.department_id = Department.department_id
                 WHERE Department.department_id IS NULL",
            )?,
            untitled_art: count("SELECT COUNT(*) FROM Art WHERE title IS NULL OR title = ''")?,
            sentinel_artists: count(
                "SELECT COUNT(*) FROM Artists
                 WHERE artistAlphaSort = '' OR LOWER(artistAlphaSort) = 'unknown'",
            )?,
            unmatched_artist_refs: count(
                "SELECT COUNT(*) FROM Art
                 LEFT JOIN Artists ON Art.artistAlphaSort = Artists.artistAlphaSort
                 WHERE Art.artistAlphaSort IS NOT NULL AND Artists.artistAlphaSort IS NULL",
            )?,
        })
    }
}

/// Stored boolean flag as the label the dashboard shows.
fn flag_label(value: Option<i64>) -> String {
    match value {
        None => UNKNOWN.to_string(),
        Some(0) => "No".to_string(),
        Some(_) => "Yes".to_string(),
    }
}

/// Relabel categories whose count falls strictly below `cutoff_ratio` of the
/// total as "Other <field>", re-sum, and sort largest first.
///
/// A category exactly at the cutoff is kept as-is.
pub fn collapse_small_groups(
    rows: &[GroupCount],
    cutoff_ratio: f64,
    field: GroupField,
) -> Vec<GroupCount> {
    let total: i64 = rows.iter().map(|r| r.count).sum();
    if total == 0 {
        return rows.to_vec();
    }
    let cutoff = cutoff_ratio * total as f64;

    let mut kept = Vec::with_capacity(rows.len());
    let mut collapsed = 0i64;
    for row in rows {
        if (row.count as f64) < cutoff {
            collapsed += row.count;
        } else {
            kept.push(row.clone());
        }
    }
    if collapsed > 0 {
        kept.push(GroupCount {
            category: format!("Other {}", field.column()),
            count: collapsed,
        });
    }
    kept.sort_by(|a, b| b.count.cmp(&a.count));
    kept
}
