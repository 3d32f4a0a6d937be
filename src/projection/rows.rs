//! Typed rows for the four target tables.

use serde::{Deserialize, Serialize};

/// One collection grouping, from the fixed reference list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentRow {
    pub department_id: i64,
    pub display_name: String,
}

/// Links one artwork to exactly one department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectLinkRow {
    pub object_id: i64,
    pub department_id: i64,
}

/// One physical artwork. Every column except the key and the title is
/// individually nullable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtRow {
    pub object_id: i64,
    pub is_highlight: Option<bool>,
    pub accession_year: Option<String>,
    pub is_public_domain: Option<bool>,
    pub primary_image: Option<String>,
    pub object_name: Option<String>,
    pub title: String,
    pub culture: Option<String>,
    pub period: Option<String>,
    pub dynasty: Option<String>,
    pub reign: Option<String>,
    pub portfolio: Option<String>,
    pub artist_alpha_sort: Option<String>,
    pub object_begin_date: Option<String>,
    pub object_end_date: Option<String>,
    pub medium: Option<String>,
    pub height: Option<f64>,
    pub width: Option<f64>,
    pub length: Option<f64>,
    pub credit_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub county: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub subregion: Option<String>,
    pub excavation: Option<String>,
    pub classification: Option<String>,
    /// Present in the schema; no source export carries it, so it is never
    /// populated.
    pub is_on_view: Option<bool>,
}

/// One artist identity, keyed by normalized sort-name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRow {
    /// Kept as a schema column but always loaded as null.
    pub artist_wikidata_url: Option<String>,
    pub artist_name: Option<String>,
    pub artist_alpha_sort: String,
    pub artist_nationality: Option<String>,
    pub artist_begin_date: Option<String>,
    pub artist_end_date: Option<String>,
}
