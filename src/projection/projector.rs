//! Batch-to-row projection for the three entity shapes.
//!
//! Column presence varies across historical exports, so every optional
//! source field is read leniently: absent and null are the same thing here.

use crate::error::PipelineError;
use crate::ingest::batch::{Record, RecordBatch};
use crate::ingest::UNKNOWN;
use crate::projection::rows::{ArtRow, ArtistRow, DepartmentRow, ObjectLinkRow};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Rows projected from one department's cleaned batch, ready for loading.
#[derive(Debug, Clone, Default)]
pub struct ProjectedBatch {
    pub department_id: i64,
    pub objects: Vec<ObjectLinkRow>,
    pub art: Vec<ArtRow>,
    pub artists: Vec<ArtistRow>,
    /// Object records dropped for missing identity or title.
    pub rejected: usize,
    /// Artist records excluded for missing, empty, or sentinel sort-name.
    pub excluded_artists: usize,
    /// Exact-duplicate rows dropped before emitting.
    pub duplicates_dropped: usize,
}

/// Project the department reference list.
///
/// Unlike object batches, a malformed reference record fails the projection:
/// every other table hangs off this list.
pub fn project_departments(batch: &RecordBatch) -> Result<Vec<DepartmentRow>, PipelineError> {
    let mut rows: Vec<DepartmentRow> = Vec::with_capacity(batch.len());

    for record in batch.rows() {
        let department_id =
            integer(record, "department_id").ok_or_else(|| PipelineError::MissingField {
                field: "department_id",
                context: "department record".to_string(),
            })?;
        // Exports wrote the camelCase API key; the store column is snake_case.
        let display_name = text(record, "displayName")
            .or_else(|| text(record, "display_name"))
            .ok_or_else(|| PipelineError::MissingField {
                field: "display_name",
                context: format!("department {department_id}"),
            })?;

        let row = DepartmentRow {
            department_id,
            display_name,
        };
        if !rows.contains(&row) {
            rows.push(row);
        }
    }

    Ok(rows)
}

/// Project one cleaned batch into ObjectLink, Art, and Artist rows.
///
/// Records without an object id or a title are rejected rather than loaded
/// with a null key; the rest of the batch is unaffected. Exact-duplicate
/// rows are dropped so a single export cannot write the same row twice.
pub fn project_batch(
    department_id: i64,
    objects: &RecordBatch,
    artists: &RecordBatch,
) -> ProjectedBatch {
    let mut out = ProjectedBatch {
        department_id,
        ..Default::default()
    };

    let mut linked: HashSet<i64> = HashSet::new();
    let mut art_by_id: HashMap<i64, Vec<usize>> = HashMap::new();

    for record in objects.rows() {
        let Some(object_id) = integer(record, "objectID").or_else(|| integer(record, "object_id"))
        else {
            debug!("rejecting object record with no object id");
            out.rejected += 1;
            continue;
        };
        let Some(title) = text(record, "title") else {
            debug!("rejecting object {object_id}: no title after imputation");
            out.rejected += 1;
            continue;
        };

        let row = art_row(object_id, title, record);

        // Same key with identical fields is a redundant write; same key with
        // different fields is left for the loader to refuse.
        let indices = art_by_id.entry(object_id).or_default();
        if indices.iter().any(|&i| out.art[i] == row) {
            out.duplicates_dropped += 1;
            continue;
        }
        indices.push(out.art.len());
        out.art.push(row);

        if linked.insert(object_id) {
            out.objects.push(ObjectLinkRow {
                object_id,
                department_id,
            });
        }
    }

    let mut artist_by_key: HashMap<String, Vec<usize>> = HashMap::new();

    for record in artists.rows() {
        let Some(key) = text(record, "artistAlphaSort") else {
            out.excluded_artists += 1;
            continue;
        };
        if key.is_empty() || key.eq_ignore_ascii_case(UNKNOWN) {
            out.excluded_artists += 1;
            continue;
        }

        let row = ArtistRow {
            artist_wikidata_url: None,
            // Exports write the name under a snake_case key; the remaining
            // fields keep the API's camelCase.
            artist_name: text(record, "artist_name"),
            artist_alpha_sort: key.clone(),
            artist_nationality: text(record, "artistNationality"),
            artist_begin_date: text(record, "artistBeginDate"),
            artist_end_date: text(record, "artistEndDate"),
        };

        let indices = artist_by_key.entry(key).or_default();
        if indices.iter().any(|&i| out.artists[i] == row) {
            out.duplicates_dropped += 1;
            continue;
        }
        indices.push(out.artists.len());
        out.artists.push(row);
    }

    out
}

fn art_row(object_id: i64, title: String, record: &Record) -> ArtRow {
    ArtRow {
        object_id,
        is_highlight: flag(record, "isHighlight"),
        accession_year: text(record, "accessionYear"),
        is_public_domain: flag(record, "isPublicDomain"),
        primary_image: text(record, "primaryImage"),
        object_name: text(record, "objectName"),
        title,
        culture: text(record, "culture"),
        period: text(record, "period"),
        dynasty: text(record, "dynasty"),
        reign: text(record, "reign"),
        portfolio: text(record, "portfolio"),
        artist_alpha_sort: text(record, "artistAlphaSort"),
        object_begin_date: text(record, "objectBeginDate"),
        object_end_date: text(record, "objectEndDate"),
        medium: text(record, "medium"),
        height: number(record, "height"),
        width: number(record, "width"),
        length: number(record, "length"),
        credit_line: text(record, "creditLine"),
        city: text(record, "city"),
        state: text(record, "state"),
        county: text(record, "county"),
        country: text(record, "country"),
        region: text(record, "region"),
        subregion: text(record, "subregion"),
        excavation: text(record, "excavation"),
        classification: text(record, "classification"),
        is_on_view: None,
    }
}

/// Read a field as text. Numbers are rendered, since exports are not
/// consistent about quoting years and dates.
fn text(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn integer(record: &Record, field: &str) -> Option<i64> {
    record.get(field)?.as_i64()
}

fn number(record: &Record, field: &str) -> Option<f64> {
    record.get(field)?.as_f64()
}

fn flag(record: &Record, field: &str) -> Option<bool> {
    record.get(field)?.as_bool()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn batch_of(values: Vec<serde_json::Value>) -> RecordBatch {
        RecordBatch::new(
            values
                .into_iter()
                .map(|v| match v {
                    Value::Object(m) => m,
                    _ => panic!("expected object"),
                })
                .collect(),
        )
    }

    #[test]
    fn test_department_projection_maps_display_name() {
        let batch = batch_of(vec![
            json!({"department_id": 10, "displayName": "Egyptian Art"}),
            json!({"department_id": 10, "displayName": "Egyptian Art"}),
            json!({"department_id": 11, "displayName": "European Paintings"}),
        ]);

        let rows = project_departments(&batch).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].display_name, "Egyptian Art");
    }

    #[test]
    fn test_department_missing_name_is_fatal() {
        let batch = batch_of(vec![json!({"department_id": 10})]);
        let err = project_departments(&batch).unwrap_err();
        assert!(matches!(err, PipelineError::MissingField { .. }));
    }

    #[test]
    fn test_missing_title_rejects_row() {
        let objects = batch_of(vec![
            json!({"objectID": 1, "title": "Seated Statue"}),
            json!({"objectID": 2, "title": null}),
            json!({"objectID": 3}),
        ]);

        let projected = project_batch(10, &objects, &RecordBatch::default());
        assert_eq!(projected.art.len(), 1);
        assert_eq!(projected.objects.len(), 1);
        assert_eq!(projected.rejected, 2);
    }

    #[test]
    fn test_exact_duplicates_dropped_conflicts_kept() {
        let objects = batch_of(vec![
            json!({"objectID": 1, "title": "Vase", "culture": "Greek"}),
            json!({"objectID": 1, "title": "Vase", "culture": "Greek"}),
            json!({"objectID": 1, "title": "Vase", "culture": "Attic"}),
        ]);

        let projected = project_batch(10, &objects, &RecordBatch::default());
        // One exact duplicate gone; the conflicting row survives for the
        // loader to refuse.
        assert_eq!(projected.art.len(), 2);
        assert_eq!(projected.duplicates_dropped, 1);
        // The link row is keyed by object id alone, so only one.
        assert_eq!(projected.objects.len(), 1);
    }

    #[test]
    fn test_artist_sentinel_keys_excluded() {
        let artists = batch_of(vec![
            json!({"artistAlphaSort": "Rembrandt, H.", "artist_name": "Rembrandt"}),
            json!({"artistAlphaSort": "Unknown", "artist_name": "Somebody"}),
            json!({"artistAlphaSort": "unknown", "artist_name": "Somebody Else"}),
            json!({"artistAlphaSort": "", "artist_name": "Nameless"}),
            json!({"artist_name": "No Sort Name"}),
        ]);

        let projected = project_batch(10, &RecordBatch::default(), &artists);
        assert_eq!(projected.artists.len(), 1);
        assert_eq!(projected.artists[0].artist_alpha_sort, "Rembrandt, H.");
        assert_eq!(projected.excluded_artists, 4);
    }

    #[test]
    fn test_artist_row_fields() {
        let artists = batch_of(vec![json!({
            "artistAlphaSort": "Vermeer, Johannes",
            "artist_name": "Johannes Vermeer",
            "artistNationality": "Dutch",
        })]);

        let projected = project_batch(10, &RecordBatch::default(), &artists);
        assert_eq!(
            projected.artists[0].artist_name.as_deref(),
            Some("Johannes Vermeer")
        );
        assert_eq!(
            projected.artists[0].artist_nationality.as_deref(),
            Some("Dutch")
        );
        assert!(projected.artists[0].artist_wikidata_url.is_none());
    }

    #[test]
    fn test_numeric_dates_rendered_as_text() {
        let objects = batch_of(vec![json!({
            "objectID": 5,
            "title": "Relief",
            "accessionYear": 1921,
            "objectBeginDate": -1550,
            "objectEndDate": -1295,
            "height": 24.5,
            "isPublicDomain": true,
        })]);

        let projected = project_batch(10, &objects, &RecordBatch::default());
        let art = &projected.art[0];
        assert_eq!(art.accession_year.as_deref(), Some("1921"));
        assert_eq!(art.object_begin_date.as_deref(), Some("-1550"));
        assert_eq!(art.height, Some(24.5));
        assert_eq!(art.is_public_domain, Some(true));
        assert!(art.is_on_view.is_none());
    }
}
