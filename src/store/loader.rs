//! Deduplicating loader, the store's only write path.
//!
//! Reruns are expected: a row whose key is already stored with the same
//! content is skipped, and one stored with different content aborts the run.
//! Each entity table is loaded as one transaction.

use crate::error::PipelineError;
use crate::projection::{ArtistRow, DepartmentRow, ProjectedBatch};
use crate::store::schema::CollectionStore;
use rusqlite::params;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::info;

/// How to merge the department reference list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartmentLoad {
    /// Wholesale rewrite, for reseeding the reference data.
    Replace,
    /// Insert-or-ignore, for adding departments incrementally.
    Append,
}

/// What one batch load actually wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub objects_inserted: usize,
    pub objects_skipped: usize,
    pub art_inserted: usize,
    pub art_skipped: usize,
    pub artists_inserted: usize,
    pub artists_skipped: usize,
}

impl CollectionStore {
    /// Load the department reference list.
    pub fn load_departments(
        &mut self,
        rows: &[DepartmentRow],
        mode: DepartmentLoad,
    ) -> Result<usize, PipelineError> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            if mode == DepartmentLoad::Replace {
                tx.execute("DELETE FROM Department", [])?;
            }
            let sql = match mode {
                DepartmentLoad::Replace => {
                    "INSERT INTO Department (department_id, display_name) VALUES (?1, ?2)"
                }
                DepartmentLoad::Append => {
                    "INSERT OR IGNORE INTO Department (department_id, display_name) VALUES (?1, ?2)"
                }
            };
            let mut stmt = tx.prepare(sql)?;
            for row in rows {
                inserted += stmt.execute(params![row.department_id, row.display_name])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Load one department's projected rows, ObjectLink then Art then
    /// Artist, so the link table exists before anything references it.
    pub fn load_batch(&mut self, batch: &ProjectedBatch) -> Result<LoadReport, PipelineError> {
        let mut report = LoadReport::default();

        let known_departments = self.department_ids()?;

        // Objects
        let existing: HashMap<i64, i64> = {
            let mut stmt = self
                .conn
                .prepare("SELECT object_id, department_id FROM Objects")?;
            let pairs = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<_, _>>()?;
            pairs
        };

        let tx = self.conn.transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO Objects (department_id, object_id) VALUES (?1, ?2)")?;
            for row in &batch.objects {
                if !known_departments.contains(&row.department_id) {
                    return Err(PipelineError::OrphanDepartment {
                        object_id: row.object_id,
                        department_id: row.department_id,
                    });
                }
                match existing.get(&row.object_id) {
                    Some(&dept) if dept == row.department_id => report.objects_skipped += 1,
                    Some(_) => {
                        return Err(PipelineError::DuplicateKey {
                            table: "Objects",
                            key: row.object_id.to_string(),
                            conflict: "department",
                        });
                    }
                    None => {
                        stmt.execute(params![row.department_id, row.object_id])?;
                        report.objects_inserted += 1;
                    }
                }
            }
        }
        tx.commit()?;

        // Art
        let existing: HashMap<i64, String> = {
            let mut stmt = self.conn.prepare("SELECT object_id, title FROM Art")?;
            let pairs = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<_, _>>()?;
            pairs
        };

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO Art (object_id, isHighlight, accessionYear, isPublicDomain,
                     primaryImage, objectName, title, culture, period, dynasty, reign,
                     portfolio, artistAlphaSort, objectBeginDate, objectEndDate, medium,
                     height, width, length, creditLine, city, state, county, country,
                     region, subregion, excavation, classification, isOnView)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                     ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27,
                     ?28, ?29)",
            )?;
            for row in &batch.art {
                match existing.get(&row.object_id) {
                    Some(title) if *title == row.title => report.art_skipped += 1,
                    Some(_) => {
                        return Err(PipelineError::DuplicateKey {
                            table: "Art",
                            key: row.object_id.to_string(),
                            conflict: "title",
                        });
                    }
                    None => {
                        stmt.execute(params![
                            row.object_id,
                            row.is_highlight,
                            row.accession_year,
                            row.is_public_domain,
                            row.primary_image,
                            row.object_name,
                            row.title,
                            row.culture,
                            row.period,
                            row.dynasty,
                            row.reign,
                            row.portfolio,
                            row.artist_alpha_sort,
                            row.object_begin_date,
                            row.object_end_date,
                            row.medium,
                            row.height,
                            row.width,
                            row.length,
                            row.credit_line,
                            row.city,
                            row.state,
                            row.county,
                            row.country,
                            row.region,
                            row.subregion,
                            row.excavation,
                            row.classification,
                            row.is_on_view,
                        ])?;
                        report.art_inserted += 1;
                    }
                }
            }
        }
        tx.commit()?;

        let (inserted, skipped) = self.load_artists(&batch.artists)?;
        report.artists_inserted = inserted;
        report.artists_skipped = skipped;

        info!(
            "loaded batch for department {}: {} objects, {} art, {} artists ({} skipped)",
            batch.department_id,
            report.objects_inserted,
            report.art_inserted,
            report.artists_inserted,
            report.objects_skipped + report.art_skipped + report.artists_skipped,
        );

        Ok(report)
    }

    /// Insert only artists whose sort-name the store has never seen.
    ///
    /// Two stages: drop candidates already stored, then deduplicate the
    /// remainder by key, first-seen wins. Artist identities recur across
    /// department exports, so both stages are needed.
    fn load_artists(&mut self, rows: &[ArtistRow]) -> Result<(usize, usize), PipelineError> {
        let stored: HashSet<String> = {
            let mut stmt = self.conn.prepare("SELECT artistAlphaSort FROM Artists")?;
            let keys = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<_, _>>()?;
            keys
        };

        let mut inserted = 0;
        let mut skipped = 0;
        let mut seen: HashSet<&str> = HashSet::new();

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO Artists (artistWikidata_URL, artistName, artistAlphaSort,
                     artistNationality, artistBeginDate, artistEndDate)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for row in rows {
                if stored.contains(&row.artist_alpha_sort) || !seen.insert(&row.artist_alpha_sort)
                {
                    skipped += 1;
                    continue;
                }
                stmt.execute(params![
                    row.artist_wikidata_url,
                    row.artist_name,
                    row.artist_alpha_sort,
                    row.artist_nationality,
                    row.artist_begin_date,
                    row.artist_end_date,
                ])?;
                inserted += 1;
            }
        }
        tx.commit()?;

        Ok((inserted, skipped))
    }

    fn department_ids(&self) -> Result<HashSet<i64>, PipelineError> {
        let mut stmt = self.conn.prepare("SELECT department_id FROM Department")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<_, _>>()?;
        Ok(ids)
    }
}
