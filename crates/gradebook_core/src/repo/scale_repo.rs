//! Grade scale persistence.
//!
//! # Invariants
//! - Loading never validates coverage; holes surface at resolution time.
//! - Replacement deletes and re-inserts every band inside the caller's
//!   transaction.

use super::RepoResult;
use crate::model::grade::{GradeBand, GradeScale};
use rusqlite::{params, Connection};

/// Repository interface for the grade scale table.
pub trait GradeScaleRepository {
    /// Loads the current scale, highest band first.
    fn load_scale(&self) -> RepoResult<GradeScale>;
    /// Replaces all bands with `scale`.
    fn replace_scale(&self, scale: &GradeScale, modified_by: &str) -> RepoResult<()>;
}

/// SQLite-backed grade scale repository.
pub struct SqliteGradeScaleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGradeScaleRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl GradeScaleRepository for SqliteGradeScaleRepository<'_> {
    fn load_scale(&self) -> RepoResult<GradeScale> {
        let mut stmt = self.conn.prepare(
            "SELECT letter, point, min_score, max_score
             FROM grade_bands
             ORDER BY min_score DESC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut bands = Vec::new();
        while let Some(row) = rows.next()? {
            bands.push(GradeBand {
                letter: row.get("letter")?,
                point: row.get("point")?,
                min_score: row.get("min_score")?,
                max_score: row.get("max_score")?,
            });
        }

        Ok(GradeScale::from_persisted(bands))
    }

    fn replace_scale(&self, scale: &GradeScale, modified_by: &str) -> RepoResult<()> {
        self.conn.execute("DELETE FROM grade_bands;", [])?;
        let mut stmt = self.conn.prepare(
            "INSERT INTO grade_bands (letter, point, min_score, max_score, modified_by)
             VALUES (?1, ?2, ?3, ?4, ?5);",
        )?;
        for band in scale.bands() {
            stmt.execute(params![
                band.letter.as_str(),
                band.point,
                band.min_score,
                band.max_score,
                modified_by,
            ])?;
        }
        Ok(())
    }
}
