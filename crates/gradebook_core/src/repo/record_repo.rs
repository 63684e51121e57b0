//! Academic record repository.
//!
//! # Invariants
//! - GPA is persisted as `gpa_x100` (integer hundredths), `NULL` when undefined.
//! - `honours` is persisted as its display label.

use super::{RepoError, RepoResult};
use crate::model::person::StudentId;
use crate::model::record::{AcademicRecord, Gpa, Honours};
use rusqlite::{params, Connection, Row};

const RECORD_SELECT_SQL: &str = "SELECT
    student_id,
    course_count,
    total_credits,
    total_points,
    gpa_x100,
    honours
FROM academic_records";

/// Repository interface for per-student academic records.
pub trait RecordRepository {
    fn get_record(&self, student_id: StudentId) -> RepoResult<Option<AcademicRecord>>;
    /// Lists every stored record ordered by `student_id`.
    fn list_records(&self) -> RepoResult<Vec<AcademicRecord>>;
    /// Inserts or fully replaces the record for `record.student_id`.
    fn save_record(&self, record: &AcademicRecord) -> RepoResult<()>;
    /// Lists every known student id, with or without a record row.
    fn list_student_ids(&self) -> RepoResult<Vec<StudentId>>;
}

/// SQLite-backed record repository.
pub struct SqliteRecordRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RecordRepository for SqliteRecordRepository<'_> {
    fn get_record(&self, student_id: StudentId) -> RepoResult<Option<AcademicRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RECORD_SELECT_SQL} WHERE student_id = ?1;"))?;
        let mut rows = stmt.query([student_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_record_row(row)?));
        }
        Ok(None)
    }

    fn list_records(&self) -> RepoResult<Vec<AcademicRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RECORD_SELECT_SQL} ORDER BY student_id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }
        Ok(records)
    }

    fn save_record(&self, record: &AcademicRecord) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO academic_records (
                student_id,
                course_count,
                total_credits,
                total_points,
                gpa_x100,
                honours
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(student_id) DO UPDATE SET
                course_count = excluded.course_count,
                total_credits = excluded.total_credits,
                total_points = excluded.total_points,
                gpa_x100 = excluded.gpa_x100,
                honours = excluded.honours,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                record.student_id,
                record.course_count,
                record.total_credits,
                record.total_points,
                record.gpa.map(Gpa::hundredths),
                record.honours.map(Honours::label),
            ],
        )?;
        Ok(())
    }

    fn list_student_ids(&self) -> RepoResult<Vec<StudentId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT student_id FROM students ORDER BY student_id ASC;")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, StudentId>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

fn parse_record_row(row: &Row<'_>) -> RepoResult<AcademicRecord> {
    let student_id: StudentId = row.get("student_id")?;
    let gpa = row.get::<_, Option<u32>>("gpa_x100")?.map(Gpa::from_hundredths);
    let honours = match row.get::<_, Option<String>>("honours")? {
        Some(label) => Some(Honours::from_label(&label).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid honours `{label}` in academic_records for student {student_id}"
            ))
        })?),
        None => None,
    };

    if gpa.map(Gpa::honours) != honours {
        return Err(RepoError::InvalidData(format!(
            "academic record for student {student_id} has honours inconsistent with gpa"
        )));
    }

    Ok(AcademicRecord {
        student_id,
        course_count: row.get("course_count")?,
        total_credits: row.get("total_credits")?,
        total_points: row.get("total_points")?,
        gpa,
        honours,
    })
}
