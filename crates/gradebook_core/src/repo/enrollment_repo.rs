//! Enrollment repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist one row per (student, course) pair with its derived grade.
//! - Provide per-student totals for record aggregation.
//!
//! # Invariants
//! - Listing order is deterministic: `student_id ASC, course_id ASC`.
//! - `save_grade` writes score, credit and all derived fields in one
//!   statement so they never diverge on disk.
//! - Regular reads reject rows whose `scored_point` disagrees with
//!   `credit * grade_point`; only `list_all_unchecked` returns them.

use super::{map_conflict, RepoError, RepoResult};
use crate::model::course::CourseId;
use crate::model::enrollment::Enrollment;
use crate::model::person::StudentId;
use rusqlite::{params, Connection, Params, Row};

const ENROLLMENT_SELECT_SQL: &str = "SELECT
    student_id,
    course_id,
    credit,
    score,
    letter_grade,
    grade_point,
    scored_point,
    registered_by,
    registered_at,
    modified_by,
    modified_at
FROM enrollments";

/// Count and sums over one student's enrollment set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrollmentTotals {
    pub course_count: i64,
    pub total_credits: i64,
    pub total_points: i64,
}

/// Repository interface for enrollment rows.
pub trait EnrollmentRepository {
    /// Inserts a registered (ungraded) enrollment with a credit snapshot.
    fn insert_enrollment(
        &self,
        student_id: StudentId,
        course_id: CourseId,
        credit: i64,
        registered_by: &str,
    ) -> RepoResult<Enrollment>;
    fn get_enrollment(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> RepoResult<Option<Enrollment>>;
    fn list_by_student(&self, student_id: StudentId) -> RepoResult<Vec<Enrollment>>;
    fn list_by_course(&self, course_id: CourseId) -> RepoResult<Vec<Enrollment>>;
    fn list_all(&self) -> RepoResult<Vec<Enrollment>>;
    /// Lists every row as stored, including rows with drifted derived fields.
    fn list_all_unchecked(&self) -> RepoResult<Vec<Enrollment>>;
    /// Writes score, credit and derived grade fields of an existing row.
    fn save_grade(&self, enrollment: &Enrollment, modified_by: &str) -> RepoResult<()>;
    fn delete_enrollment(&self, student_id: StudentId, course_id: CourseId) -> RepoResult<()>;
    fn totals_for_student(&self, student_id: StudentId) -> RepoResult<EnrollmentTotals>;
}

/// SQLite-backed enrollment repository.
pub struct SqliteEnrollmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEnrollmentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_list<P: Params>(&self, filter: &str, params: P) -> RepoResult<Vec<Enrollment>> {
        self.query_rows(filter, params)?
            .into_iter()
            .map(ensure_consistent)
            .collect()
    }

    fn query_rows<P: Params>(&self, filter: &str, params: P) -> RepoResult<Vec<Enrollment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ENROLLMENT_SELECT_SQL} {filter} ORDER BY student_id ASC, course_id ASC;"
        ))?;
        let mut rows = stmt.query(params)?;
        let mut enrollments = Vec::new();
        while let Some(row) = rows.next()? {
            enrollments.push(parse_enrollment_row(row)?);
        }
        Ok(enrollments)
    }
}

impl EnrollmentRepository for SqliteEnrollmentRepository<'_> {
    fn insert_enrollment(
        &self,
        student_id: StudentId,
        course_id: CourseId,
        credit: i64,
        registered_by: &str,
    ) -> RepoResult<Enrollment> {
        self.conn
            .execute(
                "INSERT INTO enrollments (student_id, course_id, credit, registered_by)
                 VALUES (?1, ?2, ?3, ?4);",
                params![student_id, course_id, credit, registered_by],
            )
            .map_err(|err| {
                map_conflict(
                    err,
                    "enrollment",
                    format!("student {student_id} course {course_id}"),
                )
            })?;

        self.get_enrollment(student_id, course_id)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "enrollment for student {student_id} course {course_id} vanished after insert"
            ))
        })
    }

    fn get_enrollment(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> RepoResult<Option<Enrollment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ENROLLMENT_SELECT_SQL} WHERE student_id = ?1 AND course_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![student_id, course_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(ensure_consistent(parse_enrollment_row(row)?)?));
        }
        Ok(None)
    }

    fn list_by_student(&self, student_id: StudentId) -> RepoResult<Vec<Enrollment>> {
        self.query_list("WHERE student_id = ?1", [student_id])
    }

    fn list_by_course(&self, course_id: CourseId) -> RepoResult<Vec<Enrollment>> {
        self.query_list("WHERE course_id = ?1", [course_id])
    }

    fn list_all(&self) -> RepoResult<Vec<Enrollment>> {
        self.query_list("", [])
    }

    fn list_all_unchecked(&self) -> RepoResult<Vec<Enrollment>> {
        self.query_rows("", [])
    }

    fn save_grade(&self, enrollment: &Enrollment, modified_by: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE enrollments
             SET
                credit = ?3,
                score = ?4,
                letter_grade = ?5,
                grade_point = ?6,
                scored_point = ?7,
                modified_by = ?8,
                modified_at = (strftime('%s', 'now') * 1000)
             WHERE student_id = ?1 AND course_id = ?2;",
            params![
                enrollment.student_id,
                enrollment.course_id,
                enrollment.credit,
                enrollment.score,
                enrollment.letter_grade.as_deref(),
                enrollment.grade_point,
                enrollment.scored_point,
                modified_by,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found(
                "enrollment",
                format!(
                    "student {} course {}",
                    enrollment.student_id, enrollment.course_id
                ),
            ));
        }
        Ok(())
    }

    fn delete_enrollment(&self, student_id: StudentId, course_id: CourseId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM enrollments WHERE student_id = ?1 AND course_id = ?2;",
            params![student_id, course_id],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(
                "enrollment",
                format!("student {student_id} course {course_id}"),
            ));
        }
        Ok(())
    }

    fn totals_for_student(&self, student_id: StudentId) -> RepoResult<EnrollmentTotals> {
        let totals = self.conn.query_row(
            "SELECT
                COUNT(*),
                COALESCE(SUM(credit), 0),
                COALESCE(SUM(scored_point), 0)
             FROM enrollments
             WHERE student_id = ?1;",
            [student_id],
            |row| {
                Ok(EnrollmentTotals {
                    course_count: row.get(0)?,
                    total_credits: row.get(1)?,
                    total_points: row.get(2)?,
                })
            },
        )?;
        Ok(totals)
    }
}

fn parse_enrollment_row(row: &Row<'_>) -> RepoResult<Enrollment> {
    Ok(Enrollment {
        student_id: row.get("student_id")?,
        course_id: row.get("course_id")?,
        credit: row.get("credit")?,
        score: row.get("score")?,
        letter_grade: row.get("letter_grade")?,
        grade_point: row.get("grade_point")?,
        scored_point: row.get("scored_point")?,
        registered_by: row.get("registered_by")?,
        registered_at: row.get("registered_at")?,
        modified_by: row.get("modified_by")?,
        modified_at: row.get("modified_at")?,
    })
}

fn ensure_consistent(enrollment: Enrollment) -> RepoResult<Enrollment> {
    if enrollment.scored_point != enrollment.credit * enrollment.grade_point {
        return Err(RepoError::InvalidData(format!(
            "enrollment for student {} course {} has scored_point {} but credit {} x point {}",
            enrollment.student_id,
            enrollment.course_id,
            enrollment.scored_point,
            enrollment.credit,
            enrollment.grade_point
        )));
    }
    Ok(enrollment)
}
