//! Academic record aggregation.
//!
//! # Responsibility
//! - Recompute course count, credits, points, GPA and honours from the
//!   enrollment set.
//! - Rebuild every enrollment and record after scale or data repairs.
//!
//! # Invariants
//! - Records are always derived from enrollments, never edited directly.
//! - Recomputation is idempotent: repeating it without data changes
//!   yields the same record.
//! - `recompute_points_gpa_honours` divides by the stored `total_credits`.

use super::{in_transaction, resolve_student, GradebookResult, StudentRef};
use crate::model::enrollment::EnrollmentState;
use crate::model::grade::GradeScale;
use crate::model::person::StudentId;
use crate::model::record::AcademicRecord;
use crate::repo::enrollment_repo::{EnrollmentRepository, SqliteEnrollmentRepository};
use crate::repo::ensure_connection_ready;
use crate::repo::record_repo::{RecordRepository, SqliteRecordRepository};
use crate::repo::scale_repo::{GradeScaleRepository, SqliteGradeScaleRepository};
use log::{info, warn};
use rusqlite::Connection;
use serde::Serialize;
use std::time::Instant;

/// Modified-by marker for rows rewritten by a rebuild.
pub const REBUILD_ACTOR: &str = "system:rebuild";

/// Outcome of a full rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RebuildSummary {
    /// Graded enrollments examined.
    pub enrollments_checked: usize,
    /// Enrollments whose derived fields changed and were rewritten.
    pub enrollments_updated: usize,
    /// Enrollments whose score no band covers; left untouched.
    pub enrollments_skipped: usize,
    pub records_recomputed: usize,
}

/// Record aggregation service facade over one connection.
pub struct RecordService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> RecordService<'conn> {
    /// Creates service after verifying the schema is migrated.
    pub fn try_new(conn: &'conn Connection) -> GradebookResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Gets the stored record; an existing student with no row reads as empty.
    pub fn get_record(&self, student: &StudentRef) -> GradebookResult<AcademicRecord> {
        let student_id = resolve_student(self.conn, student)?;
        load_or_empty(self.conn, student_id)
    }

    /// Lists every student's stored record ordered by student id.
    pub fn list_records(&self) -> GradebookResult<Vec<AcademicRecord>> {
        Ok(SqliteRecordRepository::new(self.conn).list_records()?)
    }

    /// Refreshes `course_count` and `total_credits` from enrollments.
    pub fn recompute_course_count_and_credits(
        &self,
        student: &StudentRef,
    ) -> GradebookResult<AcademicRecord> {
        in_transaction(self.conn, |conn| {
            let student_id = resolve_student(conn, student)?;
            recompute_counts_in(conn, student_id)
        })
    }

    /// Refreshes `total_points`, GPA and honours.
    pub fn recompute_points_gpa_honours(
        &self,
        student: &StudentRef,
    ) -> GradebookResult<AcademicRecord> {
        in_transaction(self.conn, |conn| {
            let student_id = resolve_student(conn, student)?;
            recompute_points_in(conn, student_id)
        })
    }

    /// Refreshes every record field in one step.
    pub fn recompute_record(&self, student: &StudentRef) -> GradebookResult<AcademicRecord> {
        in_transaction(self.conn, |conn| {
            let student_id = resolve_student(conn, student)?;
            recompute_record_in(conn, student_id)
        })
    }

    /// Re-grades every enrollment, then recomputes every student's record.
    ///
    /// The two phases commit separately. Enrollments the current scale
    /// cannot resolve are logged and skipped.
    pub fn recompute_all(&self) -> GradebookResult<RebuildSummary> {
        let started_at = Instant::now();
        info!("event=rebuild_all module=record status=start");

        let mut summary = in_transaction(self.conn, |conn| {
            let scale = SqliteGradeScaleRepository::new(conn).load_scale()?;
            regrade_all_in(conn, &scale)
        })?;
        summary.records_recomputed = in_transaction(self.conn, recompute_all_records_in)?;

        info!(
            "event=rebuild_all module=record status=ok checked={} updated={} skipped={} records={} duration_ms={}",
            summary.enrollments_checked,
            summary.enrollments_updated,
            summary.enrollments_skipped,
            summary.records_recomputed,
            started_at.elapsed().as_millis()
        );
        Ok(summary)
    }
}

pub(crate) fn load_or_empty(
    conn: &Connection,
    student_id: StudentId,
) -> GradebookResult<AcademicRecord> {
    Ok(SqliteRecordRepository::new(conn)
        .get_record(student_id)?
        .unwrap_or_else(|| AcademicRecord::empty(student_id)))
}

pub(crate) fn recompute_counts_in(
    conn: &Connection,
    student_id: StudentId,
) -> GradebookResult<AcademicRecord> {
    let totals = SqliteEnrollmentRepository::new(conn).totals_for_student(student_id)?;
    let mut record = load_or_empty(conn, student_id)?;
    record.apply_course_totals(totals.course_count, totals.total_credits);
    SqliteRecordRepository::new(conn).save_record(&record)?;
    Ok(record)
}

pub(crate) fn recompute_points_in(
    conn: &Connection,
    student_id: StudentId,
) -> GradebookResult<AcademicRecord> {
    let totals = SqliteEnrollmentRepository::new(conn).totals_for_student(student_id)?;
    let mut record = load_or_empty(conn, student_id)?;
    record.apply_points(totals.total_points);
    SqliteRecordRepository::new(conn).save_record(&record)?;
    Ok(record)
}

pub(crate) fn recompute_record_in(
    conn: &Connection,
    student_id: StudentId,
) -> GradebookResult<AcademicRecord> {
    let totals = SqliteEnrollmentRepository::new(conn).totals_for_student(student_id)?;
    let mut record = AcademicRecord::empty(student_id);
    record.apply_course_totals(totals.course_count, totals.total_credits);
    record.apply_points(totals.total_points);
    SqliteRecordRepository::new(conn).save_record(&record)?;
    Ok(record)
}

pub(crate) fn regrade_all_in(
    conn: &Connection,
    scale: &GradeScale,
) -> GradebookResult<RebuildSummary> {
    let repo = SqliteEnrollmentRepository::new(conn);
    let mut summary = RebuildSummary::default();
    for stored in repo.list_all_unchecked()? {
        let mut enrollment = stored.clone();
        if stored.state() == EnrollmentState::Graded {
            summary.enrollments_checked += 1;
            if let Err(err) = enrollment.regrade(scale) {
                warn!(
                    "event=regrade module=record status=skipped student_id={} course_id={} score={} error={}",
                    stored.student_id, stored.course_id, stored.score, err
                );
                summary.enrollments_skipped += 1;
                continue;
            }
        } else {
            // Ungraded rows keep their grade point; only the product can drift.
            enrollment.resnapshot_credit(stored.credit);
        }
        if enrollment != stored {
            repo.save_grade(&enrollment, REBUILD_ACTOR)?;
            summary.enrollments_updated += 1;
        }
    }
    Ok(summary)
}

pub(crate) fn recompute_all_records_in(conn: &Connection) -> GradebookResult<usize> {
    let student_ids = SqliteRecordRepository::new(conn).list_student_ids()?;
    for student_id in &student_ids {
        recompute_record_in(conn, *student_id)?;
    }
    Ok(student_ids.len())
}
