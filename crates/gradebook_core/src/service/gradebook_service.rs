//! Gradebook use-case facade.
//!
//! # Responsibility
//! - Expose each collaborator sequence (register, grade, unregister, course
//!   edit, scale replacement) as one call.
//! - Keep enrollments and the owning academic records in step.
//!
//! # Invariants
//! - Every call runs in one immediate transaction: enrollments and records
//!   commit together or not at all.
//! - Affected records are recomputed after the enrollment set changes, so
//!   count, credits, points and GPA always describe the same set.
//! - Batch calls validate every score before the first write.

use super::enrollment_service::{grade_in, register_in, unregister_in};
use super::record_service::{
    recompute_all_records_in, recompute_record_in, regrade_all_in, RebuildSummary,
};
use super::{
    in_transaction, resolve_course, resolve_student, CourseRef, GradebookError, GradebookResult,
    StudentRef,
};
use crate::model::course::Course;
use crate::model::grade::{is_valid_score, GradeBand, GradeScale};
use crate::model::record::AcademicRecord;
use crate::repo::directory_repo::{DirectoryRepository, SqliteDirectoryRepository};
use crate::repo::enrollment_repo::{EnrollmentRepository, SqliteEnrollmentRepository};
use crate::repo::ensure_connection_ready;
use crate::repo::scale_repo::{GradeScaleRepository, SqliteGradeScaleRepository};
use log::info;
use rusqlite::Connection;
use std::collections::BTreeSet;

/// Result of a course credit change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditUpdate {
    pub course: Course,
    /// Recomputed records of every student enrolled in the course.
    pub records: Vec<AcademicRecord>,
}

/// Gradebook service facade over one connection.
pub struct GradebookService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> GradebookService<'conn> {
    /// Creates service after verifying the schema is migrated.
    pub fn try_new(conn: &'conn Connection) -> GradebookResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Registers `student` for every course, then recomputes the record.
    pub fn register_courses(
        &self,
        student: &StudentRef,
        courses: &[CourseRef],
        registered_by: &str,
    ) -> GradebookResult<AcademicRecord> {
        in_transaction(self.conn, |conn| {
            let student_id = resolve_student(conn, student)?;
            for course in courses {
                let course = resolve_course(conn, course)?;
                register_in(conn, student_id, &course, registered_by)?;
            }
            let record = recompute_record_in(conn, student_id)?;
            info!(
                "event=courses_registered module=gradebook status=ok student_id={} courses={}",
                student_id,
                courses.len()
            );
            Ok(record)
        })
    }

    /// Drops every listed course, then recomputes the record.
    pub fn unregister_courses(
        &self,
        student: &StudentRef,
        courses: &[CourseRef],
    ) -> GradebookResult<AcademicRecord> {
        in_transaction(self.conn, |conn| {
            let student_id = resolve_student(conn, student)?;
            for course in courses {
                let course = resolve_course(conn, course)?;
                unregister_in(conn, student_id, course.id)?;
            }
            let record = recompute_record_in(conn, student_id)?;
            info!(
                "event=courses_unregistered module=gradebook status=ok student_id={} courses={}",
                student_id,
                courses.len()
            );
            Ok(record)
        })
    }

    /// Grades several courses for one student, then recomputes the record.
    pub fn grade_courses(
        &self,
        student: &StudentRef,
        grades: &[(CourseRef, i64)],
        modified_by: &str,
    ) -> GradebookResult<AcademicRecord> {
        validate_scores(grades.iter().map(|(_, score)| *score))?;
        in_transaction(self.conn, |conn| {
            let scale = SqliteGradeScaleRepository::new(conn).load_scale()?;
            let student_id = resolve_student(conn, student)?;
            for (course, score) in grades {
                let course = resolve_course(conn, course)?;
                grade_in(conn, &scale, student_id, course.id, *score, modified_by)?;
            }
            recompute_record_in(conn, student_id)
        })
    }

    /// Grades one course for several students, then recomputes their records.
    ///
    /// Records are returned in input order, one per distinct student.
    pub fn grade_students(
        &self,
        course: &CourseRef,
        grades: &[(StudentRef, i64)],
        modified_by: &str,
    ) -> GradebookResult<Vec<AcademicRecord>> {
        validate_scores(grades.iter().map(|(_, score)| *score))?;
        in_transaction(self.conn, |conn| {
            let scale = SqliteGradeScaleRepository::new(conn).load_scale()?;
            let course = resolve_course(conn, course)?;
            let mut student_ids = Vec::with_capacity(grades.len());
            for (student, score) in grades {
                let student_id = resolve_student(conn, student)?;
                grade_in(conn, &scale, student_id, course.id, *score, modified_by)?;
                if !student_ids.contains(&student_id) {
                    student_ids.push(student_id);
                }
            }
            student_ids
                .into_iter()
                .map(|student_id| recompute_record_in(conn, student_id))
                .collect()
        })
    }

    /// Changes the course credit and propagates it to every enrollment.
    pub fn update_course_credit(
        &self,
        course: &CourseRef,
        credit: i64,
        modified_by: &str,
    ) -> GradebookResult<CreditUpdate> {
        if credit <= 0 {
            return Err(GradebookError::InvalidCredit(credit));
        }
        in_transaction(self.conn, |conn| {
            let course = resolve_course(conn, course)?;
            let directory = SqliteDirectoryRepository::new(conn);
            directory.set_course_credit(course.id, credit)?;

            let enrollments = SqliteEnrollmentRepository::new(conn);
            let mut student_ids = BTreeSet::new();
            for mut enrollment in enrollments.list_by_course(course.id)? {
                enrollment.resnapshot_credit(credit);
                enrollments.save_grade(&enrollment, modified_by)?;
                student_ids.insert(enrollment.student_id);
            }

            let records = student_ids
                .into_iter()
                .map(|student_id| recompute_record_in(conn, student_id))
                .collect::<GradebookResult<Vec<_>>>()?;
            info!(
                "event=course_credit_updated module=gradebook status=ok course_id={} credit={} students={}",
                course.id,
                credit,
                records.len()
            );
            Ok(CreditUpdate {
                course: Course { credit, ..course },
                records,
            })
        })
    }

    /// Validates and stores a new scale, then rebuilds every enrollment and record.
    pub fn replace_grade_scale(
        &self,
        bands: Vec<GradeBand>,
        modified_by: &str,
    ) -> GradebookResult<RebuildSummary> {
        let scale = GradeScale::new(bands)?;
        in_transaction(self.conn, |conn| {
            SqliteGradeScaleRepository::new(conn).replace_scale(&scale, modified_by)?;
            let mut summary = regrade_all_in(conn, &scale)?;
            summary.records_recomputed = recompute_all_records_in(conn)?;
            info!(
                "event=grade_scale_replaced module=gradebook status=ok bands={} updated={} skipped={} records={}",
                scale.bands().len(),
                summary.enrollments_updated,
                summary.enrollments_skipped,
                summary.records_recomputed
            );
            Ok(summary)
        })
    }

    /// Loads the scale currently in effect.
    pub fn current_grade_scale(&self) -> GradebookResult<GradeScale> {
        Ok(SqliteGradeScaleRepository::new(self.conn).load_scale()?)
    }
}

fn validate_scores(scores: impl IntoIterator<Item = i64>) -> GradebookResult<()> {
    match scores.into_iter().find(|score| !is_valid_score(*score)) {
        Some(score) => Err(GradebookError::InvalidScore(score)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::validate_scores;
    use crate::service::GradebookError;

    #[test]
    fn validate_scores_reports_first_invalid() {
        assert!(validate_scores([0, 50, 100]).is_ok());
        let err = validate_scores([70, 101, -1]).unwrap_err();
        assert!(matches!(err, GradebookError::InvalidScore(101)));
    }
}
