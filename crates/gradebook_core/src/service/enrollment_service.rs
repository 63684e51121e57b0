//! Enrollment use-case service.
//!
//! # Responsibility
//! - Register, grade and drop single (student, course) enrollments.
//! - Resolve student and course references before touching rows.
//!
//! # Invariants
//! - A new enrollment snapshots the course credit at registration time.
//! - Score validation runs before any row is read for update.
//! - These calls never touch academic records; see `GradebookService`.

use super::{
    in_transaction, resolve_course, resolve_student, CourseRef, GradebookError, GradebookResult,
    StudentRef,
};
use crate::model::course::{Course, CourseId};
use crate::model::enrollment::Enrollment;
use crate::model::grade::{is_valid_score, GradeScale};
use crate::model::person::StudentId;
use crate::repo::enrollment_repo::{EnrollmentRepository, SqliteEnrollmentRepository};
use crate::repo::scale_repo::{GradeScaleRepository, SqliteGradeScaleRepository};
use crate::repo::{ensure_connection_ready, RepoError};
use rusqlite::Connection;

/// Enrollment service facade over one connection.
pub struct EnrollmentService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> EnrollmentService<'conn> {
    /// Creates service after verifying the schema is migrated.
    pub fn try_new(conn: &'conn Connection) -> GradebookResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Registers `student` for `course` in the `Registered` state.
    pub fn create(
        &self,
        student: &StudentRef,
        course: &CourseRef,
        registered_by: &str,
    ) -> GradebookResult<Enrollment> {
        in_transaction(self.conn, |conn| {
            let student_id = resolve_student(conn, student)?;
            let course = resolve_course(conn, course)?;
            register_in(conn, student_id, &course, registered_by)
        })
    }

    /// Sets the score and re-derives letter grade and points.
    pub fn set_score(
        &self,
        student: &StudentRef,
        course: &CourseRef,
        score: i64,
        modified_by: &str,
    ) -> GradebookResult<Enrollment> {
        if !is_valid_score(score) {
            return Err(GradebookError::InvalidScore(score));
        }
        in_transaction(self.conn, |conn| {
            let student_id = resolve_student(conn, student)?;
            let course = resolve_course(conn, course)?;
            let scale = SqliteGradeScaleRepository::new(conn).load_scale()?;
            grade_in(conn, &scale, student_id, course.id, score, modified_by)
        })
    }

    /// Removes the enrollment.
    pub fn delete(&self, student: &StudentRef, course: &CourseRef) -> GradebookResult<()> {
        in_transaction(self.conn, |conn| {
            let student_id = resolve_student(conn, student)?;
            let course = resolve_course(conn, course)?;
            unregister_in(conn, student_id, course.id)
        })
    }

    /// Gets the enrollment, `None` when the student is not registered.
    pub fn get(
        &self,
        student: &StudentRef,
        course: &CourseRef,
    ) -> GradebookResult<Option<Enrollment>> {
        let student_id = resolve_student(self.conn, student)?;
        let course = resolve_course(self.conn, course)?;
        Ok(SqliteEnrollmentRepository::new(self.conn).get_enrollment(student_id, course.id)?)
    }

    /// Lists a student's enrollments ordered by course id.
    pub fn list_by_student(&self, student: &StudentRef) -> GradebookResult<Vec<Enrollment>> {
        let student_id = resolve_student(self.conn, student)?;
        Ok(SqliteEnrollmentRepository::new(self.conn).list_by_student(student_id)?)
    }

    /// Lists a course's enrollments ordered by student id.
    pub fn list_by_course(&self, course: &CourseRef) -> GradebookResult<Vec<Enrollment>> {
        let course = resolve_course(self.conn, course)?;
        Ok(SqliteEnrollmentRepository::new(self.conn).list_by_course(course.id)?)
    }
}

pub(crate) fn register_in(
    conn: &Connection,
    student_id: StudentId,
    course: &Course,
    registered_by: &str,
) -> GradebookResult<Enrollment> {
    let repo = SqliteEnrollmentRepository::new(conn);
    if repo.get_enrollment(student_id, course.id)?.is_some() {
        return Err(GradebookError::AlreadyRegistered {
            student_id,
            course_id: course.id,
        });
    }
    repo.insert_enrollment(student_id, course.id, course.credit, registered_by)
        .map_err(|err| match err {
            RepoError::Conflict { .. } => GradebookError::AlreadyRegistered {
                student_id,
                course_id: course.id,
            },
            other => other.into(),
        })
}

pub(crate) fn grade_in(
    conn: &Connection,
    scale: &GradeScale,
    student_id: StudentId,
    course_id: CourseId,
    score: i64,
    modified_by: &str,
) -> GradebookResult<Enrollment> {
    let repo = SqliteEnrollmentRepository::new(conn);
    let mut enrollment = repo
        .get_enrollment(student_id, course_id)?
        .ok_or(GradebookError::NotRegistered {
            student_id,
            course_id,
        })?;
    enrollment.apply_score(score, scale)?;
    repo.save_grade(&enrollment, modified_by)?;
    repo.get_enrollment(student_id, course_id)?
        .ok_or_else(|| {
            RepoError::not_found("enrollment", format!("student {student_id} course {course_id}"))
                .into()
        })
}

pub(crate) fn unregister_in(
    conn: &Connection,
    student_id: StudentId,
    course_id: CourseId,
) -> GradebookResult<()> {
    SqliteEnrollmentRepository::new(conn)
        .delete_enrollment(student_id, course_id)
        .map_err(|err| match err {
            RepoError::NotFound { .. } => GradebookError::NotRegistered {
                student_id,
                course_id,
            },
            other => other.into(),
        })
}
