//! Course enrollment model.
//!
//! # Responsibility
//! - Hold one student's registration in one course and its derived grade.
//! - Re-derive grade fields whenever the score or credit snapshot changes.
//!
//! # Invariants
//! - `letter_grade`, `grade_point` and `scored_point` always agree with
//!   `score` under the scale used for the last grading call.
//! - `credit` is a snapshot of the course credit, never a live reference.
//! - A failed grading call leaves every field untouched.

use super::course::CourseId;
use super::grade::{scored_point, GradeScale, GradeScaleError};
use super::person::StudentId;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a stored enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentState {
    /// Registered, no grade assigned yet.
    Registered,
    /// A score has been graded at least once.
    Graded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub student_id: StudentId,
    pub course_id: CourseId,
    pub credit: i64,
    pub score: i64,
    pub letter_grade: Option<String>,
    pub grade_point: i64,
    /// `credit * grade_point`.
    pub scored_point: i64,
    pub registered_by: Option<String>,
    /// Epoch ms.
    pub registered_at: i64,
    pub modified_by: Option<String>,
    /// Epoch ms of the last grade or credit change.
    pub modified_at: Option<i64>,
}

impl Enrollment {
    pub fn state(&self) -> EnrollmentState {
        if self.letter_grade.is_some() {
            EnrollmentState::Graded
        } else {
            EnrollmentState::Registered
        }
    }

    /// Sets `score` and re-derives grade fields against `scale`.
    ///
    /// The caller validates the score domain; this only fails when `scale`
    /// has no band for `score`.
    pub fn apply_score(&mut self, score: i64, scale: &GradeScale) -> Result<(), GradeScaleError> {
        let grade = scale.resolve(score)?;
        self.score = score;
        self.grade_point = grade.point;
        self.scored_point = scored_point(self.credit, grade.point);
        self.letter_grade = Some(grade.letter);
        Ok(())
    }

    /// Re-derives grade fields from the stored score.
    ///
    /// Registered (ungraded) enrollments are left as they are.
    pub fn regrade(&mut self, scale: &GradeScale) -> Result<(), GradeScaleError> {
        match self.state() {
            EnrollmentState::Registered => Ok(()),
            EnrollmentState::Graded => self.apply_score(self.score, scale),
        }
    }

    /// Replaces the credit snapshot and the points that depend on it.
    pub fn resnapshot_credit(&mut self, credit: i64) {
        self.credit = credit;
        self.scored_point = scored_point(credit, self.grade_point);
    }
}
