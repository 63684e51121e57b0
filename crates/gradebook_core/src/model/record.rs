//! Student academic record model.
//!
//! # Responsibility
//! - Hold per-student aggregates derived from the enrollment set.
//! - Compute GPA in fixed-point hundredths and classify honours.
//!
//! # Invariants
//! - `gpa` and `honours` are `None` exactly when `total_credits == 0`.
//! - `honours` is a pure function of `gpa`.

use super::person::StudentId;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Grade point average in fixed-point hundredths (`367` is `3.67`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Gpa(u32);

impl Gpa {
    pub const fn from_hundredths(hundredths: u32) -> Self {
        Self(hundredths)
    }

    pub const fn hundredths(self) -> u32 {
        self.0
    }

    /// Computes `round(total_points / total_credits * 100)`.
    ///
    /// Returns `None` when `total_credits` is not positive. Halves round up.
    pub fn from_totals(total_points: i64, total_credits: i64) -> Option<Self> {
        if total_credits <= 0 {
            return None;
        }
        let points = total_points.max(0);
        let rounded = (points * 200 + total_credits) / (total_credits * 2);
        Some(Self(u32::try_from(rounded).unwrap_or(u32::MAX)))
    }

    pub fn honours(self) -> Honours {
        Honours::for_gpa(self)
    }
}

impl Display for Gpa {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Degree classification derived from GPA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Honours {
    /// GPA >= 3.50.
    FirstClass,
    /// 3.00 <= GPA < 3.50.
    SecondClassUpper,
    /// 2.00 <= GPA < 3.00.
    SecondClassLower,
    /// 1.00 <= GPA < 2.00.
    ThirdClass,
    /// GPA < 1.00 with at least one credit.
    NoHonours,
}

impl Honours {
    pub fn for_gpa(gpa: Gpa) -> Self {
        match gpa.hundredths() {
            350.. => Self::FirstClass,
            300..=349 => Self::SecondClassUpper,
            200..=299 => Self::SecondClassLower,
            100..=199 => Self::ThirdClass,
            _ => Self::NoHonours,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::FirstClass => "First Class Honours",
            Self::SecondClassUpper => "Second Class Honours (Upper Division)",
            Self::SecondClassLower => "Second Class Honours (Lower Division)",
            Self::ThirdClass => "Third Class Honours",
            Self::NoHonours => "No Honours/Degree",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        [
            Self::FirstClass,
            Self::SecondClassUpper,
            Self::SecondClassLower,
            Self::ThirdClass,
            Self::NoHonours,
        ]
        .into_iter()
        .find(|honours| honours.label() == label)
    }
}

impl Display for Honours {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-student aggregate over the current enrollment set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicRecord {
    pub student_id: StudentId,
    pub course_count: i64,
    pub total_credits: i64,
    pub total_points: i64,
    /// `None` until the student carries credits.
    pub gpa: Option<Gpa>,
    pub honours: Option<Honours>,
}

impl AcademicRecord {
    /// Record for a student with no enrollments.
    pub fn empty(student_id: StudentId) -> Self {
        Self {
            student_id,
            course_count: 0,
            total_credits: 0,
            total_points: 0,
            gpa: None,
            honours: None,
        }
    }

    /// Replaces course count and credit totals.
    pub fn apply_course_totals(&mut self, course_count: i64, total_credits: i64) {
        self.course_count = course_count;
        self.total_credits = total_credits;
    }

    /// Replaces total points and re-derives GPA and honours.
    ///
    /// Uses the stored `total_credits`; callers that changed the enrollment
    /// set apply course totals first.
    pub fn apply_points(&mut self, total_points: i64) {
        self.total_points = total_points;
        self.gpa = Gpa::from_totals(self.total_points, self.total_credits);
        self.honours = self.gpa.map(Gpa::honours);
    }
}
