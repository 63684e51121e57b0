//! Department and course catalog model.

use super::person::TeacherId;
use serde::{Deserialize, Serialize};

pub type DepartmentId = i64;
pub type CourseId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    /// Unique, upper-case.
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    /// Unique, upper-case.
    pub code: String,
    /// Credit units; enrollments copy this at registration time.
    pub credit: i64,
    pub department_id: Option<DepartmentId>,
    pub teacher_id: Option<TeacherId>,
}

/// Input for creating one course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    pub name: String,
    pub code: String,
    pub credit: i64,
    pub department_id: Option<DepartmentId>,
    pub teacher_id: Option<TeacherId>,
}

impl NewCourse {
    pub fn new(name: impl Into<String>, code: impl Into<String>, credit: i64) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            credit,
            department_id: None,
            teacher_id: None,
        }
    }
}

/// Trims and upper-cases a department or course code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
