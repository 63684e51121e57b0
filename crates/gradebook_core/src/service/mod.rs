//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Run every mutating use case inside one immediate SQLite transaction.
//!
//! # Invariants
//! - Validation errors are raised before the first write.
//! - A failed use case rolls back completely; nothing is partially visible.

use crate::model::course::{normalize_code, Course, CourseId};
use crate::model::grade::GradeScaleError;
use crate::model::person::{is_matric_no, StudentId};
use crate::repo::directory_repo::{DirectoryRepository, SqliteDirectoryRepository};
use crate::repo::RepoError;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod directory_service;
pub mod enrollment_service;
pub mod gradebook_service;
pub mod record_service;

pub type GradebookResult<T> = Result<T, GradebookError>;

/// Errors from gradebook use cases.
#[derive(Debug)]
pub enum GradebookError {
    /// Score is outside `[MIN_SCORE, MAX_SCORE]`.
    InvalidScore(i64),
    /// Course credit is not positive.
    InvalidCredit(i64),
    /// A required text field is blank after trim.
    InvalidField(&'static str),
    AlreadyRegistered {
        student_id: StudentId,
        course_id: CourseId,
    },
    NotRegistered {
        student_id: StudentId,
        course_id: CourseId,
    },
    StudentNotFound(StudentRef),
    CourseNotFound(CourseRef),
    DepartmentNotFound(i64),
    TeacherNotFound(i64),
    PersonNotFound(i64),
    /// Unique key already taken.
    Duplicate { entity: &'static str, key: String },
    /// Grade scale is misconfigured or misses a score.
    GradeScale(GradeScaleError),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for GradebookError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidScore(score) => write!(f, "score {score} is outside 0..=100"),
            Self::InvalidCredit(credit) => write!(f, "credit {credit} must be positive"),
            Self::InvalidField(field) => write!(f, "{field} must not be blank"),
            Self::AlreadyRegistered {
                student_id,
                course_id,
            } => write!(
                f,
                "student {student_id} is already registered for course {course_id}"
            ),
            Self::NotRegistered {
                student_id,
                course_id,
            } => write!(
                f,
                "student {student_id} is not registered for course {course_id}"
            ),
            Self::StudentNotFound(student) => write!(f, "student not found: {student}"),
            Self::CourseNotFound(course) => write!(f, "course not found: {course}"),
            Self::DepartmentNotFound(id) => write!(f, "department not found: {id}"),
            Self::TeacherNotFound(id) => write!(f, "teacher not found: {id}"),
            Self::PersonNotFound(id) => write!(f, "user not found: {id}"),
            Self::Duplicate { entity, key } => write!(f, "{entity} already exists: {key}"),
            Self::GradeScale(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GradebookError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::GradeScale(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for GradebookError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Conflict { entity, key } => Self::Duplicate { entity, key },
            other => Self::Repo(other),
        }
    }
}

impl From<GradeScaleError> for GradebookError {
    fn from(value: GradeScaleError) -> Self {
        Self::GradeScale(value)
    }
}

impl From<rusqlite::Error> for GradebookError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// Student reference accepted by use cases: numeric id or matriculation number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StudentRef {
    Id(StudentId),
    MatricNo(String),
}

impl StudentRef {
    /// Parses request input: matric-shaped text, else a numeric id.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if is_matric_no(trimmed) {
            return Self::MatricNo(trimmed.to_string());
        }
        match trimmed.parse() {
            Ok(id) => Self::Id(id),
            Err(_) => Self::MatricNo(trimmed.to_string()),
        }
    }
}

impl From<StudentId> for StudentRef {
    fn from(value: StudentId) -> Self {
        Self::Id(value)
    }
}

impl Display for StudentRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::MatricNo(matric_no) => f.write_str(matric_no),
        }
    }
}

/// Course reference accepted by use cases: numeric id or course code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CourseRef {
    Id(CourseId),
    Code(String),
}

impl CourseRef {
    /// Parses request input: digits are an id, anything else a code.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.parse() {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Code(normalize_code(trimmed)),
        }
    }
}

impl From<CourseId> for CourseRef {
    fn from(value: CourseId) -> Self {
        Self::Id(value)
    }
}

impl Display for CourseRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Code(code) => f.write_str(code),
        }
    }
}

/// Runs `op` inside one immediate transaction; any error rolls back.
pub(crate) fn in_transaction<T, F>(conn: &Connection, op: F) -> GradebookResult<T>
where
    F: FnOnce(&Connection) -> GradebookResult<T>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let value = op(&tx)?;
    tx.commit()?;
    Ok(value)
}

pub(crate) fn resolve_student(conn: &Connection, student: &StudentRef) -> GradebookResult<StudentId> {
    let repo = SqliteDirectoryRepository::new(conn);
    let person = match student {
        StudentRef::Id(id) => repo.find_student(*id)?,
        StudentRef::MatricNo(matric_no) => repo.find_student_by_matric(matric_no)?,
    };
    person
        .and_then(|person| person.student_id())
        .ok_or_else(|| GradebookError::StudentNotFound(student.clone()))
}

pub(crate) fn resolve_course(conn: &Connection, course: &CourseRef) -> GradebookResult<Course> {
    let repo = SqliteDirectoryRepository::new(conn);
    let found = match course {
        CourseRef::Id(id) => repo.get_course(*id)?,
        CourseRef::Code(code) => repo.find_course_by_code(&normalize_code(code))?,
    };
    found.ok_or_else(|| GradebookError::CourseNotFound(course.clone()))
}
