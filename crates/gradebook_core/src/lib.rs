//! Core grading logic for Gradebook.
//! This crate owns score-to-grade resolution, enrollments and the academic
//! record aggregates derived from them.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::course::{Course, CourseId, Department, NewCourse};
pub use model::enrollment::{Enrollment, EnrollmentState};
pub use model::grade::{
    resolve_grade, scored_point, GradeBand, GradeScale, GradeScaleError, ResolvedGrade,
};
pub use model::person::{NewPerson, Person, PersonKind, Profile, StudentId};
pub use model::record::{AcademicRecord, Gpa, Honours};
pub use repo::{RepoError, RepoResult};
pub use service::directory_service::DirectoryService;
pub use service::enrollment_service::EnrollmentService;
pub use service::gradebook_service::{CreditUpdate, GradebookService};
pub use service::record_service::{RebuildSummary, RecordService};
pub use service::{CourseRef, GradebookError, GradebookResult, StudentRef};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
