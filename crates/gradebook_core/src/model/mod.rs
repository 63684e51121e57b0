//! Domain model for grading and academic records.
//!
//! # Responsibility
//! - Define the data structures the grading core reasons about.
//! - Keep grade and GPA arithmetic pure and storage-agnostic.
//!
//! # Invariants
//! - Derived fields (grades, points, GPA, honours) are only ever computed
//!   here, never assembled by callers.

pub mod course;
pub mod enrollment;
pub mod grade;
pub mod person;
pub mod record;
