//! People known to the gradebook.
//!
//! # Responsibility
//! - Model students, teachers and admins as one tagged variant over a shared
//!   profile.
//! - Generate usernames, matriculation numbers and staff codes.
//!
//! # Invariants
//! - `PersonKind` is the persisted tag; reads dispatch on it explicitly.
//! - Matriculation numbers look like `STU/<yyy>/<nnnn>`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Row id shared by every person (`users.id`).
pub type UserId = i64;
/// Student-specific id (`students.student_id`).
pub type StudentId = i64;
/// Teacher-specific id (`teachers.teacher_id`).
pub type TeacherId = i64;

static MATRIC_NO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^STU/\d{3}/\d{4,}$").expect("valid matric regex"));

/// Persisted discriminator for [`Person`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonKind {
    Student,
    Teacher,
    Admin,
}

impl PersonKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "student" => Some(Self::Student),
            "teacher" => Some(Self::Teacher),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Fields every person carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub department_id: Option<i64>,
}

/// A person, resolved by its stored kind tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Person {
    Student {
        student_id: StudentId,
        matric_no: String,
        profile: Profile,
    },
    Teacher {
        teacher_id: TeacherId,
        staff_code: String,
        profile: Profile,
    },
    Admin {
        profile: Profile,
    },
}

impl Person {
    pub fn kind(&self) -> PersonKind {
        match self {
            Self::Student { .. } => PersonKind::Student,
            Self::Teacher { .. } => PersonKind::Teacher,
            Self::Admin { .. } => PersonKind::Admin,
        }
    }

    pub fn profile(&self) -> &Profile {
        match self {
            Self::Student { profile, .. }
            | Self::Teacher { profile, .. }
            | Self::Admin { profile } => profile,
        }
    }

    pub fn student_id(&self) -> Option<StudentId> {
        match self {
            Self::Student { student_id, .. } => Some(*student_id),
            _ => None,
        }
    }
}

/// Input for creating one person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPerson {
    pub kind: PersonKind,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department_id: Option<i64>,
}

impl NewPerson {
    pub fn new(
        kind: PersonKind,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            department_id: None,
        }
    }

    pub fn in_department(mut self, department_id: i64) -> Self {
        self.department_id = Some(department_id);
        self
    }
}

/// Builds `first.last<id>` in lower case.
pub fn generate_username(first_name: &str, last_name: &str, user_id: UserId) -> String {
    format!(
        "{}.{}{user_id}",
        first_name.trim().to_lowercase(),
        last_name.trim().to_lowercase()
    )
}

/// Builds `STU/<last 3 digits of year>/<student id, 4 digits>`.
pub fn generate_matric_no(year: i32, student_id: StudentId) -> String {
    format!("STU/{}/{student_id:04}", year_suffix(year))
}

/// Builds `TCH/<last 3 digits of year>/<teacher id, 4 digits>`.
pub fn generate_staff_code(year: i32, teacher_id: TeacherId) -> String {
    format!("TCH/{}/{teacher_id:04}", year_suffix(year))
}

/// Returns whether `value` has matriculation number shape.
pub fn is_matric_no(value: &str) -> bool {
    MATRIC_NO_RE.is_match(value)
}

fn year_suffix(year: i32) -> String {
    format!("{:03}", year.rem_euclid(1000))
}

#[cfg(test)]
mod tests {
    use super::{
        generate_matric_no, generate_staff_code, generate_username, is_matric_no, Person,
        PersonKind, Profile,
    };

    fn profile() -> Profile {
        Profile {
            id: 3,
            first_name: "Ada".to_string(),
            last_name: "Obi".to_string(),
            email: "ada@school.test".to_string(),
            username: "ada.obi3".to_string(),
            department_id: None,
        }
    }

    #[test]
    fn codes_use_year_suffix_and_padded_id() {
        assert_eq!(generate_matric_no(2023, 7), "STU/023/0007");
        assert_eq!(generate_staff_code(2023, 12), "TCH/023/0012");
        assert_eq!(generate_matric_no(2023, 12345), "STU/023/12345");
        assert_eq!(generate_username(" Ada ", "OBI", 3), "ada.obi3");
    }

    #[test]
    fn matric_shape_is_recognized() {
        assert!(is_matric_no("STU/023/0007"));
        assert!(!is_matric_no("TCH/023/0007"));
        assert!(!is_matric_no("42"));
    }

    #[test]
    fn kind_tag_round_trips_and_dispatches() {
        for kind in [PersonKind::Student, PersonKind::Teacher, PersonKind::Admin] {
            assert_eq!(PersonKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(PersonKind::parse("user"), None);

        let student = Person::Student {
            student_id: 1,
            matric_no: "STU/023/0001".to_string(),
            profile: profile(),
        };
        assert_eq!(student.kind(), PersonKind::Student);
        assert_eq!(student.student_id(), Some(1));
        assert_eq!(student.profile().username, "ada.obi3");

        let admin = Person::Admin { profile: profile() };
        assert_eq!(admin.student_id(), None);
    }

    #[test]
    fn person_serializes_with_kind_tag() {
        let admin = Person::Admin { profile: profile() };
        let value = serde_json::to_value(&admin).unwrap();
        assert_eq!(value["kind"], "admin");
        assert_eq!(value["profile"]["email"], "ada@school.test");
    }
}
