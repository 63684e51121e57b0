//! Directory use-case service.
//!
//! # Responsibility
//! - Create departments, courses and persons with normalized inputs.
//! - Give every new student an empty academic record.
//!
//! # Invariants
//! - Names and emails are trimmed and must not be blank.
//! - Department and course codes are stored upper-case.
//! - A student and their empty record commit in the same transaction.

use super::{
    in_transaction, resolve_course, resolve_student, CourseRef, GradebookError, GradebookResult,
    StudentRef,
};
use crate::model::course::{normalize_code, Course, Department, NewCourse};
use crate::model::person::{NewPerson, Person, UserId};
use crate::model::record::AcademicRecord;
use crate::repo::directory_repo::{DirectoryRepository, SqliteDirectoryRepository};
use crate::repo::ensure_connection_ready;
use crate::repo::record_repo::{RecordRepository, SqliteRecordRepository};
use crate::repo::RepoError;
use log::info;
use rusqlite::Connection;

/// Directory service facade over one connection.
pub struct DirectoryService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> DirectoryService<'conn> {
    /// Creates service after verifying the schema is migrated.
    pub fn try_new(conn: &'conn Connection) -> GradebookResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    pub fn create_department(&self, name: &str, code: &str) -> GradebookResult<Department> {
        let name = required(name, "department name")?;
        let code = normalize_code(required(code, "department code")?);
        in_transaction(self.conn, |conn| {
            Ok(SqliteDirectoryRepository::new(conn).create_department(name, &code)?)
        })
    }

    /// Creates a course; `credit` must be positive.
    pub fn create_course(&self, course: NewCourse) -> GradebookResult<Course> {
        if course.credit <= 0 {
            return Err(GradebookError::InvalidCredit(course.credit));
        }
        let normalized = NewCourse {
            name: required(&course.name, "course name")?.to_string(),
            code: normalize_code(required(&course.code, "course code")?),
            ..course
        };
        in_transaction(self.conn, |conn| {
            let repo = SqliteDirectoryRepository::new(conn);
            if let Some(department_id) = normalized.department_id {
                if repo.get_department(department_id)?.is_none() {
                    return Err(GradebookError::DepartmentNotFound(department_id));
                }
            }
            if let Some(teacher_id) = normalized.teacher_id {
                if repo.find_teacher(teacher_id)?.is_none() {
                    return Err(GradebookError::TeacherNotFound(teacher_id));
                }
            }
            Ok(repo.create_course(&normalized)?)
        })
    }

    pub fn get_course(&self, course: &CourseRef) -> GradebookResult<Course> {
        resolve_course(self.conn, course)
    }

    /// Creates a person of any kind; students also get an empty record.
    pub fn create_person(&self, person: NewPerson) -> GradebookResult<Person> {
        let normalized = NewPerson {
            first_name: required(&person.first_name, "first name")?.to_string(),
            last_name: required(&person.last_name, "last name")?.to_string(),
            email: required(&person.email, "email")?.to_lowercase(),
            ..person
        };
        let created = in_transaction(self.conn, |conn| {
            let repo = SqliteDirectoryRepository::new(conn);
            if let Some(department_id) = normalized.department_id {
                if repo.get_department(department_id)?.is_none() {
                    return Err(GradebookError::DepartmentNotFound(department_id));
                }
            }
            let created = repo.create_person(&normalized)?;
            if let Some(student_id) = created.student_id() {
                SqliteRecordRepository::new(conn).save_record(&AcademicRecord::empty(student_id))?;
            }
            Ok(created)
        })?;
        info!(
            "event=person_created module=directory status=ok kind={} user_id={}",
            created.kind().as_str(),
            created.profile().id
        );
        Ok(created)
    }

    pub fn get_person(&self, user_id: UserId) -> GradebookResult<Person> {
        SqliteDirectoryRepository::new(self.conn)
            .get_person(user_id)?
            .ok_or(GradebookError::PersonNotFound(user_id))
    }

    /// Resolves a student by id or matriculation number.
    pub fn get_student(&self, student: &StudentRef) -> GradebookResult<Person> {
        let student_id = resolve_student(self.conn, student)?;
        SqliteDirectoryRepository::new(self.conn)
            .find_student(student_id)?
            .ok_or_else(|| GradebookError::StudentNotFound(student.clone()))
    }

    /// Deletes a person; a student's enrollments and record go with them.
    pub fn delete_person(&self, user_id: UserId) -> GradebookResult<()> {
        in_transaction(self.conn, |conn| {
            SqliteDirectoryRepository::new(conn)
                .delete_person(user_id)
                .map_err(|err| match err {
                    RepoError::NotFound { .. } => GradebookError::PersonNotFound(user_id),
                    other => other.into(),
                })
        })?;
        info!("event=person_deleted module=directory status=ok user_id={user_id}");
        Ok(())
    }
}

fn required<'a>(value: &'a str, field: &'static str) -> GradebookResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(GradebookError::InvalidField(field));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::required;
    use crate::service::GradebookError;

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("  Ada ", "first name").unwrap(), "Ada");
        assert!(matches!(
            required("   ", "email"),
            Err(GradebookError::InvalidField("email"))
        ));
    }
}
