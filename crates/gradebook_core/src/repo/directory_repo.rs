//! Department, course and person persistence.
//!
//! # Responsibility
//! - Store the directory data the grading core references by id.
//! - Resolve persons by dispatching on the stored `kind` tag.
//!
//! # Invariants
//! - Department and course codes are stored upper-case and unique.
//! - A `student` user always has a `students` row; a `teacher` user always
//!   has a `teachers` row. Violations surface as `InvalidData`.
//! - `create_person` issues several statements; callers hold a transaction.

use super::{map_conflict, RepoError, RepoResult};
use crate::model::course::{Course, CourseId, Department, DepartmentId, NewCourse};
use crate::model::person::{
    generate_matric_no, generate_staff_code, generate_username, NewPerson, Person, PersonKind,
    Profile, StudentId, TeacherId, UserId,
};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

const COURSE_SELECT_SQL: &str = "SELECT
    id,
    name,
    code,
    credit,
    department_id,
    teacher_id
FROM courses";

const PERSON_SELECT_SQL: &str = "SELECT
    u.id AS id,
    u.kind AS kind,
    u.first_name AS first_name,
    u.last_name AS last_name,
    u.email AS email,
    u.username AS username,
    u.department_id AS department_id,
    s.student_id AS student_id,
    s.matric_no AS matric_no,
    t.teacher_id AS teacher_id,
    t.staff_code AS staff_code
FROM users u
LEFT JOIN students s ON s.user_id = u.id
LEFT JOIN teachers t ON t.user_id = u.id";

/// Repository interface for directory data.
pub trait DirectoryRepository {
    fn create_department(&self, name: &str, code: &str) -> RepoResult<Department>;
    fn get_department(&self, id: DepartmentId) -> RepoResult<Option<Department>>;
    fn create_course(&self, course: &NewCourse) -> RepoResult<Course>;
    fn get_course(&self, id: CourseId) -> RepoResult<Option<Course>>;
    fn find_course_by_code(&self, code: &str) -> RepoResult<Option<Course>>;
    fn set_course_credit(&self, id: CourseId, credit: i64) -> RepoResult<()>;
    /// Inserts the user row plus its kind-specific row and generated codes.
    fn create_person(&self, person: &NewPerson) -> RepoResult<Person>;
    fn get_person(&self, user_id: UserId) -> RepoResult<Option<Person>>;
    fn find_student(&self, student_id: StudentId) -> RepoResult<Option<Person>>;
    fn find_student_by_matric(&self, matric_no: &str) -> RepoResult<Option<Person>>;
    fn find_teacher(&self, teacher_id: TeacherId) -> RepoResult<Option<Person>>;
    /// Deletes the user; kind rows, enrollments and records cascade.
    fn delete_person(&self, user_id: UserId) -> RepoResult<()>;
}

/// SQLite-backed directory repository.
pub struct SqliteDirectoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDirectoryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_person(&self, filter: &str, key: &dyn ToSql) -> RepoResult<Option<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} WHERE {filter};"))?;
        let mut rows = stmt.query([key])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(row)?));
        }
        Ok(None)
    }

    fn query_course(&self, filter: &str, key: &dyn ToSql) -> RepoResult<Option<Course>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COURSE_SELECT_SQL} WHERE {filter};"))?;
        let mut rows = stmt.query([key])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_course_row(row)?));
        }
        Ok(None)
    }

    fn current_year(&self) -> RepoResult<i32> {
        let year = self.conn.query_row(
            "SELECT CAST(strftime('%Y', 'now') AS INTEGER);",
            [],
            |row| row.get(0),
        )?;
        Ok(year)
    }
}

impl DirectoryRepository for SqliteDirectoryRepository<'_> {
    fn create_department(&self, name: &str, code: &str) -> RepoResult<Department> {
        self.conn
            .execute(
                "INSERT INTO departments (name, code) VALUES (?1, ?2);",
                params![name, code],
            )
            .map_err(|err| map_conflict(err, "department", code))?;
        Ok(Department {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            code: code.to_string(),
        })
    }

    fn get_department(&self, id: DepartmentId) -> RepoResult<Option<Department>> {
        let department = self
            .conn
            .query_row(
                "SELECT id, name, code FROM departments WHERE id = ?1;",
                [id],
                |row| {
                    Ok(Department {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        code: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(department)
    }

    fn create_course(&self, course: &NewCourse) -> RepoResult<Course> {
        self.conn
            .execute(
                "INSERT INTO courses (name, code, credit, department_id, teacher_id)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    course.name.as_str(),
                    course.code.as_str(),
                    course.credit,
                    course.department_id,
                    course.teacher_id,
                ],
            )
            .map_err(|err| map_conflict(err, "course", course.code.as_str()))?;
        let id = self.conn.last_insert_rowid();
        self.get_course(id)?
            .ok_or_else(|| RepoError::not_found("course", id))
    }

    fn get_course(&self, id: CourseId) -> RepoResult<Option<Course>> {
        self.query_course("id = ?1", &id)
    }

    fn find_course_by_code(&self, code: &str) -> RepoResult<Option<Course>> {
        self.query_course("code = ?1", &code)
    }

    fn set_course_credit(&self, id: CourseId, credit: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE courses SET credit = ?2 WHERE id = ?1;",
            params![id, credit],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("course", id));
        }
        Ok(())
    }

    fn create_person(&self, person: &NewPerson) -> RepoResult<Person> {
        self.conn
            .execute(
                "INSERT INTO users (kind, first_name, last_name, email, department_id)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    person.kind.as_str(),
                    person.first_name.as_str(),
                    person.last_name.as_str(),
                    person.email.as_str(),
                    person.department_id,
                ],
            )
            .map_err(|err| map_conflict(err, "user", person.email.as_str()))?;
        let user_id = self.conn.last_insert_rowid();

        let username = generate_username(&person.first_name, &person.last_name, user_id);
        self.conn
            .execute(
                "UPDATE users SET username = ?2 WHERE id = ?1;",
                params![user_id, username.as_str()],
            )
            .map_err(|err| map_conflict(err, "user", username.as_str()))?;

        match person.kind {
            PersonKind::Student => {
                self.conn.execute(
                    "INSERT INTO students (user_id) VALUES (?1);",
                    [user_id],
                )?;
                let student_id = self.conn.last_insert_rowid();
                let matric_no = generate_matric_no(self.current_year()?, student_id);
                self.conn
                    .execute(
                        "UPDATE students SET matric_no = ?2 WHERE student_id = ?1;",
                        params![student_id, matric_no.as_str()],
                    )
                    .map_err(|err| map_conflict(err, "student", matric_no.as_str()))?;
            }
            PersonKind::Teacher => {
                self.conn.execute(
                    "INSERT INTO teachers (user_id) VALUES (?1);",
                    [user_id],
                )?;
                let teacher_id = self.conn.last_insert_rowid();
                let staff_code = generate_staff_code(self.current_year()?, teacher_id);
                self.conn
                    .execute(
                        "UPDATE teachers SET staff_code = ?2 WHERE teacher_id = ?1;",
                        params![teacher_id, staff_code.as_str()],
                    )
                    .map_err(|err| map_conflict(err, "teacher", staff_code.as_str()))?;
            }
            PersonKind::Admin => {}
        }

        self.get_person(user_id)?
            .ok_or_else(|| RepoError::not_found("user", user_id))
    }

    fn get_person(&self, user_id: UserId) -> RepoResult<Option<Person>> {
        self.query_person("u.id = ?1", &user_id)
    }

    fn find_student(&self, student_id: StudentId) -> RepoResult<Option<Person>> {
        self.query_person("s.student_id = ?1", &student_id)
    }

    fn find_student_by_matric(&self, matric_no: &str) -> RepoResult<Option<Person>> {
        self.query_person("s.matric_no = ?1", &matric_no)
    }

    fn find_teacher(&self, teacher_id: TeacherId) -> RepoResult<Option<Person>> {
        self.query_person("t.teacher_id = ?1", &teacher_id)
    }

    fn delete_person(&self, user_id: UserId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1;", [user_id])?;
        if changed == 0 {
            return Err(RepoError::not_found("user", user_id));
        }
        Ok(())
    }
}

fn parse_course_row(row: &Row<'_>) -> RepoResult<Course> {
    Ok(Course {
        id: row.get("id")?,
        name: row.get("name")?,
        code: row.get("code")?,
        credit: row.get("credit")?,
        department_id: row.get("department_id")?,
        teacher_id: row.get("teacher_id")?,
    })
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    let user_id: UserId = row.get("id")?;
    let kind_text: String = row.get("kind")?;
    let kind = PersonKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid user kind `{kind_text}` for user {user_id}"))
    })?;

    let missing = |column: &str| {
        RepoError::InvalidData(format!("{kind_text} user {user_id} has no {column}"))
    };

    let profile = Profile {
        id: user_id,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
        username: row
            .get::<_, Option<String>>("username")?
            .ok_or_else(|| missing("username"))?,
        department_id: row.get("department_id")?,
    };

    let person = match kind {
        PersonKind::Student => Person::Student {
            student_id: row
                .get::<_, Option<StudentId>>("student_id")?
                .ok_or_else(|| missing("student row"))?,
            matric_no: row
                .get::<_, Option<String>>("matric_no")?
                .ok_or_else(|| missing("matric_no"))?,
            profile,
        },
        PersonKind::Teacher => Person::Teacher {
            teacher_id: row
                .get::<_, Option<i64>>("teacher_id")?
                .ok_or_else(|| missing("teacher row"))?,
            staff_code: row
                .get::<_, Option<String>>("staff_code")?
                .ok_or_else(|| missing("staff_code"))?,
            profile,
        },
        PersonKind::Admin => Person::Admin { profile },
    };
    Ok(person)
}
