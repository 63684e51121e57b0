use gradebook_core::db::open_db_in_memory;
use gradebook_core::model::person::is_matric_no;
use gradebook_core::{
    CourseRef, DirectoryService, GradebookError, GradebookService, NewCourse, NewPerson, Person,
    PersonKind, RecordService, RepoError, StudentRef,
};

#[test]
fn student_gets_matric_number_username_and_record() {
    let conn = open_db_in_memory().unwrap();
    let directory = DirectoryService::try_new(&conn).unwrap();

    let person = directory
        .create_person(NewPerson::new(
            PersonKind::Student,
            " Ada ",
            "Obi",
            "Ada.Obi@Example.edu",
        ))
        .unwrap();

    let Person::Student {
        student_id,
        matric_no,
        profile,
    } = &person
    else {
        panic!("expected student, got {person:?}");
    };
    assert!(is_matric_no(matric_no), "bad matric number {matric_no}");
    assert!(matric_no.ends_with(&format!("/{student_id:04}")));
    assert_eq!(profile.first_name, "Ada");
    assert_eq!(profile.email, "ada.obi@example.edu");
    assert_eq!(profile.username, format!("ada.obi{}", profile.id));

    let by_matric = directory
        .get_student(&StudentRef::parse(matric_no))
        .unwrap();
    assert_eq!(by_matric, person);

    let record = RecordService::try_new(&conn)
        .unwrap()
        .get_record(&StudentRef::Id(*student_id))
        .unwrap();
    assert_eq!(record.course_count, 0);
    assert_eq!(record.gpa, None);
}

#[test]
fn person_reads_dispatch_on_kind() {
    let conn = open_db_in_memory().unwrap();
    let directory = DirectoryService::try_new(&conn).unwrap();
    let department = directory.create_department("Computing", " cs ").unwrap();
    assert_eq!(department.code, "CS");

    let teacher = directory
        .create_person(
            NewPerson::new(PersonKind::Teacher, "Grace", "Hopper", "grace@example.edu")
                .in_department(department.id),
        )
        .unwrap();
    let admin = directory
        .create_person(NewPerson::new(
            PersonKind::Admin,
            "Root",
            "User",
            "root@example.edu",
        ))
        .unwrap();

    let loaded_teacher = directory.get_person(teacher.profile().id).unwrap();
    match &loaded_teacher {
        Person::Teacher {
            staff_code,
            profile,
            ..
        } => {
            assert!(staff_code.starts_with("TCH/"));
            assert_eq!(profile.department_id, Some(department.id));
        }
        other => panic!("expected teacher, got {other:?}"),
    }
    assert_eq!(loaded_teacher.kind(), PersonKind::Teacher);
    assert_eq!(loaded_teacher.student_id(), None);

    let loaded_admin = directory.get_person(admin.profile().id).unwrap();
    assert!(matches!(loaded_admin, Person::Admin { .. }));

    let err = directory
        .get_student(&StudentRef::Id(teacher.profile().id))
        .unwrap_err();
    assert!(matches!(err, GradebookError::StudentNotFound(_)));
}

#[test]
fn duplicate_email_and_course_code_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let directory = DirectoryService::try_new(&conn).unwrap();

    directory
        .create_person(NewPerson::new(
            PersonKind::Student,
            "Ada",
            "Obi",
            "ada@example.edu",
        ))
        .unwrap();
    let err = directory
        .create_person(NewPerson::new(
            PersonKind::Teacher,
            "Ada",
            "Other",
            "ADA@example.edu",
        ))
        .unwrap_err();
    assert!(matches!(err, GradebookError::Duplicate { entity: "user", .. }));

    directory
        .create_course(NewCourse::new("Compilers", "cs401", 3))
        .unwrap();
    let err = directory
        .create_course(NewCourse::new("Compilers II", "CS401", 3))
        .unwrap_err();
    assert!(matches!(err, GradebookError::Duplicate { entity: "course", .. }));
}

#[test]
fn course_input_is_validated() {
    let conn = open_db_in_memory().unwrap();
    let directory = DirectoryService::try_new(&conn).unwrap();

    let err = directory
        .create_course(NewCourse::new("Algebra", "MTH101", 0))
        .unwrap_err();
    assert!(matches!(err, GradebookError::InvalidCredit(0)));

    let err = directory
        .create_course(NewCourse::new("  ", "MTH101", 3))
        .unwrap_err();
    assert!(matches!(err, GradebookError::InvalidField("course name")));

    let mut course = NewCourse::new("Algebra", "MTH101", 3);
    course.department_id = Some(404);
    let err = directory.create_course(course).unwrap_err();
    assert!(matches!(err, GradebookError::DepartmentNotFound(404)));

    let mut course = NewCourse::new("Algebra", "MTH101", 3);
    course.teacher_id = Some(404);
    let err = directory.create_course(course).unwrap_err();
    assert!(matches!(err, GradebookError::TeacherNotFound(404)));

    let created = directory
        .create_course(NewCourse::new("Algebra", " mth101 ", 3))
        .unwrap();
    assert_eq!(created.code, "MTH101");
    assert_eq!(
        directory.get_course(&CourseRef::parse("mth101")).unwrap(),
        created
    );
}

#[test]
fn deleting_student_removes_enrollments_and_record() {
    let conn = open_db_in_memory().unwrap();
    let directory = DirectoryService::try_new(&conn).unwrap();
    directory
        .create_course(NewCourse::new("Compilers", "CS401", 3))
        .unwrap();
    let person = directory
        .create_person(NewPerson::new(
            PersonKind::Student,
            "Ada",
            "Obi",
            "ada@example.edu",
        ))
        .unwrap();
    let student = StudentRef::Id(person.student_id().unwrap());
    GradebookService::try_new(&conn)
        .unwrap()
        .register_courses(&student, &[CourseRef::parse("CS401")], "admin")
        .unwrap();

    directory.delete_person(person.profile().id).unwrap();

    let remaining: i64 = conn
        .query_row(
            "SELECT
                (SELECT COUNT(*) FROM enrollments)
              + (SELECT COUNT(*) FROM academic_records)
              + (SELECT COUNT(*) FROM students);",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(remaining, 0);

    let err = directory.delete_person(person.profile().id).unwrap_err();
    assert!(matches!(err, GradebookError::PersonNotFound(_)));
}

#[test]
fn course_can_be_assigned_to_an_existing_teacher() {
    let conn = open_db_in_memory().unwrap();
    let directory = DirectoryService::try_new(&conn).unwrap();
    let teacher = directory
        .create_person(NewPerson::new(
            PersonKind::Teacher,
            "Grace",
            "Hopper",
            "grace@example.edu",
        ))
        .unwrap();
    let Person::Teacher { teacher_id, .. } = &teacher else {
        panic!("expected teacher, got {teacher:?}");
    };
    let teacher_id = *teacher_id;

    let mut course = NewCourse::new("Compilers", "CS401", 3);
    course.teacher_id = Some(teacher_id);
    let created = directory.create_course(course).unwrap();
    assert_eq!(created.teacher_id, Some(teacher_id));
}

#[test]
fn person_without_username_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let directory = DirectoryService::try_new(&conn).unwrap();
    let person = directory
        .create_person(NewPerson::new(
            PersonKind::Admin,
            "Root",
            "User",
            "root@example.edu",
        ))
        .unwrap();

    conn.execute(
        "UPDATE users SET username = NULL WHERE id = ?1;",
        [person.profile().id],
    )
    .unwrap();

    let err = directory.get_person(person.profile().id).unwrap_err();
    assert!(
        matches!(&err, GradebookError::Repo(RepoError::InvalidData(message)) if message.contains("username")),
        "unexpected error {err:?}"
    );
}

#[test]
fn records_are_listed_for_every_student_in_id_order() {
    let conn = open_db_in_memory().unwrap();
    let directory = DirectoryService::try_new(&conn).unwrap();
    directory
        .create_course(NewCourse::new("Compilers", "CS401", 3))
        .unwrap();
    let mut students = Vec::new();
    for (first, email) in [("Ada", "ada@example.edu"), ("Ben", "ben@example.edu")] {
        let person = directory
            .create_person(NewPerson::new(PersonKind::Student, first, "Obi", email))
            .unwrap();
        students.push(person.student_id().unwrap());
    }

    let gradebook = GradebookService::try_new(&conn).unwrap();
    let first = StudentRef::Id(students[0]);
    gradebook
        .register_courses(&first, &[CourseRef::parse("CS401")], "admin")
        .unwrap();
    gradebook
        .grade_courses(&first, &[(CourseRef::parse("CS401"), 72)], "teacher")
        .unwrap();

    let records = RecordService::try_new(&conn)
        .unwrap()
        .list_records()
        .unwrap();
    let ids: Vec<_> = records.iter().map(|record| record.student_id).collect();
    assert_eq!(ids, students);
    assert_eq!(records[0].course_count, 1);
    assert_eq!(records[0].total_points, 12);
    assert_eq!(records[1].course_count, 0);
    assert_eq!(records[1].gpa, None);
}
