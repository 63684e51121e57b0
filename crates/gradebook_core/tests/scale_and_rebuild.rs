use gradebook_core::db::open_db_in_memory;
use gradebook_core::{
    CourseRef, DirectoryService, EnrollmentService, Gpa, GradeBand, GradeScale, GradeScaleError,
    GradebookError, GradebookService, Honours, NewCourse, NewPerson, PersonKind, RebuildSummary,
    RecordService, StudentRef,
};
use rusqlite::Connection;

/// Student with TC1/TC2/TC3 (2/3/4 credits) graded 80/65/75.
fn graded_fixture() -> (Connection, StudentRef) {
    let conn = open_db_in_memory().unwrap();
    let student = {
        let directory = DirectoryService::try_new(&conn).unwrap();
        for (code, credit) in [("TC1", 2), ("TC2", 3), ("TC3", 4)] {
            directory
                .create_course(NewCourse::new(format!("Course {code}"), code, credit))
                .unwrap();
        }
        let person = directory
            .create_person(NewPerson::new(
                PersonKind::Student,
                "Ada",
                "Obi",
                "ada.obi@example.edu",
            ))
            .unwrap();
        let student = StudentRef::Id(person.student_id().unwrap());

        let gradebook = GradebookService::try_new(&conn).unwrap();
        let courses = ["TC1", "TC2", "TC3"].map(CourseRef::parse);
        gradebook
            .register_courses(&student, &courses, "admin")
            .unwrap();
        gradebook
            .grade_courses(
                &student,
                &[
                    (CourseRef::parse("TC1"), 80),
                    (CourseRef::parse("TC2"), 65),
                    (CourseRef::parse("TC3"), 75),
                ],
                "teacher",
            )
            .unwrap();
        student
    };
    (conn, student)
}

fn five_point_scale() -> Vec<GradeBand> {
    vec![
        GradeBand::new("A", 5, 70, 100),
        GradeBand::new("B", 4, 60, 69),
        GradeBand::new("C", 3, 50, 59),
        GradeBand::new("D", 2, 45, 49),
        GradeBand::new("E", 1, 40, 44),
        GradeBand::new("F", 0, 0, 39),
    ]
}

#[test]
fn course_credit_change_propagates_to_enrollments_and_records() {
    let (conn, student) = graded_fixture();
    let gradebook = GradebookService::try_new(&conn).unwrap();

    let update = gradebook
        .update_course_credit(&CourseRef::parse("TC2"), 5, "admin")
        .unwrap();
    assert_eq!(update.course.credit, 5);
    assert_eq!(update.records.len(), 1);

    let enrollment = EnrollmentService::try_new(&conn)
        .unwrap()
        .get(&student, &CourseRef::parse("TC2"))
        .unwrap()
        .unwrap();
    assert_eq!(enrollment.credit, 5);
    assert_eq!(enrollment.scored_point, 15);

    let record = RecordService::try_new(&conn)
        .unwrap()
        .get_record(&student)
        .unwrap();
    assert_eq!(record, update.records[0]);
    assert_eq!(record.total_credits, 11);
    assert_eq!(record.total_points, 39);
    assert_eq!(record.gpa, Some(Gpa::from_hundredths(355)));
    assert_eq!(record.honours, Some(Honours::FirstClass));
}

#[test]
fn non_positive_course_credit_is_rejected() {
    let (conn, _) = graded_fixture();
    let gradebook = GradebookService::try_new(&conn).unwrap();

    let err = gradebook
        .update_course_credit(&CourseRef::parse("TC2"), 0, "admin")
        .unwrap_err();
    assert!(matches!(err, GradebookError::InvalidCredit(0)));

    let course = DirectoryService::try_new(&conn)
        .unwrap()
        .get_course(&CourseRef::parse("TC2"))
        .unwrap();
    assert_eq!(course.credit, 3);
}

#[test]
fn replacing_scale_regrades_everything() {
    let (conn, student) = graded_fixture();
    let gradebook = GradebookService::try_new(&conn).unwrap();

    let summary = gradebook
        .replace_grade_scale(five_point_scale(), "registrar")
        .unwrap();
    assert_eq!(
        summary,
        RebuildSummary {
            enrollments_checked: 3,
            enrollments_updated: 3,
            enrollments_skipped: 0,
            records_recomputed: 1,
        }
    );

    let stored = gradebook.current_grade_scale().unwrap();
    assert_eq!(stored, GradeScale::new(five_point_scale()).unwrap());

    let record = RecordService::try_new(&conn)
        .unwrap()
        .get_record(&student)
        .unwrap();
    assert_eq!(record.total_points, 42);
    assert_eq!(record.gpa, Some(Gpa::from_hundredths(467)));

    let enrollment = EnrollmentService::try_new(&conn)
        .unwrap()
        .get(&student, &CourseRef::parse("TC1"))
        .unwrap()
        .unwrap();
    assert_eq!(enrollment.modified_by.as_deref(), Some("system:rebuild"));
}

#[test]
fn invalid_scale_is_rejected_before_any_write() {
    let (conn, _) = graded_fixture();
    let gradebook = GradebookService::try_new(&conn).unwrap();

    let mut bands = five_point_scale();
    bands[1] = GradeBand::new("B", 4, 55, 69);
    let err = gradebook
        .replace_grade_scale(bands, "registrar")
        .unwrap_err();
    assert!(matches!(
        err,
        GradebookError::GradeScale(GradeScaleError::Overlap { .. })
    ));

    assert_eq!(gradebook.current_grade_scale().unwrap(), GradeScale::default_scale());
}

#[test]
fn rebuild_is_idempotent_and_repairs_records() {
    let (conn, student) = graded_fixture();
    let records = RecordService::try_new(&conn).unwrap();
    let expected = records.get_record(&student).unwrap();

    conn.execute(
        "UPDATE academic_records SET total_points = 0, gpa_x100 = NULL, honours = NULL;",
        [],
    )
    .unwrap();

    let first = records.recompute_all().unwrap();
    assert_eq!(first.enrollments_checked, 3);
    assert_eq!(first.enrollments_updated, 0);
    assert_eq!(first.records_recomputed, 1);
    assert_eq!(records.get_record(&student).unwrap(), expected);

    let second = records.recompute_all().unwrap();
    assert_eq!(second, first);
    assert_eq!(records.get_record(&student).unwrap(), expected);
}

#[test]
fn rebuild_repairs_drifted_scored_point() {
    let (conn, student) = graded_fixture();
    conn.execute(
        "UPDATE enrollments SET scored_point = 3
         WHERE course_id = (SELECT id FROM courses WHERE code = 'TC1');",
        [],
    )
    .unwrap();

    let enrollments = EnrollmentService::try_new(&conn).unwrap();
    let err = enrollments
        .get(&student, &CourseRef::parse("TC1"))
        .unwrap_err();
    assert!(matches!(err, GradebookError::Repo(_)));

    let records = RecordService::try_new(&conn).unwrap();
    let summary = records.recompute_all().unwrap();
    assert_eq!(summary.enrollments_checked, 3);
    assert_eq!(summary.enrollments_updated, 1);
    assert_eq!(summary.enrollments_skipped, 0);

    let repaired = enrollments
        .get(&student, &CourseRef::parse("TC1"))
        .unwrap()
        .unwrap();
    assert_eq!(repaired.scored_point, 8);
    assert_eq!(repaired.modified_by.as_deref(), Some("system:rebuild"));

    let record = records.get_record(&student).unwrap();
    assert_eq!(record.total_points, 33);
    assert_eq!(record.gpa, Some(Gpa::from_hundredths(367)));
}

#[test]
fn rebuild_skips_enrollments_the_scale_cannot_resolve() {
    let (conn, student) = graded_fixture();
    EnrollmentService::try_new(&conn)
        .unwrap()
        .set_score(&student, &CourseRef::parse("TC2"), 20, "teacher")
        .unwrap();
    conn.execute("DELETE FROM grade_bands WHERE letter = 'F';", [])
        .unwrap();

    let summary = RecordService::try_new(&conn)
        .unwrap()
        .recompute_all()
        .unwrap();
    assert_eq!(summary.enrollments_checked, 3);
    assert_eq!(summary.enrollments_skipped, 1);
    assert_eq!(summary.records_recomputed, 1);

    let enrollment = EnrollmentService::try_new(&conn)
        .unwrap()
        .get(&student, &CourseRef::parse("TC2"))
        .unwrap()
        .unwrap();
    assert_eq!(enrollment.letter_grade.as_deref(), Some("F"));
    assert_eq!(enrollment.scored_point, 0);
}

#[test]
fn scoring_against_a_holed_scale_fails_without_writing() {
    let (conn, student) = graded_fixture();
    conn.execute("DELETE FROM grade_bands WHERE letter = 'F';", [])
        .unwrap();

    let err = GradebookService::try_new(&conn)
        .unwrap()
        .grade_courses(&student, &[(CourseRef::parse("TC1"), 10)], "teacher")
        .unwrap_err();
    assert!(matches!(
        err,
        GradebookError::GradeScale(GradeScaleError::NoMatchingBand(10))
    ));

    let enrollment = EnrollmentService::try_new(&conn)
        .unwrap()
        .get(&student, &CourseRef::parse("TC1"))
        .unwrap()
        .unwrap();
    assert_eq!(enrollment.score, 80);
}
