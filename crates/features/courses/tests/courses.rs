use rollcall_courses::{
    CourseError, CourseService, CreateCourseRequest, Geofence, UpdateCourseRequest,
};
use rollcall_database::Database;
use rollcall_domain::config::QrConfig;
use rollcall_domain::roles::RoleSet;
use rollcall_kernel::now_millis;
use rollcall_kernel::security::Actor;

async fn service() -> CourseService {
    let db = Database::builder()
        .url("mem://")
        .session("courses", "test")
        .migrations(rollcall_courses::migrations())
        .init()
        .await
        .expect("in-memory database");
    CourseService::new(db, &QrConfig::default()).unwrap()
}

fn professor(id: &str) -> Actor {
    Actor::new(id, format!("{id}@uni.edu"), RoleSet::PROFESSOR)
}

fn student(id: &str) -> Actor {
    Actor::new(id, format!("{id}@uni.edu"), RoleSet::STUDENT)
}

fn admin() -> Actor {
    Actor::new("admin", "admin@uni.edu", RoleSet::ADMIN)
}

fn create(code: &str) -> CreateCourseRequest {
    CreateCourseRequest {
        name: "Algorithms".into(),
        code: code.into(),
        description: Some("Sorting and searching".into()),
        geofence: Some(Geofence { latitude: 50.45, longitude: 30.52, radius_m: 120.0 }),
    }
}

#[tokio::test]
async fn professors_create_and_students_cannot() {
    let service = service().await;

    let course = service.create_course(&professor("p1"), create(" cs101 ")).await.unwrap();
    assert_eq!(course.code, "CS101");
    assert_eq!(course.professor_id, "p1");
    assert_eq!(course.course_id.len(), 16);

    let fetched = service.get_course(&student("s1"), &course.course_id).await.unwrap();
    assert_eq!(fetched, course);

    let denied = service.create_course(&student("s1"), create("CS102")).await.unwrap_err();
    assert!(matches!(denied, CourseError::Forbidden { .. }));
}

#[tokio::test]
async fn codes_are_unique_per_professor() {
    let service = service().await;
    service.create_course(&professor("p1"), create("CS101")).await.unwrap();

    let duplicate = service.create_course(&professor("p1"), create("cs101")).await.unwrap_err();
    assert!(matches!(duplicate, CourseError::Conflict { .. }), "{duplicate}");

    service.create_course(&professor("p2"), create("CS101")).await.unwrap();
}

#[tokio::test]
async fn listing_depends_on_role() {
    let service = service().await;
    service.create_course(&professor("p1"), create("A1")).await.unwrap();
    service.create_course(&professor("p1"), create("A2")).await.unwrap();
    service.create_course(&professor("p2"), create("B1")).await.unwrap();

    let own = service.list_courses(&professor("p1")).await.unwrap();
    assert_eq!(own.iter().map(|c| c.code.as_str()).collect::<Vec<_>>(), ["A1", "A2"]);

    assert_eq!(service.list_courses(&admin()).await.unwrap().len(), 3);
    assert_eq!(service.list_courses(&student("s1")).await.unwrap().len(), 3);
}

#[tokio::test]
async fn only_owner_or_admin_updates() {
    let service = service().await;
    let course = service.create_course(&professor("p1"), create("CS101")).await.unwrap();
    let id = &course.course_id;

    let stranger = service
        .update_course(&professor("p2"), id, UpdateCourseRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(stranger, CourseError::Forbidden { .. }));

    let patch = UpdateCourseRequest {
        name: Some("Advanced Algorithms".into()),
        description: Some("  ".into()),
        remove_geofence: true,
        ..UpdateCourseRequest::default()
    };
    let updated = service.update_course(&professor("p1"), id, patch).await.unwrap();
    assert_eq!(updated.name, "Advanced Algorithms");
    assert_eq!(updated.code, "CS101");
    assert!(updated.description.is_none());
    assert!(updated.geofence.is_none());
    assert_eq!(service.get_course(&admin(), id).await.unwrap(), updated);

    let fence = Geofence { latitude: 0.0, longitude: 0.0, radius_m: 50.0 };
    let patch = UpdateCourseRequest { geofence: Some(fence), ..UpdateCourseRequest::default() };
    let fenced = service.update_course(&admin(), id, patch).await.unwrap();
    assert_eq!(fenced.geofence, Some(fence));

    let bad = UpdateCourseRequest {
        geofence: Some(Geofence { radius_m: -1.0, ..fence }),
        ..UpdateCourseRequest::default()
    };
    assert!(matches!(
        service.update_course(&admin(), id, bad).await,
        Err(CourseError::Validation { .. })
    ));
}

#[tokio::test]
async fn delete_removes_the_course() {
    let service = service().await;
    let course = service.create_course(&professor("p1"), create("CS101")).await.unwrap();

    let denied = service.delete_course(&student("s1"), &course.course_id).await.unwrap_err();
    assert!(matches!(denied, CourseError::Forbidden { .. }));

    service.delete_course(&professor("p1"), &course.course_id).await.unwrap();
    let gone = service.get_course(&professor("p1"), &course.course_id).await.unwrap_err();
    assert!(matches!(gone, CourseError::NotFound { .. }));
}

#[tokio::test]
async fn issued_codes_verify_for_the_course() {
    let service = service().await;
    let course = service.create_course(&professor("p1"), create("CS101")).await.unwrap();

    let denied = service.issue_qr(&professor("p2"), &course.course_id).await.unwrap_err();
    assert!(matches!(denied, CourseError::Forbidden { .. }));

    let qr = service.issue_qr(&professor("p1"), &course.course_id).await.unwrap();
    assert!(qr.svg.contains("<svg"));
    assert_eq!(qr.expires_at - qr.issued_at, 900_000);

    let token = service.verify_qr(&qr.payload, now_millis()).unwrap();
    assert_eq!(token.course_id, course.course_id);
}

#[tokio::test]
async fn unknown_and_malformed_ids() {
    let service = service().await;
    let missing = service.get_course(&admin(), "nothing-here").await.unwrap_err();
    assert!(matches!(missing, CourseError::NotFound { .. }));

    let malformed = service.get_course(&admin(), "a b").await.unwrap_err();
    assert!(matches!(malformed, CourseError::Resource { .. }));
}
