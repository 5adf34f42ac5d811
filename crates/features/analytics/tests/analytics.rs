use rollcall_analytics::{
    AnalyticsError, LogMailer, ReportDispatch, ReportMailer, ReportMessage, SendReportRequest,
};
use rollcall_attendance::CheckInRequest;
use rollcall_courses::CreateCourseRequest;
use rollcall_database::Database;
use rollcall_domain::config::ApiConfig;
use rollcall_domain::roles::RoleSet;
use rollcall_events::EventBus;
use rollcall_kernel::security::Actor;
use rollcall_kernel::server::{ApiError, ErrorCode};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Outbox {
    sent: Mutex<Vec<ReportMessage>>,
    refuse: bool,
}

impl ReportMailer for Outbox {
    fn deliver(&self, message: &ReportMessage) -> Result<ReportDispatch, AnalyticsError> {
        if self.refuse {
            return Err(AnalyticsError::Delivery { message: "relay down".into(), context: None });
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(ReportDispatch {
            dispatch_id: "d1".into(),
            recipient: message.to.clone(),
            subject: message.subject.clone(),
            sent_at: 0,
            delivered: true,
            transport: "memory".into(),
        })
    }
}

fn professor() -> Actor {
    Actor::new("prof", "prof@uni.edu", RoleSet::PROFESSOR)
}

fn student(id: &str) -> Actor {
    Actor::new(id, format!("{id}@uni.edu"), RoleSet::STUDENT)
}

/// Course with two students checked in today; returns the analytics slice and the course id.
async fn setup(mailer: Arc<dyn ReportMailer>) -> (rollcall_analytics::Analytics, String) {
    let config = ApiConfig::default();
    let db = Database::builder()
        .url("mem://")
        .session("analytics", "test")
        .migrations(rollcall_courses::migrations())
        .migrations(rollcall_attendance::migrations())
        .init()
        .await
        .expect("in-memory database");
    let courses = rollcall_courses::init(&config, &db).unwrap();
    let attendance =
        rollcall_attendance::init(&config, &db, &EventBus::new(), courses.clone()).unwrap();

    let course = courses
        .service
        .create_course(&professor(), CreateCourseRequest {
            name: "Operating Systems".into(),
            code: "OS1".into(),
            description: None,
            geofence: None,
        })
        .await
        .unwrap();
    let payload = courses.service.issue_qr(&professor(), &course.course_id).await.unwrap().payload;
    for id in ["s1", "s2"] {
        let scan = CheckInRequest { payload: payload.clone(), location: None };
        attendance.service.check_in(&student(id), scan).await.unwrap();
    }

    let analytics =
        rollcall_analytics::init_with_mailer(&config, courses, attendance, mailer);
    (analytics, course.course_id)
}

#[tokio::test]
async fn report_aggregates_stored_check_ins() {
    let (analytics, course_id) = setup(Arc::new(LogMailer)).await;

    let report = analytics.service.course_report(&professor(), &course_id).await.unwrap();
    assert_eq!(report.course_code, "OS1");
    assert_eq!(report.total_check_ins, 2);
    assert_eq!(report.distinct_students, 2);
    assert_eq!(report.sessions.len(), 1);
    assert_eq!(report.peak_session.as_ref().map(|s| s.check_ins), Some(2));

    let denied = analytics.service.course_report(&student("s1"), &course_id).await.unwrap_err();
    assert_eq!(ApiError::from(denied).code(), ErrorCode::Forbidden);

    let missing = analytics.service.course_report(&professor(), "no-such-course").await.unwrap_err();
    assert_eq!(ApiError::from(missing).code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn log_mailer_returns_an_undelivered_receipt() {
    let (analytics, course_id) = setup(Arc::new(LogMailer)).await;

    let receipt = analytics
        .service
        .send_report(&professor(), &course_id, SendReportRequest { recipient: " dean@uni.edu ".into() })
        .await
        .unwrap();
    assert_eq!(receipt.recipient, "dean@uni.edu");
    assert_eq!(receipt.transport, "log");
    assert!(!receipt.delivered);
    assert_eq!(receipt.dispatch_id.len(), 16);
    assert!(receipt.sent_at > 0);

    let bad = analytics
        .service
        .send_report(&professor(), &course_id, SendReportRequest { recipient: "dean".into() })
        .await
        .unwrap_err();
    assert!(matches!(bad, AnalyticsError::Validation { .. }));
}

#[tokio::test]
async fn custom_mailers_receive_the_rendered_report() {
    let outbox = Arc::new(Outbox::default());
    let (analytics, course_id) = setup(outbox.clone()).await;

    analytics
        .service
        .send_report(&professor(), &course_id, SendReportRequest { recipient: "dean@uni.edu".into() })
        .await
        .unwrap();

    let sent = outbox.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].from, "reports@rollcall.local");
    assert_eq!(sent[0].subject, "Attendance report: OS1 Operating Systems");
    assert!(sent[0].body.contains("Check-ins:         2"));
}

#[tokio::test]
async fn refused_delivery_is_unavailable() {
    let outbox = Arc::new(Outbox { refuse: true, ..Outbox::default() });
    let (analytics, course_id) = setup(outbox).await;

    let err = analytics
        .service
        .send_report(&professor(), &course_id, SendReportRequest { recipient: "dean@uni.edu".into() })
        .await
        .unwrap_err();
    assert_eq!(ApiError::from(err).code(), ErrorCode::Unavailable);
}
