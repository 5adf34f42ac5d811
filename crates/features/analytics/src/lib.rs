//! # Analytics
//!
//! Attendance reports per course: turnout by session, attendance rate by student.
//! Reports can be dispatched through a [`ReportMailer`]; the bundled [`LogMailer`] only records
//! them in the log.

mod error;
mod handlers;
mod mailer;
mod report;
mod service;

pub use crate::error::{AnalyticsError, AnalyticsErrorExt};
pub use crate::mailer::{LogMailer, ReportDispatch, ReportMailer, ReportMessage};
pub use crate::report::{CourseReport, SessionSummary, StudentSummary};
pub use crate::service::{AnalyticsService, SendReportRequest};

use rollcall_attendance::Attendance;
use rollcall_courses::Courses;
use rollcall_domain::config::ApiConfig;
use rollcall_kernel::server::ApiState;
use std::sync::Arc;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Analytics feature state
#[rollcall_derive::rollcall_slice]
pub struct Analytics {
    pub service: AnalyticsService,
}

/// Initialize the analytics feature with the log-only mailer.
pub fn init(config: &ApiConfig, courses: Courses, attendance: Attendance) -> Analytics {
    init_with_mailer(config, courses, attendance, Arc::new(LogMailer))
}

pub fn init_with_mailer(
    config: &ApiConfig,
    courses: Courses,
    attendance: Attendance,
    mailer: Arc<dyn ReportMailer>,
) -> Analytics {
    let service = AnalyticsService::new(courses, attendance, mailer, &config.analytics.sender);
    tracing::info!(sender = %config.analytics.sender, "Analytics slice initialized");
    Analytics::new(AnalyticsInner { service })
}

pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::course_report))
        .routes(routes!(handlers::send_report))
}
