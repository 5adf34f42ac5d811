use crate::error::AnalyticsError;
use crate::mailer::{ReportDispatch, ReportMailer, ReportMessage};
use crate::report::CourseReport;
use rollcall_attendance::Attendance;
use rollcall_courses::Courses;
use rollcall_derive::api_model;
use rollcall_kernel::now_millis;
use rollcall_kernel::security::Actor;
use std::sync::Arc;
use tracing::{info, instrument};

#[api_model]
pub struct SendReportRequest {
    pub recipient: String,
}

/// Course reports over attendance records.
#[derive(Debug, Clone)]
pub struct AnalyticsService {
    courses: Courses,
    attendance: Attendance,
    mailer: Arc<dyn ReportMailer>,
    sender: String,
}

impl AnalyticsService {
    pub fn new(
        courses: Courses,
        attendance: Attendance,
        mailer: Arc<dyn ReportMailer>,
        sender: impl Into<String>,
    ) -> Self {
        Self { courses, attendance, mailer, sender: sender.into() }
    }

    /// Owner professor or admin.
    pub async fn course_report(
        &self,
        actor: &Actor,
        course_id: &str,
    ) -> Result<CourseReport, AnalyticsError> {
        let course = self.courses.service.managed_course(actor, course_id).await?;
        let records = self.attendance.service.course_records(actor, &course.course_id, None).await?;
        Ok(CourseReport::build(&course, &records, now_millis()))
    }

    /// Builds the report and hands its text rendering to the mailer.
    #[instrument(skip(self, actor, request), fields(user = %actor.user_id))]
    pub async fn send_report(
        &self,
        actor: &Actor,
        course_id: &str,
        request: SendReportRequest,
    ) -> Result<ReportDispatch, AnalyticsError> {
        let recipient = normalize_recipient(&request.recipient)?;
        let report = self.course_report(actor, course_id).await?;

        let message = ReportMessage {
            from: self.sender.clone(),
            to: recipient,
            subject: format!("Attendance report: {} {}", report.course_code, report.course_name),
            body: report.render_text(),
        };
        let dispatch = self.mailer.deliver(&message)?;
        info!(dispatch_id = %dispatch.dispatch_id, transport = %dispatch.transport, "Report dispatched");
        Ok(dispatch)
    }
}

fn normalize_recipient(raw: &str) -> Result<String, AnalyticsError> {
    let address = raw.trim();
    let valid = address.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    }) && !address.contains(char::is_whitespace)
        && address.matches('@').count() == 1;

    if valid {
        Ok(address.to_owned())
    } else {
        Err(AnalyticsError::Validation {
            message: format!("'{address}' is not an e-mail address").into(),
            context: None,
        })
    }
}
