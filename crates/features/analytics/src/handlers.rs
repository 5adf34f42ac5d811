use crate::Analytics;
use crate::mailer::ReportDispatch;
use crate::report::CourseReport;
use crate::service::SendReportRequest;
use axum::Json;
use axum::extract::State;
use rollcall_derive::api_handler;
use rollcall_domain::constants::ANALYTICS_TAG;
use rollcall_kernel::server::{ApiError, ApiJson, ApiPath, ApiState, AuthUser, ErrorBody};

#[api_handler(
    get,
    path = "/courses/{id}/analytics",
    params(("id" = String, Path, description = "Course id")),
    responses(
        (status = OK, body = CourseReport),
        (status = FORBIDDEN, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = ANALYTICS_TAG,
)]
pub(crate) async fn course_report(
    State(state): State<ApiState>,
    AuthUser(actor): AuthUser,
    ApiPath(course_id): ApiPath<String>,
) -> Result<Json<CourseReport>, ApiError> {
    let analytics = state.try_get_slice::<Analytics>()?;
    Ok(Json(analytics.service.course_report(&actor, &course_id).await?))
}

#[api_handler(
    post,
    path = "/courses/{id}/analytics/report",
    params(("id" = String, Path, description = "Course id")),
    request_body = SendReportRequest,
    responses(
        (status = OK, description = "Dispatch receipt", body = ReportDispatch),
        (status = BAD_REQUEST, body = ErrorBody),
        (status = FORBIDDEN, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
        (status = SERVICE_UNAVAILABLE, description = "Transport refused the report", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = ANALYTICS_TAG,
)]
pub(crate) async fn send_report(
    State(state): State<ApiState>,
    AuthUser(actor): AuthUser,
    ApiPath(course_id): ApiPath<String>,
    ApiJson(request): ApiJson<SendReportRequest>,
) -> Result<Json<ReportDispatch>, ApiError> {
    let analytics = state.try_get_slice::<Analytics>()?;
    Ok(Json(analytics.service.send_report(&actor, &course_id, request).await?))
}
