use crate::Attendance;
use crate::model::{AttendanceRecord, CheckInRequest, RecordsQuery};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use rollcall_derive::api_handler;
use rollcall_domain::constants::ATTENDANCE_TAG;
use rollcall_kernel::server::{ApiError, ApiJson, ApiPath, ApiQuery, ApiState, AuthUser, ErrorBody};
use tokio_stream::{Stream, StreamExt};

const CHECK_IN_EVENT: &str = "check-in";

#[api_handler(
    post,
    path = "/attendance/check-in",
    request_body = CheckInRequest,
    responses(
        (status = CREATED, body = AttendanceRecord),
        (status = BAD_REQUEST, description = "Invalid, expired or foreign QR code; bad location", body = ErrorBody),
        (status = FORBIDDEN, description = "Not a student, or outside the geofence", body = ErrorBody),
        (status = NOT_FOUND, description = "Course no longer exists", body = ErrorBody),
        (status = CONFLICT, description = "Already checked in for this session", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = ATTENDANCE_TAG,
)]
pub(crate) async fn check_in(
    State(state): State<ApiState>,
    AuthUser(actor): AuthUser,
    ApiJson(request): ApiJson<CheckInRequest>,
) -> Result<(StatusCode, Json<AttendanceRecord>), ApiError> {
    let attendance = state.try_get_slice::<Attendance>()?;
    let record = attendance.service.check_in(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[api_handler(
    get,
    path = "/attendance/me",
    responses((status = OK, body = Vec<AttendanceRecord>), (status = UNAUTHORIZED, body = ErrorBody)),
    security(("bearer_auth" = [])),
    tag = ATTENDANCE_TAG,
)]
pub(crate) async fn my_records(
    State(state): State<ApiState>,
    AuthUser(actor): AuthUser,
) -> Result<Json<Vec<AttendanceRecord>>, ApiError> {
    let attendance = state.try_get_slice::<Attendance>()?;
    Ok(Json(attendance.service.my_records(&actor).await?))
}

#[api_handler(
    get,
    path = "/courses/{id}/attendance",
    params(("id" = String, Path, description = "Course id"), RecordsQuery),
    responses(
        (status = OK, body = Vec<AttendanceRecord>),
        (status = FORBIDDEN, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = ATTENDANCE_TAG,
)]
pub(crate) async fn course_records(
    State(state): State<ApiState>,
    AuthUser(actor): AuthUser,
    ApiPath(course_id): ApiPath<String>,
    ApiQuery(query): ApiQuery<RecordsQuery>,
) -> Result<Json<Vec<AttendanceRecord>>, ApiError> {
    let attendance = state.try_get_slice::<Attendance>()?;
    let records =
        attendance.service.course_records(&actor, &course_id, query.date.as_deref()).await?;
    Ok(Json(records))
}

#[api_handler(
    delete,
    path = "/attendance/{id}",
    params(("id" = String, Path, description = "Attendance record id")),
    responses(
        (status = NO_CONTENT, description = "Record deleted"),
        (status = FORBIDDEN, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = ATTENDANCE_TAG,
)]
pub(crate) async fn delete_record(
    State(state): State<ApiState>,
    AuthUser(actor): AuthUser,
    ApiPath(record_id): ApiPath<String>,
) -> Result<StatusCode, ApiError> {
    let attendance = state.try_get_slice::<Attendance>()?;
    attendance.service.delete_record(&actor, &record_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Server-sent events; each `check-in` event carries an [`AttendanceRecord`] as JSON.
#[api_handler(
    get,
    path = "/courses/{id}/attendance/live",
    params(("id" = String, Path, description = "Course id")),
    responses(
        (status = OK, description = "Stream of check-in events", content_type = "text/event-stream", body = AttendanceRecord),
        (status = FORBIDDEN, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = ATTENDANCE_TAG,
)]
pub(crate) async fn live_feed(
    State(state): State<ApiState>,
    AuthUser(actor): AuthUser,
    ApiPath(course_id): ApiPath<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let attendance = state.try_get_slice::<Attendance>()?;
    let feed = attendance.service.live_feed(&actor, &course_id).await?;

    let events = feed.map(|checked_in| {
        Event::default()
            .event(CHECK_IN_EVENT)
            .id(checked_in.record.record_id.clone())
            .json_data(&checked_in.record)
    });
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
