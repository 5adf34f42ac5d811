use crate::Courses;
use crate::model::{Course, CourseQrResponse, CreateCourseRequest, UpdateCourseRequest};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use rollcall_derive::api_handler;
use rollcall_domain::constants::COURSES_TAG;
use rollcall_kernel::server::{ApiError, ApiJson, ApiPath, ApiState, AuthUser, ErrorBody};

#[api_handler(
    get,
    path = "/courses",
    responses((status = OK, body = Vec<Course>), (status = UNAUTHORIZED, body = ErrorBody)),
    security(("bearer_auth" = [])),
    tag = COURSES_TAG,
)]
pub(crate) async fn list_courses(
    State(state): State<ApiState>,
    AuthUser(actor): AuthUser,
) -> Result<Json<Vec<Course>>, ApiError> {
    let courses = state.try_get_slice::<Courses>()?;
    Ok(Json(courses.service.list_courses(&actor).await?))
}

#[api_handler(
    post,
    path = "/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = CREATED, body = Course),
        (status = BAD_REQUEST, body = ErrorBody),
        (status = FORBIDDEN, description = "Caller is not a professor", body = ErrorBody),
        (status = CONFLICT, description = "Code already used by this professor", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = COURSES_TAG,
)]
pub(crate) async fn create_course(
    State(state): State<ApiState>,
    AuthUser(actor): AuthUser,
    ApiJson(request): ApiJson<CreateCourseRequest>,
) -> Result<(StatusCode, Json<Course>), ApiError> {
    let courses = state.try_get_slice::<Courses>()?;
    let course = courses.service.create_course(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

#[api_handler(
    get,
    path = "/courses/{id}",
    params(("id" = String, Path, description = "Course id")),
    responses((status = OK, body = Course), (status = NOT_FOUND, body = ErrorBody)),
    security(("bearer_auth" = [])),
    tag = COURSES_TAG,
)]
pub(crate) async fn get_course(
    State(state): State<ApiState>,
    AuthUser(actor): AuthUser,
    ApiPath(course_id): ApiPath<String>,
) -> Result<Json<Course>, ApiError> {
    let courses = state.try_get_slice::<Courses>()?;
    Ok(Json(courses.service.get_course(&actor, &course_id).await?))
}

#[api_handler(
    patch,
    path = "/courses/{id}",
    params(("id" = String, Path, description = "Course id")),
    request_body = UpdateCourseRequest,
    responses(
        (status = OK, body = Course),
        (status = BAD_REQUEST, body = ErrorBody),
        (status = FORBIDDEN, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
        (status = CONFLICT, body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = COURSES_TAG,
)]
pub(crate) async fn update_course(
    State(state): State<ApiState>,
    AuthUser(actor): AuthUser,
    ApiPath(course_id): ApiPath<String>,
    ApiJson(patch): ApiJson<UpdateCourseRequest>,
) -> Result<Json<Course>, ApiError> {
    let courses = state.try_get_slice::<Courses>()?;
    Ok(Json(courses.service.update_course(&actor, &course_id, patch).await?))
}

#[api_handler(
    delete,
    path = "/courses/{id}",
    params(("id" = String, Path, description = "Course id")),
    responses(
        (status = NO_CONTENT, description = "Course and its attendance deleted"),
        (status = FORBIDDEN, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = COURSES_TAG,
)]
pub(crate) async fn delete_course(
    State(state): State<ApiState>,
    AuthUser(actor): AuthUser,
    ApiPath(course_id): ApiPath<String>,
) -> Result<StatusCode, ApiError> {
    let courses = state.try_get_slice::<Courses>()?;
    courses.service.delete_course(&actor, &course_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[api_handler(
    post,
    path = "/courses/{id}/qr",
    params(("id" = String, Path, description = "Course id")),
    responses(
        (status = OK, body = CourseQrResponse),
        (status = FORBIDDEN, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = COURSES_TAG,
)]
pub(crate) async fn issue_qr(
    State(state): State<ApiState>,
    AuthUser(actor): AuthUser,
    ApiPath(course_id): ApiPath<String>,
) -> Result<Json<CourseQrResponse>, ApiError> {
    let courses = state.try_get_slice::<Courses>()?;
    Ok(Json(courses.service.issue_qr(&actor, &course_id).await?))
}
