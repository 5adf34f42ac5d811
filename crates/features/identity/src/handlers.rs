use crate::Identity;
use crate::model::{
    MeResponse, Profile, SessionResponse, SignInRequest, SignUpRequest, UpdateProfileRequest,
    UserRolesResponse,
};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use rollcall_derive::api_handler;
use rollcall_domain::constants::IDENTITY_TAG;
use rollcall_domain::roles::Role;
use rollcall_kernel::server::{ApiError, ApiJson, ApiPath, ApiState, AuthUser, ErrorBody};

#[api_handler(
    post,
    path = "/auth/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = CREATED, description = "Account created and signed in", body = SessionResponse),
        (status = BAD_REQUEST, body = ErrorBody),
        (status = FORBIDDEN, description = "Role cannot be self-assigned", body = ErrorBody),
        (status = CONFLICT, description = "Email already registered", body = ErrorBody),
    ),
    tag = IDENTITY_TAG,
)]
pub(crate) async fn sign_up(
    State(state): State<ApiState>,
    ApiJson(request): ApiJson<SignUpRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let identity = state.try_get_slice::<Identity>()?;
    let session = identity.service.sign_up(request).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[api_handler(
    post,
    path = "/auth/sign-in",
    request_body = SignInRequest,
    responses(
        (status = OK, body = SessionResponse),
        (status = UNAUTHORIZED, description = "Unknown email or wrong password", body = ErrorBody),
    ),
    tag = IDENTITY_TAG,
)]
pub(crate) async fn sign_in(
    State(state): State<ApiState>,
    ApiJson(request): ApiJson<SignInRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let identity = state.try_get_slice::<Identity>()?;
    Ok(Json(identity.service.sign_in(request).await?))
}

#[api_handler(
    get,
    path = "/me",
    responses((status = OK, body = MeResponse), (status = UNAUTHORIZED, body = ErrorBody)),
    security(("bearer_auth" = [])),
    tag = IDENTITY_TAG,
)]
pub(crate) async fn me(
    State(state): State<ApiState>,
    AuthUser(actor): AuthUser,
) -> Result<Json<MeResponse>, ApiError> {
    let identity = state.try_get_slice::<Identity>()?;
    Ok(Json(identity.service.me(&actor).await?))
}

#[api_handler(
    patch,
    path = "/me",
    request_body = UpdateProfileRequest,
    responses((status = OK, body = Profile), (status = BAD_REQUEST, body = ErrorBody)),
    security(("bearer_auth" = [])),
    tag = IDENTITY_TAG,
)]
pub(crate) async fn update_me(
    State(state): State<ApiState>,
    AuthUser(actor): AuthUser,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    let identity = state.try_get_slice::<Identity>()?;
    Ok(Json(identity.service.update_profile(&actor, request).await?))
}

#[api_handler(
    get,
    path = "/profiles/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = OK, body = Profile),
        (status = FORBIDDEN, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = IDENTITY_TAG,
)]
pub(crate) async fn get_profile(
    State(state): State<ApiState>,
    AuthUser(actor): AuthUser,
    ApiPath(user_id): ApiPath<String>,
) -> Result<Json<Profile>, ApiError> {
    let identity = state.try_get_slice::<Identity>()?;
    Ok(Json(identity.service.get_profile(&actor, &user_id).await?))
}

#[api_handler(
    get,
    path = "/users/{id}/roles",
    params(("id" = String, Path, description = "User id")),
    responses((status = OK, body = UserRolesResponse), (status = FORBIDDEN, body = ErrorBody)),
    security(("bearer_auth" = [])),
    tag = IDENTITY_TAG,
)]
pub(crate) async fn user_roles(
    State(state): State<ApiState>,
    AuthUser(actor): AuthUser,
    ApiPath(user_id): ApiPath<String>,
) -> Result<Json<UserRolesResponse>, ApiError> {
    let identity = state.try_get_slice::<Identity>()?;
    Ok(Json(identity.service.roles_of(&actor, &user_id).await?))
}

#[api_handler(
    put,
    path = "/admin/users/{id}/roles/{role}",
    params(
        ("id" = String, Path, description = "User id"),
        ("role" = String, Path, description = "student, professor or admin"),
    ),
    responses(
        (status = OK, body = UserRolesResponse),
        (status = FORBIDDEN, description = "Caller is not an admin", body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = IDENTITY_TAG,
)]
pub(crate) async fn grant_role(
    State(state): State<ApiState>,
    AuthUser(actor): AuthUser,
    ApiPath((user_id, role)): ApiPath<(String, Role)>,
) -> Result<Json<UserRolesResponse>, ApiError> {
    let identity = state.try_get_slice::<Identity>()?;
    Ok(Json(identity.service.grant_role(&actor, &user_id, role).await?))
}

#[api_handler(
    delete,
    path = "/admin/users/{id}/roles/{role}",
    params(
        ("id" = String, Path, description = "User id"),
        ("role" = String, Path, description = "student, professor or admin"),
    ),
    responses(
        (status = OK, body = UserRolesResponse),
        (status = BAD_REQUEST, description = "Last role of the user", body = ErrorBody),
        (status = FORBIDDEN, description = "Caller is not an admin", body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = IDENTITY_TAG,
)]
pub(crate) async fn revoke_role(
    State(state): State<ApiState>,
    AuthUser(actor): AuthUser,
    ApiPath((user_id, role)): ApiPath<(String, Role)>,
) -> Result<Json<UserRolesResponse>, ApiError> {
    let identity = state.try_get_slice::<Identity>()?;
    Ok(Json(identity.service.revoke_role(&actor, &user_id, role).await?))
}
