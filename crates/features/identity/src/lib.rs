//! # Identity
//!
//! Accounts, profiles, roles and bearer sessions.
//!
//! Sign-up creates the account, its profile and its first role in one transaction. Passwords are
//! stored as Argon2id PHC strings. Sessions are HS256 tokens carrying a snapshot of the user's
//! roles; role changes apply at the next sign-in.

mod error;
mod handlers;
mod model;
mod password;
mod repository;
mod service;

pub use crate::error::{IdentityError, IdentityErrorExt};
pub use crate::model::{
    MeResponse, Profile, SessionResponse, SignInRequest, SignUpRequest, UpdateProfileRequest,
    UserRolesResponse,
};
pub use crate::service::IdentityService;

use rollcall_database::{Database, Migration};
use rollcall_domain::config::ApiConfig;
use rollcall_kernel::server::ApiState;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

const SLICE: &str = "identity";

/// Identity feature state
#[rollcall_derive::rollcall_slice]
pub struct Identity {
    pub service: IdentityService,
}

/// Schema owned by this slice.
#[must_use]
pub fn migrations() -> Vec<Migration> {
    vec![Migration::new(SLICE, "0001", include_str!("../migrations/0001_identity.surql"))]
}

/// Initialize the identity feature.
///
/// # Errors
/// Returns [`IdentityError::Session`] if the JWT settings are unusable.
pub fn init(config: &ApiConfig, db: &Database) -> Result<Identity, IdentityError> {
    let service = IdentityService::new(db.clone(), &config.security.jwt)?;
    tracing::info!("Identity slice initialized");
    Ok(Identity::new(IdentityInner { service }))
}

pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::sign_up))
        .routes(routes!(handlers::sign_in))
        .routes(routes!(handlers::me, handlers::update_me))
        .routes(routes!(handlers::get_profile))
        .routes(routes!(handlers::user_roles))
        .routes(routes!(handlers::grant_role, handlers::revoke_role))
}
