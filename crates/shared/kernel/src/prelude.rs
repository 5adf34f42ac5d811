//! Common imports for slice crates.

pub use crate::now_millis;
pub use crate::security::policy;
pub use crate::security::resource::ResourceGuard;
pub use crate::security::{Actor, SessionTokens};
pub use crate::server::{
    ApiError, ApiJson, ApiPath, ApiQuery, ApiState, AuthUser, ErrorBody, ErrorCode,
};
pub use rollcall_domain::roles::{Role, RoleSet};
