//! Facade crate for Roll Call features and shared modules.
//! Re-exports domain/kernel primitives and aggregates feature initialization.
//! Keep this crate thin: it should compose other crates, not implement business logic.
//!
//! ## Usage
//! - [`migrations`] lists every slice schema in dependency order; hand it to the database builder.
//! - [`init`] builds the slices (courses before attendance before analytics) and seeds the
//!   bootstrap administrator.
//! - [`router`] merges the slice routers with the system routes.

use rollcall_database::{Database, Migration};
pub use rollcall_domain as domain;
use rollcall_domain::config::ApiConfig;
use rollcall_domain::registry::InitializedSlice;
use rollcall_events::EventBus;
pub use rollcall_kernel as kernel;
use rollcall_kernel::server::ApiState;
use std::borrow::Cow;
use utoipa_axum::router::OpenApiRouter;

/// Feature registry for runtime introspection.
pub mod features {
    pub use rollcall_analytics as analytics;
    pub use rollcall_attendance as attendance;
    pub use rollcall_courses as courses;
    pub use rollcall_identity as identity;

    /// Slices assembled by [`crate::init`], in initialization order.
    pub const ENABLED: &[&str] = &["identity", "courses", "attendance", "analytics"];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

#[rollcall_derive::rollcall_error]
pub enum InitError {
    #[error("Identity initialization failed{}: {source}", format_context(.context))]
    Identity { source: features::identity::IdentityError, context: Option<Cow<'static, str>> },

    #[error("Courses initialization failed{}: {source}", format_context(.context))]
    Courses { source: features::courses::CourseError, context: Option<Cow<'static, str>> },

    #[error("Attendance initialization failed{}: {source}", format_context(.context))]
    Attendance {
        source: features::attendance::AttendanceError,
        context: Option<Cow<'static, str>>,
    },
}

/// Schema of every slice, in dependency order.
#[must_use]
pub fn migrations() -> Vec<Migration> {
    let mut all = features::identity::migrations();
    all.extend(features::courses::migrations());
    all.extend(features::attendance::migrations());
    all
}

/// Initialize all features for server mode.
///
/// When `security.bootstrap_admin` is configured, its account is created unless the email is
/// already registered.
///
/// # Errors
/// Returns an error if any feature initialization or the admin bootstrap fails.
pub async fn init(
    config: &ApiConfig,
    database: &Database,
    events: &EventBus,
) -> Result<Vec<InitializedSlice>, InitError> {
    let identity = features::identity::init(config, database)?;
    if let Some(admin) = &config.security.bootstrap_admin
        && identity.service.bootstrap_admin(admin).await.context("security.bootstrap_admin")?
    {
        tracing::info!(email = %admin.email, "Bootstrap administrator created");
    }

    let courses = features::courses::init(config, database)?;
    let attendance = features::attendance::init(config, database, events, courses.clone())?;
    let analytics = features::analytics::init(config, courses.clone(), attendance.clone());

    Ok(vec![
        InitializedSlice::new(identity),
        InitializedSlice::new(courses),
        InitializedSlice::new(attendance),
        InitializedSlice::new(analytics),
    ])
}

/// System routes plus every slice's routes.
pub fn router() -> OpenApiRouter<ApiState> {
    kernel::server::router::system_router()
        .merge(features::identity::router())
        .merge(features::courses::router())
        .merge(features::attendance::router())
        .merge(features::analytics::router())
}
