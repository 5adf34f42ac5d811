//! # Courses
//!
//! Course management for professors and the signed QR codes students scan to check in.
//! See [`qr`] for the payload format.

mod error;
mod handlers;
mod model;
pub mod qr;
mod repository;
mod service;

pub use crate::error::{CourseError, CourseErrorExt};
pub use crate::model::{
    Course, CourseQrResponse, CreateCourseRequest, Geofence, UpdateCourseRequest,
};
pub use crate::qr::{CheckInToken, QrSigner, SignedCheckInToken};
pub use crate::service::CourseService;

use rollcall_database::{Database, Migration};
use rollcall_domain::config::ApiConfig;
use rollcall_kernel::server::ApiState;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

const SLICE: &str = "courses";

/// Courses feature state
#[rollcall_derive::rollcall_slice]
pub struct Courses {
    pub service: CourseService,
}

#[must_use]
pub fn migrations() -> Vec<Migration> {
    vec![Migration::new(SLICE, "0001", include_str!("../migrations/0001_courses.surql"))]
}

/// Initialize the courses feature.
///
/// # Errors
/// Returns [`CourseError::Validation`] if `security.qr` is unusable.
pub fn init(config: &ApiConfig, db: &Database) -> Result<Courses, CourseError> {
    let service = CourseService::new(db.clone(), &config.security.qr)?;
    tracing::info!("Courses slice initialized");
    Ok(Courses::new(CoursesInner { service }))
}

pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::list_courses, handlers::create_course))
        .routes(routes!(handlers::get_course, handlers::update_course, handlers::delete_course))
        .routes(routes!(handlers::issue_qr))
}
