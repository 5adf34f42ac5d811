//! # Attendance
//!
//! The QR check-in flow and the records it produces.
//!
//! A check-in verifies the signed course code, checks the location against the course geofence,
//! derives the session date in the configured local time and stores one record per student,
//! course and date. Stored check-ins are published on the event bus as [`CheckInRecorded`],
//! which feeds the professor's live view.

mod clock;
mod error;
pub mod geo;
mod handlers;
mod model;
mod repository;
mod service;

pub use crate::clock::SessionClock;
pub use crate::error::{AttendanceError, AttendanceErrorExt};
pub use crate::geo::GeoPoint;
pub use crate::model::{AttendanceRecord, CheckInRecorded, CheckInRequest, RecordsQuery};
pub use crate::service::AttendanceService;

use rollcall_courses::Courses;
use rollcall_database::{Database, Migration};
use rollcall_domain::config::ApiConfig;
use rollcall_events::EventBus;
use rollcall_kernel::server::ApiState;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

const SLICE: &str = "attendance";

/// Attendance feature state
#[rollcall_derive::rollcall_slice]
pub struct Attendance {
    pub service: AttendanceService,
}

#[must_use]
pub fn migrations() -> Vec<Migration> {
    vec![Migration::new(SLICE, "0001", include_str!("../migrations/0001_attendance.surql"))]
}

/// Initialize the attendance feature on top of the courses slice.
///
/// # Errors
/// Returns [`AttendanceError::Validation`] if the `attendance` section is unusable.
pub fn init(
    config: &ApiConfig,
    db: &Database,
    events: &EventBus,
    courses: Courses,
) -> Result<Attendance, AttendanceError> {
    let service = AttendanceService::new(db.clone(), courses, events.clone(), &config.attendance)?;
    tracing::info!(
        utc_offset_minutes = config.attendance.utc_offset_minutes,
        require_location = config.attendance.require_location,
        "Attendance slice initialized"
    );
    Ok(Attendance::new(AttendanceInner { service }))
}

pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::check_in))
        .routes(routes!(handlers::my_records))
        .routes(routes!(handlers::course_records))
        .routes(routes!(handlers::delete_record))
        .routes(routes!(handlers::live_feed))
}
