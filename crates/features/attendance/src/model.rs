use crate::geo::GeoPoint;
use rollcall_derive::api_model;
use surrealdb::types::SurrealValue;
use utoipa::IntoParams;

/// A scanned QR payload plus the location captured at scan time.
#[api_model]
pub struct CheckInRequest {
    pub payload: String,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

#[api_model]
#[derive(Clone, PartialEq, SurrealValue)]
pub struct AttendanceRecord {
    pub record_id: String,
    pub course_id: String,
    pub student_id: String,
    /// `YYYY-MM-DD` in the configured local time
    pub session_date: String,
    /// Unix milliseconds
    pub checked_in_at: i64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy_m: Option<f64>,
    /// Distance from the course geofence centre, when the course has one
    pub distance_m: Option<f64>,
}

#[api_model]
#[derive(Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecordsQuery {
    /// Only records of this session date (`YYYY-MM-DD`)
    #[serde(default)]
    pub date: Option<String>,
}

/// Published on the event bus after a check-in is stored.
#[derive(Debug, Clone)]
pub struct CheckInRecorded {
    pub record: AttendanceRecord,
}
