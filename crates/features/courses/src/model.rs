use crate::error::CourseError;
use rollcall_derive::api_model;
use surrealdb::types::SurrealValue;

pub(crate) const MAX_NAME_LEN: usize = 120;
pub(crate) const MAX_CODE_LEN: usize = 32;
pub(crate) const MAX_DESCRIPTION_LEN: usize = 2000;
pub(crate) const MAX_RADIUS_M: f64 = 10_000.0;

/// Circle a check-in location must fall into.
#[api_model]
#[derive(Clone, Copy, PartialEq)]
pub struct Geofence {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f64,
}

impl Geofence {
    pub(crate) fn validate(self) -> Result<Self, CourseError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CourseError::validation("geofence latitude must be within [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CourseError::validation("geofence longitude must be within [-180, 180]"));
        }
        if !(self.radius_m > 0.0 && self.radius_m <= MAX_RADIUS_M) {
            return Err(CourseError::validation(format!(
                "geofence radius must be within (0, {MAX_RADIUS_M}] metres"
            )));
        }
        Ok(self)
    }
}

#[api_model]
#[derive(Clone, PartialEq)]
pub struct Course {
    pub course_id: String,
    pub professor_id: String,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub geofence: Option<Geofence>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[api_model]
pub struct CreateCourseRequest {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub geofence: Option<Geofence>,
}

/// Absent fields are left unchanged. An empty description clears it.
#[api_model]
#[derive(Default)]
pub struct UpdateCourseRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub geofence: Option<Geofence>,
    #[serde(default)]
    pub remove_geofence: bool,
}

/// A freshly minted check-in code.
#[api_model]
pub struct CourseQrResponse {
    pub course_id: String,
    /// Text encoded in the QR image; students submit it at check-in.
    pub payload: String,
    /// Standalone SVG document
    pub svg: String,
    /// Unix milliseconds
    pub issued_at: i64,
    /// Unix milliseconds
    pub expires_at: i64,
}

/// Flat storage shape of a course.
#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct CourseRow {
    pub course_id: String,
    pub professor_id: String,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub geofence_lat: Option<f64>,
    pub geofence_lon: Option<f64>,
    pub geofence_radius_m: Option<f64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Self {
        let geofence = match (row.geofence_lat, row.geofence_lon, row.geofence_radius_m) {
            (Some(latitude), Some(longitude), Some(radius_m)) => {
                Some(Geofence { latitude, longitude, radius_m })
            },
            _ => None,
        };
        Self {
            course_id: row.course_id,
            professor_id: row.professor_id,
            name: row.name,
            code: row.code,
            description: row.description,
            geofence,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<Course> for CourseRow {
    fn from(course: Course) -> Self {
        Self {
            course_id: course.course_id,
            professor_id: course.professor_id,
            name: course.name,
            code: course.code,
            description: course.description,
            geofence_lat: course.geofence.map(|g| g.latitude),
            geofence_lon: course.geofence.map(|g| g.longitude),
            geofence_radius_m: course.geofence.map(|g| g.radius_m),
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

pub(crate) fn normalize_name(raw: &str) -> Result<String, CourseError> {
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(CourseError::validation(format!(
            "name must be 1 to {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_owned())
}

/// Trimmed and upper-cased.
pub(crate) fn normalize_code(raw: &str) -> Result<String, CourseError> {
    let code = raw.trim().to_uppercase();
    if code.is_empty() || code.chars().count() > MAX_CODE_LEN {
        return Err(CourseError::validation(format!(
            "code must be 1 to {MAX_CODE_LEN} characters"
        )));
    }
    Ok(code)
}

/// Blank descriptions become `None`.
pub(crate) fn normalize_description(raw: Option<&str>) -> Result<Option<String>, CourseError> {
    let Some(text) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    if text.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(CourseError::validation(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(Some(text.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_trimmed_and_upper_cased() {
        assert_eq!(normalize_code("  cs101 ").unwrap(), "CS101");
        assert!(normalize_code("   ").is_err());
        assert!(normalize_code(&"x".repeat(MAX_CODE_LEN + 1)).is_err());
    }

    #[test]
    fn names_are_bounded() {
        assert_eq!(normalize_name(" Algorithms ").unwrap(), "Algorithms");
        assert!(normalize_name("").is_err());
        assert!(normalize_name(&"n".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn blank_description_is_none() {
        assert_eq!(normalize_description(Some("   ")).unwrap(), None);
        assert_eq!(normalize_description(None).unwrap(), None);
        assert_eq!(normalize_description(Some(" Intro ")).unwrap().as_deref(), Some("Intro"));
    }

    #[test]
    fn geofence_ranges() {
        let ok = Geofence { latitude: 48.85, longitude: 2.35, radius_m: 150.0 };
        assert!(ok.validate().is_ok());
        assert!(Geofence { latitude: 91.0, ..ok }.validate().is_err());
        assert!(Geofence { longitude: -180.5, ..ok }.validate().is_err());
        assert!(Geofence { radius_m: 0.0, ..ok }.validate().is_err());
        assert!(Geofence { radius_m: MAX_RADIUS_M + 1.0, ..ok }.validate().is_err());
        assert!(Geofence { radius_m: f64::NAN, ..ok }.validate().is_err());
    }

    #[test]
    fn rows_without_full_geofence_have_none() {
        let row = CourseRow {
            course_id: "c1".into(),
            professor_id: "p1".into(),
            name: "Algorithms".into(),
            code: "CS101".into(),
            description: None,
            geofence_lat: Some(1.0),
            geofence_lon: None,
            geofence_radius_m: Some(10.0),
            created_at: 1,
            updated_at: 1,
        };
        assert!(Course::from(row).geofence.is_none());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = serde_json::from_str::<CreateCourseRequest>(
            r#"{"name":"A","code":"B","room":"C"}"#,
        );
        assert!(err.is_err());

        let minimal: CreateCourseRequest =
            serde_json::from_str(r#"{"name":"A","code":"B"}"#).unwrap();
        assert!(minimal.geofence.is_none());
    }
}
