use crate::error::AttendanceError;
use chrono::{DateTime, FixedOffset, NaiveDate};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Maps check-in instants to session dates under a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    offset: FixedOffset,
}

impl SessionClock {
    /// # Errors
    /// [`AttendanceError::Validation`] unless the offset is strictly within ±24 h.
    pub fn new(utc_offset_minutes: i32) -> Result<Self, AttendanceError> {
        utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Self { offset })
            .ok_or_else(|| {
                AttendanceError::validation(format!(
                    "attendance.utc_offset_minutes {utc_offset_minutes} is out of range"
                ))
            })
    }

    /// `YYYY-MM-DD` of the instant (Unix milliseconds) in local time.
    ///
    /// # Errors
    /// [`AttendanceError::Internal`] for an instant chrono cannot represent.
    pub fn session_date(&self, instant_ms: i64) -> Result<String, AttendanceError> {
        let instant = DateTime::from_timestamp_millis(instant_ms).ok_or_else(|| {
            AttendanceError::Internal {
                message: format!("timestamp {instant_ms} is out of range").into(),
                context: None,
            }
        })?;
        Ok(instant.with_timezone(&self.offset).format(DATE_FORMAT).to_string())
    }
}

/// Validates a `YYYY-MM-DD` filter and returns it normalized.
pub(crate) fn parse_date(raw: &str) -> Result<String, AttendanceError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map(|date| date.format(DATE_FORMAT).to_string())
        .map_err(|_| AttendanceError::validation(format!("'{raw}' is not a YYYY-MM-DD date")))
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2025-03-09T23:30:00Z
    const LATE_EVENING_UTC: i64 = 1_741_563_000_000;

    #[test]
    fn offset_moves_the_day_boundary() {
        let utc = SessionClock::new(0).unwrap();
        assert_eq!(utc.session_date(LATE_EVENING_UTC).unwrap(), "2025-03-09");

        let kyiv = SessionClock::new(120).unwrap();
        assert_eq!(kyiv.session_date(LATE_EVENING_UTC).unwrap(), "2025-03-10");

        let new_york = SessionClock::new(-300).unwrap();
        assert_eq!(new_york.session_date(LATE_EVENING_UTC).unwrap(), "2025-03-09");
        // 2025-03-10T04:59:59.999Z is still the 9th at UTC-5.
        assert_eq!(new_york.session_date(1_741_582_799_999).unwrap(), "2025-03-09");
        assert_eq!(new_york.session_date(1_741_582_800_000).unwrap(), "2025-03-10");
    }

    #[test]
    fn offsets_beyond_a_day_are_rejected() {
        assert!(SessionClock::new(24 * 60).is_err());
        assert!(SessionClock::new(-24 * 60).is_err());
        assert!(SessionClock::new(i32::MAX).is_err());
        assert!(SessionClock::new(23 * 60 + 59).is_ok());
    }

    #[test]
    fn date_filters_are_validated() {
        assert_eq!(parse_date(" 2025-03-09 ").unwrap(), "2025-03-09");
        assert!(parse_date("2025-02-30").is_err());
        assert!(parse_date("09/03/2025").is_err());
    }
}
