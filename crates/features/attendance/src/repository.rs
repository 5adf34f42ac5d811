use crate::error::AttendanceError;
use crate::model::AttendanceRecord;
use rollcall_database::{Database, DatabaseErrorExt};

const RECORD_FIELDS: &str = "record_id, course_id, student_id, session_date, checked_in_at, \
                             latitude, longitude, accuracy_m, distance_m";

/// `SurrealDB` access for `attendance`.
#[derive(Debug, Clone)]
pub(crate) struct AttendanceRepository {
    db: Database,
}

impl AttendanceRepository {
    pub(crate) const fn new(db: Database) -> Self {
        Self { db }
    }

    pub(crate) async fn exists(
        &self,
        course_id: &str,
        student_id: &str,
        session_date: &str,
    ) -> Result<bool, AttendanceError> {
        let ids = self
            .db
            .query(
                "SELECT VALUE record_id FROM attendance
                WHERE course_id = $course_id AND student_id = $student_id AND session_date = $session_date
                LIMIT 1",
            )
            .bind(("course_id", course_id.to_owned()))
            .bind(("student_id", student_id.to_owned()))
            .bind(("session_date", session_date.to_owned()))
            .await
            .context("Checking for an existing check-in")?
            .take::<Vec<String>>(0)
            .context("Parsing check-in lookup")?;
        Ok(!ids.is_empty())
    }

    /// The unique index on (course, student, date) turns a lost race into `Conflict`.
    pub(crate) async fn insert(&self, record: AttendanceRecord) -> Result<AttendanceRecord, AttendanceError> {
        let db = &self.db;
        let row = &record;
        let result = db
            .retry_conflicts(move || async move {
                db.query(
                    "CREATE attendance SET record_id = $record_id, course_id = $course_id,
                        student_id = $student_id, session_date = $session_date,
                        checked_in_at = $checked_in_at, latitude = $latitude, longitude = $longitude,
                        accuracy_m = $accuracy_m, distance_m = $distance_m
                    RETURN NONE",
                )
                .bind(("record_id", row.record_id.clone()))
                .bind(("course_id", row.course_id.clone()))
                .bind(("student_id", row.student_id.clone()))
                .bind(("session_date", row.session_date.clone()))
                .bind(("checked_in_at", row.checked_in_at))
                .bind(("latitude", row.latitude))
                .bind(("longitude", row.longitude))
                .bind(("accuracy_m", row.accuracy_m))
                .bind(("distance_m", row.distance_m))
                .await
                .context("Recording check-in")?
                .check()
                .map_err(surrealdb::Error::from)
                .context("Recording check-in")
                .map(|_| ())
            })
            .await;

        match result {
            Ok(()) => Ok(record),
            Err(err) if err.is_unique_violation() => {
                Err(AttendanceError::already_checked_in(&record.session_date))
            },
            Err(err) if err.is_write_conflict() => {
                if self.exists(&record.course_id, &record.student_id, &record.session_date).await? {
                    return Err(AttendanceError::already_checked_in(&record.session_date));
                }
                Err(err.into())
            },
            Err(err) => Err(err.into()),
        }
    }

    pub(crate) async fn find(&self, record_id: &str) -> Result<Option<AttendanceRecord>, AttendanceError> {
        let rows = self
            .db
            .query(format!("SELECT {RECORD_FIELDS} FROM attendance WHERE record_id = $record_id LIMIT 1"))
            .bind(("record_id", record_id.to_owned()))
            .await
            .context("Loading attendance record")?
            .take::<Vec<AttendanceRecord>>(0)
            .context("Parsing attendance record")?;
        Ok(rows.into_iter().next())
    }

    /// Newest first.
    pub(crate) async fn by_student(&self, student_id: &str) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        self.db
            .query(format!(
                "SELECT {RECORD_FIELDS} FROM attendance WHERE student_id = $student_id
                ORDER BY checked_in_at DESC"
            ))
            .bind(("student_id", student_id.to_owned()))
            .await
            .context("Listing student attendance")?
            .take::<Vec<AttendanceRecord>>(0)
            .context("Parsing student attendance")
            .map_err(Into::into)
    }

    /// Newest first, optionally limited to one session date.
    pub(crate) async fn by_course(
        &self,
        course_id: &str,
        session_date: Option<String>,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        let filter = if session_date.is_some() { " AND session_date = $session_date" } else { "" };
        self.db
            .query(format!(
                "SELECT {RECORD_FIELDS} FROM attendance WHERE course_id = $course_id{filter}
                ORDER BY checked_in_at DESC"
            ))
            .bind(("course_id", course_id.to_owned()))
            .bind(("session_date", session_date))
            .await
            .context("Listing course attendance")?
            .take::<Vec<AttendanceRecord>>(0)
            .context("Parsing course attendance")
            .map_err(Into::into)
    }

    pub(crate) async fn delete(&self, record_id: &str) -> Result<(), AttendanceError> {
        self.db
            .query("DELETE attendance WHERE record_id = $record_id")
            .bind(("record_id", record_id.to_owned()))
            .await
            .context("Deleting attendance record")?
            .check()
            .map_err(surrealdb::Error::from)
            .context("Deleting attendance record")?;
        Ok(())
    }
}
