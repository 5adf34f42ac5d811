use crate::error::CourseError;
use crate::model::{Course, CourseRow};
use rollcall_database::{Database, DatabaseErrorExt};

const COURSE_FIELDS: &str = "course_id, professor_id, name, code, description, geofence_lat, \
                             geofence_lon, geofence_radius_m, created_at, updated_at";

/// `SurrealDB` access for `course`.
#[derive(Debug, Clone)]
pub(crate) struct CourseRepository {
    db: Database,
}

impl CourseRepository {
    pub(crate) const fn new(db: Database) -> Self {
        Self { db }
    }

    pub(crate) async fn insert(&self, course: Course) -> Result<Course, CourseError> {
        let row = &CourseRow::from(course.clone());
        let db = &self.db;
        let result = db
            .retry_conflicts(move || async move {
                db.query(
                    "CREATE course SET course_id = $course_id, professor_id = $professor_id, name = $name,
                        code = $code, description = $description, geofence_lat = $geofence_lat,
                        geofence_lon = $geofence_lon, geofence_radius_m = $geofence_radius_m,
                        created_at = $created_at, updated_at = $updated_at
                    RETURN NONE",
                )
                .bind(("course_id", row.course_id.clone()))
                .bind(("professor_id", row.professor_id.clone()))
                .bind(("name", row.name.clone()))
                .bind(("code", row.code.clone()))
                .bind(("description", row.description.clone()))
                .bind(("geofence_lat", row.geofence_lat))
                .bind(("geofence_lon", row.geofence_lon))
                .bind(("geofence_radius_m", row.geofence_radius_m))
                .bind(("created_at", row.created_at))
                .bind(("updated_at", row.updated_at))
                .await
                .context("Creating course")?
                .check()
                .map_err(surrealdb::Error::from)
                .context("Creating course")
                .map(|_| ())
            })
            .await;

        match result {
            Ok(()) => Ok(course),
            Err(err) if err.is_unique_violation() => Err(duplicate_code(&course.code)),
            Err(err) => Err(err.into()),
        }
    }

    pub(crate) async fn find(&self, course_id: &str) -> Result<Option<Course>, CourseError> {
        let rows = self
            .db
            .query(format!("SELECT {COURSE_FIELDS} FROM course WHERE course_id = $course_id LIMIT 1"))
            .bind(("course_id", course_id.to_owned()))
            .await
            .context("Loading course")?
            .take::<Vec<CourseRow>>(0)
            .context("Parsing course")?;
        Ok(rows.into_iter().next().map(Course::from))
    }

    /// All courses, or only those of `professor_id`, ordered by code.
    pub(crate) async fn list(&self, professor_id: Option<&str>) -> Result<Vec<Course>, CourseError> {
        let query = match professor_id {
            Some(_) => format!(
                "SELECT {COURSE_FIELDS} FROM course WHERE professor_id = $professor_id ORDER BY code"
            ),
            None => format!("SELECT {COURSE_FIELDS} FROM course ORDER BY code"),
        };
        let rows = self
            .db
            .query(query)
            .bind(("professor_id", professor_id.map(str::to_owned)))
            .await
            .context("Listing courses")?
            .take::<Vec<CourseRow>>(0)
            .context("Parsing courses")?;
        Ok(rows.into_iter().map(Course::from).collect())
    }

    /// Overwrites the mutable columns of an existing course.
    pub(crate) async fn update(&self, course: Course) -> Result<Course, CourseError> {
        let row = &CourseRow::from(course.clone());
        let db = &self.db;
        let result = db
            .retry_conflicts(move || async move {
                db.query(
                    "UPDATE course SET name = $name, code = $code, description = $description,
                        geofence_lat = $geofence_lat, geofence_lon = $geofence_lon,
                        geofence_radius_m = $geofence_radius_m, updated_at = $updated_at
                    WHERE course_id = $course_id
                    RETURN NONE",
                )
                .bind(("course_id", row.course_id.clone()))
                .bind(("name", row.name.clone()))
                .bind(("code", row.code.clone()))
                .bind(("description", row.description.clone()))
                .bind(("geofence_lat", row.geofence_lat))
                .bind(("geofence_lon", row.geofence_lon))
                .bind(("geofence_radius_m", row.geofence_radius_m))
                .bind(("updated_at", row.updated_at))
                .await
                .context("Updating course")?
                .check()
                .map_err(surrealdb::Error::from)
                .context("Updating course")
                .map(|_| ())
            })
            .await;

        match result {
            Ok(()) => Ok(course),
            Err(err) if err.is_unique_violation() => Err(duplicate_code(&course.code)),
            Err(err) => Err(err.into()),
        }
    }

    /// Deletes the course and its attendance records atomically.
    pub(crate) async fn delete_cascade(&self, course_id: &str) -> Result<(), CourseError> {
        self.db
            .query(
                "BEGIN TRANSACTION;
                DELETE attendance WHERE course_id = $course_id;
                DELETE course WHERE course_id = $course_id;
                COMMIT TRANSACTION;",
            )
            .bind(("course_id", course_id.to_owned()))
            .await
            .context("Deleting course")?
            .check()
            .map_err(surrealdb::Error::from)
            .context("Deleting course")?;
        Ok(())
    }
}

fn duplicate_code(code: &str) -> CourseError {
    CourseError::Conflict {
        message: format!("you already have a course with code '{code}'").into(),
        context: None,
    }
}
