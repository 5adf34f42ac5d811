use crate::error::CourseError;
use crate::model::{
    Course, CourseQrResponse, CreateCourseRequest, UpdateCourseRequest, normalize_code,
    normalize_description, normalize_name,
};
use crate::qr::{CheckInToken, QrSigner};
use crate::repository::CourseRepository;
use rollcall_database::Database;
use rollcall_domain::config::QrConfig;
use rollcall_domain::constants::COURSE;
use rollcall_kernel::security::policy;
use rollcall_kernel::security::resource::ResourceGuard;
use rollcall_kernel::security::Actor;
use rollcall_kernel::{now_millis, safe_nanoid};
use tracing::{info, instrument};

/// Course management and check-in code issuance.
#[derive(Debug, Clone)]
pub struct CourseService {
    repo: CourseRepository,
    qr: QrSigner,
}

impl CourseService {
    /// # Errors
    /// Propagates [`QrSigner::from_config`] failures.
    pub fn new(db: Database, qr: &QrConfig) -> Result<Self, CourseError> {
        Ok(Self { repo: CourseRepository::new(db), qr: QrSigner::from_config(qr)? })
    }

    #[instrument(skip_all, fields(professor = %actor.user_id))]
    pub async fn create_course(
        &self,
        actor: &Actor,
        request: CreateCourseRequest,
    ) -> Result<Course, CourseError> {
        if !policy::course::can_insert(actor, &actor.user_id) {
            return Err(CourseError::forbidden("only professors create courses"));
        }
        let now = now_millis();
        let course = Course {
            course_id: safe_nanoid!(),
            professor_id: actor.user_id.clone(),
            name: normalize_name(&request.name)?,
            code: normalize_code(&request.code)?,
            description: normalize_description(request.description.as_deref())?,
            geofence: request.geofence.map(|g| g.validate()).transpose()?,
            created_at: now,
            updated_at: now,
        };

        let course = self.repo.insert(course).await?;
        info!(course_id = %course.course_id, code = %course.code, "Course created");
        Ok(course)
    }

    /// Professors see their own courses; admins and students see every course.
    pub async fn list_courses(&self, actor: &Actor) -> Result<Vec<Course>, CourseError> {
        let own_only = actor.is_professor() && !actor.is_admin() && !actor.is_student();
        self.repo.list(own_only.then_some(actor.user_id.as_str())).await
    }

    pub async fn get_course(&self, actor: &Actor, course_id: &str) -> Result<Course, CourseError> {
        if !policy::course::can_select(actor) {
            return Err(CourseError::forbidden("course is not visible to the caller"));
        }
        self.find(course_id).await
    }

    #[instrument(skip(self, actor, patch), fields(user = %actor.user_id))]
    pub async fn update_course(
        &self,
        actor: &Actor,
        course_id: &str,
        patch: UpdateCourseRequest,
    ) -> Result<Course, CourseError> {
        let mut course = self.managed_course(actor, course_id).await?;

        if let Some(name) = patch.name.as_deref() {
            course.name = normalize_name(name)?;
        }
        if let Some(code) = patch.code.as_deref() {
            course.code = normalize_code(code)?;
        }
        if let Some(description) = patch.description.as_deref() {
            course.description = normalize_description(Some(description))?;
        }
        match (patch.geofence, patch.remove_geofence) {
            (Some(_), true) => {
                return Err(CourseError::validation("set either geofence or removeGeofence"));
            },
            (Some(geofence), false) => course.geofence = Some(geofence.validate()?),
            (None, true) => course.geofence = None,
            (None, false) => {},
        }
        course.updated_at = now_millis();

        let course = self.repo.update(course).await?;
        info!("Course updated");
        Ok(course)
    }

    /// Deletes the course together with its attendance records.
    #[instrument(skip(self, actor), fields(user = %actor.user_id))]
    pub async fn delete_course(&self, actor: &Actor, course_id: &str) -> Result<(), CourseError> {
        let course = self.managed_course(actor, course_id).await?;
        self.repo.delete_cascade(&course.course_id).await?;
        info!("Course deleted");
        Ok(())
    }

    /// Mints a signed check-in code and renders it as SVG.
    #[instrument(skip(self, actor), fields(user = %actor.user_id))]
    pub async fn issue_qr(
        &self,
        actor: &Actor,
        course_id: &str,
    ) -> Result<CourseQrResponse, CourseError> {
        let course = self.managed_course(actor, course_id).await?;
        let signed = self.qr.sign(&course.course_id, now_millis())?;
        let svg = self.qr.render_svg(&signed.payload)?;

        info!(expires_at = signed.token.expires_at, "Check-in code issued");
        Ok(CourseQrResponse {
            course_id: course.course_id,
            payload: signed.payload,
            svg,
            issued_at: signed.token.issued_at,
            expires_at: signed.token.expires_at,
        })
    }

    /// Loads a course by id without an access check, for use by other slices.
    pub async fn find(&self, course_id: &str) -> Result<Course, CourseError> {
        let course_id = ResourceGuard::verify(course_id, COURSE)?;
        self.repo.find(&course_id).await?.ok_or_else(|| CourseError::not_found(&course_id))
    }

    /// Loads a course the caller may manage (owner professor or admin).
    pub async fn managed_course(&self, actor: &Actor, course_id: &str) -> Result<Course, CourseError> {
        let course = self.find(course_id).await?;
        if !policy::course::can_manage(actor, &course.professor_id) {
            return Err(CourseError::forbidden("only the course owner or an admin may do this"));
        }
        Ok(course)
    }

    /// Authenticates a scanned check-in payload.
    ///
    /// # Errors
    /// See [`QrSigner::verify`].
    pub fn verify_qr(&self, payload: &str, now_ms: i64) -> Result<CheckInToken, CourseError> {
        self.qr.verify(payload, now_ms)
    }
}
