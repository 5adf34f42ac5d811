use crate::clock::{SessionClock, parse_date};
use crate::error::AttendanceError;
use crate::geo::GeoPoint;
use crate::model::{AttendanceRecord, CheckInRecorded, CheckInRequest};
use crate::repository::AttendanceRepository;
use rollcall_courses::{Course, Courses};
use rollcall_database::Database;
use rollcall_domain::config::AttendanceConfig;
use rollcall_domain::constants::ATTENDANCE;
use rollcall_events::EventBus;
use rollcall_kernel::security::policy;
use rollcall_kernel::security::resource::ResourceGuard;
use rollcall_kernel::security::Actor;
use rollcall_kernel::{now_millis, safe_nanoid};
use std::sync::Arc;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, instrument, warn};

/// Check-in flow, record queries and the live feed.
#[derive(Debug, Clone)]
pub struct AttendanceService {
    repo: AttendanceRepository,
    courses: Courses,
    events: EventBus,
    clock: SessionClock,
    require_location: bool,
    max_accuracy_m: f64,
}

/// Location outcome of a check-in.
#[derive(Debug, Clone, Copy, Default)]
struct Placement {
    point: Option<GeoPoint>,
    distance_m: Option<f64>,
}

impl AttendanceService {
    /// # Errors
    /// [`AttendanceError::Validation`] for an unusable `attendance` section.
    pub fn new(
        db: Database,
        courses: Courses,
        events: EventBus,
        rules: &AttendanceConfig,
    ) -> Result<Self, AttendanceError> {
        if !(rules.max_accuracy_m > 0.0) {
            return Err(AttendanceError::validation("attendance.max_accuracy_m must be positive"));
        }
        Ok(Self {
            repo: AttendanceRepository::new(db),
            courses,
            events,
            clock: SessionClock::new(rules.utc_offset_minutes)?,
            require_location: rules.require_location,
            max_accuracy_m: rules.max_accuracy_m,
        })
    }

    /// Records a check-in from a scanned course code.
    #[instrument(skip_all, fields(student = %actor.user_id))]
    pub async fn check_in(
        &self,
        actor: &Actor,
        request: CheckInRequest,
    ) -> Result<AttendanceRecord, AttendanceError> {
        if !policy::attendance::can_insert(actor, &actor.user_id) {
            return Err(AttendanceError::forbidden("only students check in"));
        }
        let now = now_millis();

        let token = self.courses.service.verify_qr(&request.payload, now)?;
        let course = self.courses.service.find(&token.course_id).await?;
        let placement = self.place(request.location, &course)?;
        let session_date = self.clock.session_date(now)?;

        if self.repo.exists(&course.course_id, &actor.user_id, &session_date).await? {
            return Err(AttendanceError::already_checked_in(&session_date));
        }

        let record = self
            .repo
            .insert(AttendanceRecord {
                record_id: safe_nanoid!(),
                course_id: course.course_id,
                student_id: actor.user_id.clone(),
                session_date,
                checked_in_at: now,
                latitude: placement.point.map(|p| p.latitude),
                longitude: placement.point.map(|p| p.longitude),
                accuracy_m: placement.point.and_then(|p| p.accuracy_m),
                distance_m: placement.distance_m,
            })
            .await?;
        info!(
            record_id = %record.record_id,
            course_id = %record.course_id,
            session_date = %record.session_date,
            "Check-in recorded"
        );

        match self.events.publish(CheckInRecorded { record: record.clone() }) {
            Ok(delivered) => debug!(delivered, "Check-in event published"),
            Err(e) => warn!(error = %e, "Check-in event not published"),
        }
        Ok(record)
    }

    /// The caller's own records, newest first.
    pub async fn my_records(&self, actor: &Actor) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        self.repo.by_student(&actor.user_id).await
    }

    /// Every record of a course, optionally for one session date. Owner professor or admin.
    pub async fn course_records(
        &self,
        actor: &Actor,
        course_id: &str,
        date: Option<&str>,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        let course = self.courses.service.managed_course(actor, course_id).await?;
        let date = date.map(parse_date).transpose()?;
        self.repo.by_course(&course.course_id, date).await
    }

    /// Removes a record as a manual correction. Course owner or admin.
    #[instrument(skip(self, actor), fields(user = %actor.user_id))]
    pub async fn delete_record(&self, actor: &Actor, record_id: &str) -> Result<(), AttendanceError> {
        let record_id = ResourceGuard::verify(record_id, ATTENDANCE)?;
        let record = self.repo.find(&record_id).await?.ok_or_else(|| AttendanceError::NotFound {
            message: format!("no attendance record '{record_id}'").into(),
            context: None,
        })?;
        let course = self.courses.service.find(&record.course_id).await?;

        if !policy::attendance::can_delete(actor, &course.professor_id) {
            return Err(AttendanceError::forbidden("only the course owner or an admin may do this"));
        }
        self.repo.delete(&record_id).await?;
        info!(course_id = %record.course_id, student = %record.student_id, "Attendance record deleted");
        Ok(())
    }

    /// Check-ins of one course as they happen. Owner professor or admin.
    ///
    /// A subscriber that falls behind skips the missed events and continues.
    pub async fn live_feed(
        &self,
        actor: &Actor,
        course_id: &str,
    ) -> Result<impl Stream<Item = Arc<CheckInRecorded>> + Send + use<>, AttendanceError> {
        let course = self.courses.service.managed_course(actor, course_id).await?;
        let receiver = self.events.subscribe::<CheckInRecorded>()?;
        debug!(course_id = %course.course_id, "Live feed opened");

        let course_id = course.course_id;
        Ok(BroadcastStream::new(receiver).filter_map(move |item| match item {
            Ok(event) if event.record.course_id == course_id => Some(event),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "Live feed lagged");
                None
            },
        }))
    }

    fn place(&self, location: Option<GeoPoint>, course: &Course) -> Result<Placement, AttendanceError> {
        let Some(point) = location else {
            if self.require_location || course.geofence.is_some() {
                return Err(AttendanceError::validation("a location is required to check in"));
            }
            return Ok(Placement::default());
        };
        let point = point.validate(self.max_accuracy_m)?;

        let Some(fence) = course.geofence else {
            return Ok(Placement { point: Some(point), distance_m: None });
        };
        let (inside, distance) = point.within(&fence);
        if !inside {
            return Err(AttendanceError::forbidden(format!(
                "you are {distance:.0} m from the classroom; check-in is allowed within {:.0} m",
                fence.radius_m
            )));
        }
        Ok(Placement { point: Some(point), distance_m: Some(distance) })
    }
}
