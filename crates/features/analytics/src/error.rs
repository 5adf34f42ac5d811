use rollcall_attendance::AttendanceError;
use rollcall_courses::CourseError;
use std::borrow::Cow;

/// A specialized [`AnalyticsError`] enum of this crate.
#[rollcall_derive::rollcall_error]
pub enum AnalyticsError {
    #[code(Validation)]
    #[error("Invalid input{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The configured transport refused the message.
    #[code(Unavailable)]
    #[error("Report delivery failed{}: {message}", format_context(.context))]
    Delivery { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[code(inherit)]
    #[error("{source}")]
    Course { source: CourseError, context: Option<Cow<'static, str>> },

    #[code(inherit)]
    #[error("{source}")]
    Attendance { source: AttendanceError, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal analytics error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
