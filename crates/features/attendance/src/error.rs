use rollcall_courses::CourseError;
use rollcall_database::DatabaseError;
use rollcall_events::EventBusError;
use rollcall_kernel::security::resource::ResourceGuardError;
use std::borrow::Cow;

/// A specialized [`AttendanceError`] enum of this crate.
#[rollcall_derive::rollcall_error]
pub enum AttendanceError {
    #[code(Validation)]
    #[error("Invalid input{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[code(Forbidden)]
    #[error("Not allowed{}: {message}", format_context(.context))]
    Forbidden { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[code(NotFound)]
    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Already checked in for this course and session date.
    #[code(Conflict)]
    #[error("Already checked in{}: {message}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[code(inherit)]
    #[error("{source}")]
    Course { source: CourseError, context: Option<Cow<'static, str>> },

    #[code(Validation)]
    #[error("Invalid identifier{}: {source}", format_context(.context))]
    Resource { source: ResourceGuardError, context: Option<Cow<'static, str>> },

    #[error("Database error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },

    #[error("Event bus error{}: {source}", format_context(.context))]
    Events { source: EventBusError, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal attendance error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl AttendanceError {
    pub(crate) fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Validation { message: message.into(), context: None }
    }

    pub(crate) fn forbidden(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Forbidden { message: message.into(), context: None }
    }

    pub(crate) fn already_checked_in(session_date: &str) -> Self {
        Self::Conflict {
            message: format!("a check-in for {session_date} already exists").into(),
            context: None,
        }
    }
}
