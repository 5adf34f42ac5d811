use rollcall_database::DatabaseError;
use rollcall_kernel::security::resource::ResourceGuardError;
use std::borrow::Cow;

/// A specialized [`CourseError`] enum of this crate.
#[rollcall_derive::rollcall_error]
pub enum CourseError {
    #[code(Validation)]
    #[error("Invalid input{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[code(Forbidden)]
    #[error("Not allowed{}: {message}", format_context(.context))]
    Forbidden { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[code(NotFound)]
    #[error("Course not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[code(Conflict)]
    #[error("Conflict{}: {message}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Unreadable, tampered or foreign QR payload.
    #[code(Validation)]
    #[error("Invalid check-in code{}: {message}", format_context(.context))]
    InvalidToken { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[code(Validation)]
    #[error("Check-in code expired{}: {message}", format_context(.context))]
    ExpiredToken { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[code(Validation)]
    #[error("Invalid identifier{}: {source}", format_context(.context))]
    Resource { source: ResourceGuardError, context: Option<Cow<'static, str>> },

    #[error("Database error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal course error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl CourseError {
    pub(crate) fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Validation { message: message.into(), context: None }
    }

    pub(crate) fn forbidden(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Forbidden { message: message.into(), context: None }
    }

    pub(crate) fn not_found(course_id: &str) -> Self {
        Self::NotFound { message: format!("no course '{course_id}'").into(), context: None }
    }

    pub(crate) fn invalid_token(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidToken { message: message.into(), context: None }
    }
}
