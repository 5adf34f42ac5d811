use rollcall_database::DatabaseError;
use rollcall_kernel::security::SessionError;
use rollcall_kernel::security::resource::ResourceGuardError;
use std::borrow::Cow;

/// A specialized [`IdentityError`] enum of this crate.
#[rollcall_derive::rollcall_error]
pub enum IdentityError {
    #[code(Validation)]
    #[error("Invalid input{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Sign-in failures. Never says whether the email exists.
    #[code(Unauthorized)]
    #[error("Authentication failed{}: {message}", format_context(.context))]
    Unauthorized { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[code(Forbidden)]
    #[error("Not allowed{}: {message}", format_context(.context))]
    Forbidden { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[code(NotFound)]
    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[code(Conflict)]
    #[error("Conflict{}: {message}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[code(Validation)]
    #[error("Invalid identifier{}: {source}", format_context(.context))]
    Resource { source: ResourceGuardError, context: Option<Cow<'static, str>> },

    #[error("Session error{}: {source}", format_context(.context))]
    Session { source: SessionError, context: Option<Cow<'static, str>> },

    #[error("Database error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal identity error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl IdentityError {
    pub(crate) fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Validation { message: message.into(), context: None }
    }

    pub(crate) fn forbidden(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Forbidden { message: message.into(), context: None }
    }

    pub(crate) fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound { message: message.into(), context: None }
    }

    pub(crate) fn invalid_credentials() -> Self {
        Self::Unauthorized { message: "Invalid email or password".into(), context: None }
    }
}
