use std::borrow::Cow;

/// A specialized [`DatabaseError`] enum of this crate.
#[rollcall_derive::rollcall_error]
pub enum DatabaseError {
    /// Validation errors.
    #[error("Validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Occurs when connectivity or health checks fail.
    #[error("Database connection failed{}: {message}", format_context(.context))]
    Connection { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Occurs when root sign-in fails.
    #[error("Authentication failed{}: {message}", format_context(.context))]
    Auth { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A wrapper for underlying `SurrealDB` engine errors.
    #[error("SurrealDB error{}: {source}", format_context(.context))]
    Surreal {
        #[source]
        source: surrealdb::Error,
        context: Option<Cow<'static, str>>,
    },

    /// Migration failures or invariant violations.
    #[error("Migration error{}: {message}", format_context(.context))]
    Migration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal database error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl DatabaseError {
    /// True when the engine rejected a write because a `UNIQUE` index already holds the key.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        self.surreal_message().is_some_and(|message| message.contains("already contains"))
    }

    /// True when an optimistic transaction lost a key-value write race and may be retried.
    #[must_use]
    pub fn is_write_conflict(&self) -> bool {
        self.surreal_message().is_some_and(|message| {
            message.contains("Transaction conflict") || message.contains("retry the transaction")
        })
    }

    fn surreal_message(&self) -> Option<String> {
        match self {
            Self::Surreal { source, .. } => Some(source.to_string()),
            _ => None,
        }
    }
}
