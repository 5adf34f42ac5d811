use std::borrow::Cow;

const MAX_ID_LEN: usize = 64;

#[rollcall_derive::rollcall_error]
pub enum ResourceGuardError {
    #[code(Validation)]
    #[error("Resource validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Validation of identifiers received from clients (path segments, JSON fields).
#[derive(Debug)]
pub struct ResourceGuard;

impl ResourceGuard {
    /// Checks that `id` looks like an identifier of `kind` and returns it trimmed.
    ///
    /// Accepted: 1 to 64 ASCII letters, digits, `-` or `_`. Anything else is rejected before it
    /// reaches a query.
    ///
    /// # Errors
    /// Returns [`ResourceGuardError::Validation`] naming `kind`.
    pub fn verify<I, K>(id: I, kind: K) -> Result<String, ResourceGuardError>
    where
        I: AsRef<str>,
        K: AsRef<str>,
    {
        let id = id.as_ref().trim();
        let kind = kind.as_ref();

        if id.is_empty() || id.len() > MAX_ID_LEN {
            return Err(ResourceGuardError::Validation {
                message: format!("{kind} id must be 1..={MAX_ID_LEN} characters").into(),
                context: None,
            });
        }
        if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(ResourceGuardError::Validation {
                message: format!("{kind} id contains invalid characters").into(),
                context: Some(id.to_owned().into()),
            });
        }
        Ok(id.to_owned())
    }
}
