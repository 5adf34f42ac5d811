use std::borrow::Cow;

/// Errors raised by [`crate::EventBus`].
#[rollcall_derive::rollcall_error]
pub enum EventBusError {
    /// The registry holds a sender of a different type under this `TypeId`.
    #[error("Type mismatch{}: {message}", format_context(.context))]
    TypeMismatch { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Broadcast buffers need room for at least one event.
    #[error("Invalid capacity{}: {message}", format_context(.context))]
    InvalidCapacity { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
