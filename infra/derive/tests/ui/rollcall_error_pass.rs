use rollcall_derive::rollcall_error;
use std::borrow::Cow;

#[rollcall_error]
pub enum RosterError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Roster is closed{}: {message}", format_context(.context))]
    Closed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn load() -> Result<(), RosterError> {
    let io: Result<(), std::io::Error> = Err(std::io::Error::other("disk"));
    io.context("Reading roster")?;
    Ok(())
}

fn main() {
    let err = load().unwrap_err();
    assert_eq!(err.to_string(), "IO error (Reading roster): disk");

    let closed: Result<(), RosterError> =
        Err(RosterError::Closed { message: "week 3".into(), context: None });
    let closed = closed.context("Check-in window").unwrap_err();
    assert_eq!(closed.to_string(), "Roster is closed (Check-in window): week 3");

    let internal: RosterError = "unexpected".into();
    assert!(matches!(internal, RosterError::Internal { .. }));
}
