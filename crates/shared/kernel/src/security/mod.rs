//! Authentication and authorization primitives.
//!
//! * [`actor`]: the authenticated caller as seen by services.
//! * [`session`]: HS256 bearer tokens issued at sign-in.
//! * [`policy`]: row-level access predicates per resource.
//! * [`resource`]: validation of caller-supplied identifiers.

pub mod actor;
pub mod policy;
pub mod resource;
pub mod session;

pub use actor::Actor;
pub use session::{SessionClaims, SessionError, SessionTokens};
