//! # Event Bus
//!
//! A typed, in-process broadcast bus shared by the feature slices.
//!
//! Events are keyed by their Rust type. Every subscriber receives every event published after it
//! subscribed; slow subscribers skip ahead instead of blocking publishers. Publishing with no
//! subscribers is not an error, which lets a slice emit events nobody listens to yet.
//!
//! # Example
//!
//! ```rust
//! use rollcall_events::{EventBus, EventBusError};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct CheckedIn { student: &'static str }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), EventBusError> {
//!     let bus = EventBus::new();
//!
//!     let mut rx = bus.subscribe::<CheckedIn>()?;
//!     bus.publish(CheckedIn { student: "ada" })?;
//!
//!     assert_eq!(rx.recv().await.unwrap().student, "ada");
//!     Ok(())
//! }
//! ```

mod bus;
mod error;

pub use bus::{DEFAULT_CAPACITY, Event, EventBus};
pub use error::{EventBusError, EventBusErrorExt};
