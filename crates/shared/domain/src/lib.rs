//! # Domain Models
//!
//! Pure types shared by every slice: configuration, table/role constants, the role set
//! and the slice registry. Minimal dependencies (`serde`, `bitflags`); no I/O.

pub mod config;
pub mod constants;
pub mod registry;
pub mod roles;
