//! Kernel utilities shared across slices.
//! Keep this crate lightweight: config loading, IDs, security primitives and the HTTP plumbing
//! every slice plugs into.
//!
//! ## ID generation
//! Use `safe_nanoid!` for URL-safe, unambiguous IDs:
//! ```rust
//! # use rollcall_kernel::safe_nanoid;
//! let id = safe_nanoid!();
//! assert_eq!(id.len(), 16);
//! ```
//!
//! ## Config loading
//! ```rust,no_run
//! use rollcall_kernel::config::load_config;
//! use rollcall_kernel::domain::config::ApiConfig;
//!
//! let cfg: ApiConfig = load_config(Some("server.toml")).unwrap();
//! ```

// Lets `#[rollcall_error]` expansions inside this crate resolve `::rollcall_kernel`.
extern crate self as rollcall_kernel;

pub mod config;
pub mod prelude;
pub mod security;
pub mod server;

// Alphabet excludes visually ambiguous characters (I, O, i, l, o, 0, 1).
pub const SAFE_ALPHABET: &[char; 55] = &[
    '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L',
    'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b', 'c', 'd', 'e', 'f',
    'g', 'h', 'j', 'k', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

pub use nanoid::nanoid;
pub use rollcall_domain as domain;

/// Generates an unambiguous `NanoID` (16 characters unless a size is given).
#[macro_export]
macro_rules! safe_nanoid {
    () => {
        $crate::nanoid!(16, $crate::SAFE_ALPHABET)
    };
    ($size:expr) => {
        $crate::nanoid!($size, $crate::SAFE_ALPHABET)
    };
}

/// Current wall-clock time as Unix milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
