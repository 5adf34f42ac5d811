//! HTTP plumbing shared by the slices: error mapping, API state, extractors and system routes.

pub mod error;
pub mod extract;
mod health;
pub mod router;
pub mod state;

pub use error::{ApiError, ErrorBody, ErrorCode, ErrorDetail};
pub use extract::{ApiJson, ApiPath, ApiQuery, AuthUser};
pub use health::HealthResponse;
pub use state::{ApiState, ApiStateBuilder, ApiStateError};
