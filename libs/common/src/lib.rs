//! Common library for the board client
//!
//! This crate provides the pieces shared by the client core and its front
//! ends: the API error taxonomy, the domain error-code table with its
//! translator, and the wire envelopes every response is wrapped in.

pub mod codes;
pub mod envelope;
pub mod error;

pub use codes::{ErrorCode, translate};
pub use envelope::{ApiEnvelope, ErrorEnvelope};
pub use error::{ApiError, ApiResult};
