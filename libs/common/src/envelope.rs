//! Wire envelopes shared by every API response
//!
//! Success bodies look like `{ "data": <payload>, "message": "..." }`,
//! error bodies like `{ "message": "<CODE>: description" }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Success envelope. `data` is `Value::Null` when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorEnvelope {
    /// Parse an error body; `None` when it is not a JSON error envelope
    pub fn parse(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }
}

impl ApiEnvelope {
    /// Wrap a payload the way the server does
    pub fn wrap(data: impl Serialize) -> serde_json::Result<Self> {
        Ok(Self {
            data: serde_json::to_value(data)?,
            message: None,
        })
    }
}
