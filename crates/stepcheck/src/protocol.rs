//! Wire format shared by the validator and the driver.
//!
//! Every message is a single JSON object written with one `write` and read
//! with one `read` of at most [`MAX_MESSAGE_SIZE`] bytes. There is no length
//! prefix; a request that does not fit in one read fails to decode.

use crate::StepError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Receive buffer size on both ends of the connection.
pub const MAX_MESSAGE_SIZE: usize = 1024;

/// Raw (non-JSON) reply that tells the driver to stop replaying its script.
pub const END_SENTINEL: &[u8] = b"END";

pub fn is_end_sentinel(bytes: &[u8]) -> bool {
    bytes == END_SENTINEL
}

// =============================================================================
// ERROR CODES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Ok = 0,
    Timeout = 1,
    OutOfOrder = 2,
    UnexpectedError = 3,
}

impl ErrorCode {
    pub fn as_i64(self) -> i64 {
        self as i64
    }

    pub fn from_i64(code: i64) -> Option<Self> {
        match code {
            0 => Some(ErrorCode::Ok),
            1 => Some(ErrorCode::Timeout),
            2 => Some(ErrorCode::OutOfOrder),
            3 => Some(ErrorCode::UnexpectedError),
            _ => None,
        }
    }

    /// Human readable description used in driver logs.
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::Ok => "success",
            ErrorCode::Timeout => "client timeout exceeded",
            ErrorCode::OutOfOrder => "non-sequential step_id",
            ErrorCode::UnexpectedError => "unexpected server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::Ok => "OK",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::OutOfOrder => "OUT_OF_ORDER",
            ErrorCode::UnexpectedError => "UNEXPECTED_ERROR",
        };
        f.write_str(name)
    }
}

// =============================================================================
// MESSAGES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRequest {
    pub step_id: i64,
    /// Declared duration hint in seconds, compared against the server threshold.
    pub timeout: i64,
}

impl StepRequest {
    pub fn new(step_id: i64, timeout: i64) -> Self {
        Self { step_id, timeout }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, StepError> {
        serde_json::to_vec(self).map_err(|e| StepError::from_encode_error(e, "step request"))
    }

    /// Decode a request, keeping the `step_id` when the payload is a JSON
    /// object that names one but is otherwise unusable.
    pub fn decode(bytes: &[u8]) -> Result<Self, StepError> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| StepError::MalformedRequest {
                step_id: None,
                reason: e.to_string(),
            })?;
        // serde also maps JSON arrays onto structs positionally; only objects are requests.
        if !value.is_object() {
            return Err(StepError::MalformedRequest {
                step_id: None,
                reason: "request must be a JSON object".to_string(),
            });
        }
        let step_id = value.get("step_id").and_then(serde_json::Value::as_i64);

        serde_json::from_value(value).map_err(|e| StepError::MalformedRequest {
            step_id,
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResponse {
    /// `None` when the server replies before learning any step id on the connection.
    pub step_id: Option<i64>,
    #[serde(default = "unexpected_error_code")]
    pub error_code: i64,
}

fn unexpected_error_code() -> i64 {
    ErrorCode::UnexpectedError.as_i64()
}

impl StepResponse {
    pub fn new(step_id: Option<i64>, code: ErrorCode) -> Self {
        Self {
            step_id,
            error_code: code.as_i64(),
        }
    }

    /// The typed error code, or `None` for a code outside the known taxonomy.
    pub fn code(&self) -> Option<ErrorCode> {
        ErrorCode::from_i64(self.error_code)
    }

    pub fn is_ok(&self) -> bool {
        self.code() == Some(ErrorCode::Ok)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, StepError> {
        serde_json::to_vec(self).map_err(|e| StepError::from_encode_error(e, "step response"))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StepError> {
        serde_json::from_slice(bytes).map_err(|e| StepError::from_decode_error(e, "step response"))
    }
}
