use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum StepError {
    Io {
        context: String,
        reason: String,
    },
    /// A socket-level stall: nothing arrived before the read deadline.
    TimedOut {
        context: String,
    },
    MalformedRequest {
        step_id: Option<i64>,
        reason: String,
    },
    Decode {
        context: String,
        reason: String,
    },
    Encode {
        context: String,
        reason: String,
    },
    ScriptLoad {
        path: String,
        reason: String,
    },
    Bind {
        addr: String,
        reason: String,
    },
    InvalidConfig {
        field: String,
        reason: String,
    },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepError::Io { context, reason } => write!(f, "I/O error in {context}: {reason}"),
            StepError::TimedOut { context } => write!(f, "Timed out in {context}"),
            StepError::MalformedRequest { step_id, reason } => match step_id {
                Some(step_id) => write!(f, "Malformed request for step {step_id}: {reason}"),
                None => write!(f, "Malformed request: {reason}"),
            },
            StepError::Decode { context, reason } => {
                write!(f, "Failed to decode {context}: {reason}")
            }
            StepError::Encode { context, reason } => {
                write!(f, "Failed to encode {context}: {reason}")
            }
            StepError::ScriptLoad { path, reason } => {
                write!(f, "Failed to load test script '{path}': {reason}")
            }
            StepError::Bind { addr, reason } => {
                write!(f, "Failed to bind to address {addr}: {reason}")
            }
            StepError::InvalidConfig { field, reason } => {
                write!(f, "Invalid configuration for '{field}': {reason}")
            }
        }
    }
}

impl std::error::Error for StepError {}

impl StepError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, StepError::TimedOut { .. })
    }

    /// Step id carried by the failed message, when one could be recovered.
    pub fn step_id(&self) -> Option<i64> {
        match self {
            StepError::MalformedRequest { step_id, .. } => *step_id,
            _ => None,
        }
    }

    pub fn from_io_error(e: std::io::Error, context: &str) -> Self {
        match e.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                StepError::TimedOut {
                    context: context.to_string(),
                }
            }
            _ => StepError::Io {
                context: context.to_string(),
                reason: e.to_string(),
            },
        }
    }

    pub fn from_decode_error(e: impl fmt::Display, context: &str) -> Self {
        StepError::Decode {
            context: context.to_string(),
            reason: e.to_string(),
        }
    }

    pub fn from_encode_error(e: impl fmt::Display, context: &str) -> Self {
        StepError::Encode {
            context: context.to_string(),
            reason: e.to_string(),
        }
    }
}
