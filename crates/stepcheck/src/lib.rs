//! Shared building blocks for the step validation harness.
//!
//! The server (`stepcheck-server`) and the scripted client (`stepcheck-client`)
//! both speak the wire protocol defined in [`protocol`]. The server keeps its
//! only piece of shared state in a [`SequenceTracker`].

pub mod error;
pub mod protocol;
pub mod sequence;
pub mod telemetry;

pub use error::StepError;
pub use protocol::{ErrorCode, StepRequest, StepResponse};
pub use sequence::{Admission, SequenceTracker};

// Re-export logging macros for consistent usage across the crate
pub use log::{debug, error, info, trace, warn};
