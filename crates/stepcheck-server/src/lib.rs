//! Step Validator: a TCP server that checks submitted steps against one
//! global, strictly increasing sequence.
//!
//! Each accepted connection gets its own task. Requests are validated in
//! [`StepValidator::validate`]; only the compare-and-update on the shared
//! counter is serialized across connections.

pub mod config;
pub mod server;
pub mod validator;

pub use config::ValidatorConfig;
pub use server::{serve, serve_listener, serve_with_shutdown};
pub use validator::StepValidator;
