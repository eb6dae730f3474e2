//! Step Driver: replays a scripted sequence of steps against a Step Validator.
//!
//! Every step uses its own TCP connection. Failures are logged and never stop
//! the run; only the raw `END` sentinel from the server does.

pub mod driver;
pub mod script;

pub use driver::{DriverConfig, RunSummary, StepDriver, StepOutcome};
pub use script::{DataSet, ScriptLoader, ScriptStep, TestScript};
