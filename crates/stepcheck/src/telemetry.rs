//! Log output for the `step-server` and `step-client` binaries.

use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::StepError;

/// Level used when neither `--log-level` nor `RUST_LOG` says otherwise.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Build the active filter.
///
/// Non-blank `RUST_LOG` directives take precedence when they parse; an
/// unparsable `RUST_LOG` is ignored in favour of `log_level`. A bad
/// `log_level` is a configuration error.
pub fn log_filter(env_directives: Option<&str>, log_level: &str) -> Result<EnvFilter, StepError> {
    if let Some(Ok(filter)) = env_directives
        .filter(|d| !d.trim().is_empty())
        .map(EnvFilter::try_new)
    {
        return Ok(filter);
    }

    EnvFilter::try_new(log_level).map_err(|e| StepError::InvalidConfig {
        field: "log_level".to_string(),
        reason: format!("'{log_level}': {e}"),
    })
}

/// Install the process-wide subscriber and forward `log` records into it.
///
/// Only the first successful call installs anything.
pub fn init(log_level: &str) -> Result<(), StepError> {
    let filter = log_filter(std::env::var("RUST_LOG").ok().as_deref(), log_level)?;

    let _ = LogTracer::init();
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).compact())
        .try_init();
    Ok(())
}
