use std::time::Duration;

use stepcheck::StepError;
use tokio::sync::Semaphore;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TIMEOUT_THRESHOLD: i64 = 5;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorConfig {
    pub host: String,
    pub port: u16,
    /// Smallest declared `timeout` a request may carry before it is answered with TIMEOUT.
    pub timeout_threshold: i64,
    /// How long a connection may sit idle before the server gives up on it.
    pub read_timeout: Duration,
    /// Upper bound on concurrently served connections; `None` means unbounded.
    pub max_connections: Option<usize>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout_threshold: DEFAULT_TIMEOUT_THRESHOLD,
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_connections: None,
        }
    }
}

impl ValidatorConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), StepError> {
        if let Some(limit) = self.max_connections {
            check_max_connections(limit)?;
        }
        Ok(())
    }
}

/// A connection limit must admit at least one client and fit in a semaphore.
pub fn check_max_connections(limit: usize) -> Result<usize, StepError> {
    if limit == 0 || limit > Semaphore::MAX_PERMITS {
        return Err(StepError::InvalidConfig {
            field: "max_connections".to_string(),
            reason: format!("must be between 1 and {}, got {limit}", Semaphore::MAX_PERMITS),
        });
    }
    Ok(limit)
}
