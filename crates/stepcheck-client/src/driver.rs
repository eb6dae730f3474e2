use std::time::Duration;

use log::{error, info};
use stepcheck::protocol::{MAX_MESSAGE_SIZE, is_end_sentinel};
use stepcheck::{ErrorCode, StepError, StepResponse};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::sleep;

use crate::script::{ScriptStep, TestScript};

#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
    pub host: String,
    pub port: u16,
    /// Deadline for the server's reply; `None` waits indefinitely.
    pub response_timeout: Option<Duration>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            response_timeout: None,
        }
    }
}

/// How a single scripted step ended.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Succeeded { step_id: i64 },
    /// The server answered with a non-OK code (possibly one it does not know).
    Rejected { step_id: i64, error_code: i64 },
    /// No reply arrived before the response deadline.
    TimedOut { step_id: i64 },
    Failed { step_id: i64, reason: String },
    /// The server replied with the raw `END` sentinel.
    Terminated { step_id: i64 },
}

impl StepOutcome {
    pub fn step_id(&self) -> i64 {
        match self {
            StepOutcome::Succeeded { step_id }
            | StepOutcome::Rejected { step_id, .. }
            | StepOutcome::TimedOut { step_id }
            | StepOutcome::Failed { step_id, .. }
            | StepOutcome::Terminated { step_id } => *step_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Succeeded { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub outcomes: Vec<StepOutcome>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn terminated(&self) -> bool {
        matches!(self.outcomes.last(), Some(StepOutcome::Terminated { .. }))
    }
}

pub struct StepDriver {
    config: DriverConfig,
}

impl StepDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Replay every step in order, one connection per step.
    ///
    /// Each step waits its interval once inside [`StepDriver::send_step`]
    /// (only when a reply was handled) and once more here before the next
    /// step. An `END` reply stops the run without either wait.
    pub async fn run(&self, script: &TestScript) -> RunSummary {
        let mut summary = RunSummary {
            outcomes: Vec::with_capacity(script.len()),
        };

        for step in script.steps() {
            info!("Sending step {} to server", step.step_id);
            let outcome = self.send_step(step).await;
            let terminated = matches!(outcome, StepOutcome::Terminated { .. });
            summary.outcomes.push(outcome);

            if terminated {
                info!("Server sent END, stopping after step {}", step.step_id);
                break;
            }
            sleep(step.interval()).await;
        }

        summary
    }

    /// Run one step on a fresh connection and log how it ended.
    pub async fn send_step(&self, step: &ScriptStep) -> StepOutcome {
        match self.exchange(step).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_timeout() => {
                info!("Step {} ended by timeout", step.step_id);
                StepOutcome::TimedOut {
                    step_id: step.step_id,
                }
            }
            Err(e) => {
                error!(
                    "Step {} failed - Reason: Unexpected error: {e}",
                    step.step_id
                );
                StepOutcome::Failed {
                    step_id: step.step_id,
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn exchange(&self, step: &ScriptStep) -> Result<StepOutcome, StepError> {
        let mut stream = TcpStream::connect((self.config.host.as_str(), self.config.port))
            .await
            .map_err(|e| StepError::from_io_error(e, "connect"))?;

        let payload = step.request().to_bytes()?;
        stream
            .write_all(&payload)
            .await
            .map_err(|e| StepError::from_io_error(e, "request write"))?;

        let mut buf = [0u8; MAX_MESSAGE_SIZE];
        let read = self.read_reply(&mut stream, &mut buf).await?;
        let reply = &buf[..read];

        if is_end_sentinel(reply) {
            return Ok(StepOutcome::Terminated {
                step_id: step.step_id,
            });
        }

        let response = StepResponse::from_bytes(reply)?;
        let outcome = if response.is_ok() {
            info!("Step {} succeeded", step.step_id);
            StepOutcome::Succeeded {
                step_id: step.step_id,
            }
        } else {
            log_rejection(step.step_id, response.error_code);
            StepOutcome::Rejected {
                step_id: step.step_id,
                error_code: response.error_code,
            }
        };

        sleep(step.interval()).await;
        Ok(outcome)
    }

    async fn read_reply(&self, stream: &mut TcpStream, buf: &mut [u8]) -> Result<usize, StepError> {
        let read = stream.read(buf);
        let result = match self.config.response_timeout {
            Some(limit) => tokio::time::timeout(limit, read)
                .await
                .map_err(|_| StepError::TimedOut {
                    context: "response read".to_string(),
                })?,
            None => read.await,
        };
        result.map_err(|e| StepError::from_io_error(e, "response read"))
    }
}

fn log_rejection(step_id: i64, error_code: i64) {
    match ErrorCode::from_i64(error_code) {
        Some(code) => error!("Step {step_id} - {}", code.message()),
        None => error!("Step {step_id} - unknown error code {error_code}"),
    }
}
