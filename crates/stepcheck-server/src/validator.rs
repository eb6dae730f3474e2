use std::time::Duration;

use log::{debug, info, warn};
use stepcheck::protocol::MAX_MESSAGE_SIZE;
use stepcheck::{Admission, ErrorCode, SequenceTracker, StepError, StepRequest, StepResponse};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::ValidatorConfig;

/// Shared validation state plus the per-connection protocol loop.
#[derive(Debug)]
pub struct StepValidator {
    sequence: SequenceTracker,
    timeout_threshold: i64,
    read_timeout: Duration,
}

/// What the connection loop does after a reply has been sent.
enum NextAction {
    KeepReading,
    Close,
}

impl StepValidator {
    pub fn new(config: &ValidatorConfig) -> Self {
        Self {
            sequence: SequenceTracker::new(),
            timeout_threshold: config.timeout_threshold,
            read_timeout: config.read_timeout,
        }
    }

    pub fn current_step(&self) -> i64 {
        self.sequence.current()
    }

    pub fn timeout_threshold(&self) -> i64 {
        self.timeout_threshold
    }

    /// Classify one decoded request.
    ///
    /// Requests declaring a timeout below the threshold never reach the shared
    /// sequence. Everything else goes through exactly one `try_accept`.
    pub fn validate(&self, request: &StepRequest) -> StepResponse {
        let step_id = request.step_id;

        if request.timeout < self.timeout_threshold {
            info!(
                "Step {step_id} - declared timeout ({}) is below threshold ({}), replying TIMEOUT",
                request.timeout, self.timeout_threshold
            );
            return StepResponse::new(Some(step_id), ErrorCode::Timeout);
        }

        match self.sequence.try_accept(step_id) {
            Admission::Accepted { current_step } => {
                debug!("Step {step_id} accepted, current step is now {current_step}");
                StepResponse::new(Some(step_id), ErrorCode::Ok)
            }
            Admission::Rejected { current_step } => {
                info!(
                    "Non-sequential step_id {step_id} - OUT_OF_ORDER, current step advanced to {current_step}"
                );
                StepResponse::new(Some(step_id), ErrorCode::OutOfOrder)
            }
        }
    }

    /// Serve one connection until the peer closes it or a fault ends it.
    ///
    /// One `read` of up to [`MAX_MESSAGE_SIZE`] bytes is one request. The
    /// only thing remembered between requests is the last step id, which
    /// labels timeout and error replies.
    pub async fn handle_connection<S>(&self, mut stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut buf = [0u8; MAX_MESSAGE_SIZE];
        let mut last_step_id: Option<i64> = None;

        loop {
            let read = match tokio::time::timeout(self.read_timeout, stream.read(&mut buf)).await {
                Ok(Ok(0)) => {
                    debug!("Peer closed the connection");
                    break;
                }
                Ok(Ok(n)) => n,
                Ok(Err(e)) => {
                    let code = match StepError::from_io_error(e, "request read") {
                        err if err.is_timeout() => {
                            info!("Socket timed out while serving client: {err}");
                            ErrorCode::Timeout
                        }
                        err => {
                            info!("Unexpected error while serving client: {err}");
                            ErrorCode::UnexpectedError
                        }
                    };
                    let _ = self
                        .send(&mut stream, StepResponse::new(last_step_id, code))
                        .await;
                    break;
                }
                Err(_) => {
                    info!(
                        "No request within {:?} while serving client, replying TIMEOUT",
                        self.read_timeout
                    );
                    let _ = self
                        .send(
                            &mut stream,
                            StepResponse::new(last_step_id, ErrorCode::Timeout),
                        )
                        .await;
                    break;
                }
            };

            debug!(
                "Raw data received from client: {:?}",
                String::from_utf8_lossy(&buf[..read])
            );

            let (response, next) = match StepRequest::decode(&buf[..read]) {
                Ok(request) => {
                    last_step_id = Some(request.step_id);
                    (self.validate(&request), NextAction::KeepReading)
                }
                Err(e) => {
                    if let Some(step_id) = e.step_id() {
                        last_step_id = Some(step_id);
                    }
                    info!("Unexpected error while serving client: {e}");
                    (
                        StepResponse::new(last_step_id, ErrorCode::UnexpectedError),
                        NextAction::Close,
                    )
                }
            };

            if let Err(e) = self.send(&mut stream, response).await {
                warn!("Failed to send response: {e}");
                break;
            }
            if let NextAction::Close = next {
                break;
            }
        }

        let _ = stream.shutdown().await;
    }

    async fn send<S>(&self, stream: &mut S, response: StepResponse) -> Result<(), StepError>
    where
        S: AsyncWrite + Unpin,
    {
        let bytes = response.to_bytes()?;
        stream
            .write_all(&bytes)
            .await
            .map_err(|e| StepError::from_io_error(e, "response write"))?;
        stream
            .flush()
            .await
            .map_err(|e| StepError::from_io_error(e, "response flush"))
    }
}
