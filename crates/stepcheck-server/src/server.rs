//! Accept loop for the Step Validator.

use std::future::Future;
use std::sync::Arc;

use log::{debug, info, warn};
use stepcheck::StepError;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

use crate::config::check_max_connections;
use crate::{StepValidator, ValidatorConfig};

/// Bind to the configured address and serve until the process exits.
pub async fn serve(config: ValidatorConfig) -> Result<(), StepError> {
    serve_with_shutdown(config, std::future::pending::<()>()).await
}

/// Bind to the configured address and serve until `shutdown` resolves.
pub async fn serve_with_shutdown<F>(config: ValidatorConfig, shutdown: F) -> Result<(), StepError>
where
    F: Future<Output = ()>,
{
    config.validate()?;
    let bind_address = config.bind_address();
    let listener = TcpListener::bind(&bind_address)
        .await
        .map_err(|e| StepError::Bind {
            addr: bind_address.clone(),
            reason: e.to_string(),
        })?;
    info!(
        "Step validator listening on {bind_address}, timeout threshold: {}",
        config.timeout_threshold
    );

    let validator = Arc::new(StepValidator::new(&config));
    serve_listener(listener, validator, config.max_connections, shutdown).await
}

/// Run the accept loop on an already bound listener.
///
/// Every accepted connection is handled on its own task. With
/// `max_connections` set, the loop stops accepting while that many
/// connections are in flight; otherwise there is no limit.
pub async fn serve_listener<F>(
    listener: TcpListener,
    validator: Arc<StepValidator>,
    max_connections: Option<usize>,
    shutdown: F,
) -> Result<(), StepError>
where
    F: Future<Output = ()>,
{
    let limiter = match max_connections {
        Some(limit) => Some(Arc::new(Semaphore::new(check_max_connections(limit)?))),
        None => None,
    };
    tokio::pin!(shutdown);

    loop {
        let permit = match &limiter {
            Some(limiter) => tokio::select! {
                permit = Arc::clone(limiter).acquire_owned() => {
                    Some(permit.map_err(|e| StepError::Io {
                        context: "connection limiter".to_string(),
                        reason: e.to_string(),
                    })?)
                }
                _ = &mut shutdown => break,
            },
            None => None,
        };

        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Failed to accept connection: {e}");
                    continue;
                }
            },
            _ = &mut shutdown => break,
        };

        info!("Accepted connection from {peer}");
        let validator = Arc::clone(&validator);
        tokio::spawn(async move {
            validator.handle_connection(stream).await;
            drop(permit);
            debug!("Connection from {peer} closed");
        });
    }

    info!("Shutdown requested, no longer accepting connections");
    Ok(())
}
