use std::time::Duration;

use clap::Parser;
use stepcheck_server::{ValidatorConfig, config};

#[derive(Parser, Debug)]
#[command(
    name = "step-server",
    version,
    about = "TCP server that validates numbered steps submitted by clients"
)]
struct Args {
    /// Host IP or name to bind
    #[arg(long, default_value = config::DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = config::DEFAULT_PORT)]
    port: u16,

    /// Minimum declared timeout (seconds) a request must carry
    #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_THRESHOLD)]
    timeout: i64,

    /// Seconds a connection may stay idle before it is answered with TIMEOUT and closed
    #[arg(long, default_value_t = config::DEFAULT_READ_TIMEOUT.as_secs())]
    read_timeout: u64,

    /// Serve at most this many connections at once (unbounded when omitted)
    #[arg(long)]
    max_connections: Option<usize>,

    /// Log filter directives used when RUST_LOG is unset (e.g. "debug" or "info,stepcheck_server=debug")
    #[arg(long, default_value = stepcheck::telemetry::DEFAULT_LOG_LEVEL)]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    stepcheck::telemetry::init(&args.log_level)?;
    let config = ValidatorConfig {
        host: args.host,
        port: args.port,
        timeout_threshold: args.timeout,
        read_timeout: Duration::from_secs(args.read_timeout),
        max_connections: args.max_connections,
    };

    tracing::info!(
        addr = %config.bind_address(),
        threshold = config.timeout_threshold,
        "Starting step validator"
    );

    stepcheck_server::serve_with_shutdown(config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await?;
    Ok(())
}
