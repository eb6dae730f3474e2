use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use stepcheck_client::{DataSet, DriverConfig, ScriptLoader, StepDriver};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum DataKind {
    Success,
    Failure,
}

impl From<DataKind> for DataSet {
    fn from(v: DataKind) -> Self {
        match v {
            DataKind::Success => DataSet::Success,
            DataKind::Failure => DataSet::Failure,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "step-client",
    version,
    about = "Replays a scripted sequence of steps against a step server"
)]
struct Args {
    /// Bundled test data to replay: success_data.json or failure_data.json
    #[arg(long, value_enum, default_value_t = DataKind::Success)]
    data: DataKind,

    /// Server host
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Server port
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Directory holding the bundled test data files
    #[arg(long, default_value = "test_data")]
    data_dir: PathBuf,

    /// Replay this script file instead of a bundled data set
    #[arg(long)]
    script: Option<PathBuf>,

    /// Seconds to wait for each server reply (waits indefinitely when omitted)
    #[arg(long)]
    response_timeout: Option<u64>,

    /// Log filter directives used when RUST_LOG is unset (e.g. "debug" or "info,stepcheck_server=debug")
    #[arg(long, default_value = stepcheck::telemetry::DEFAULT_LOG_LEVEL)]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    stepcheck::telemetry::init(&args.log_level)?;
    let script_path = args
        .script
        .unwrap_or_else(|| DataSet::from(args.data).path_in(&args.data_dir));
    let script = ScriptLoader::from_path(&script_path)?;

    tracing::info!(
        script = %script_path.display(),
        steps = script.len(),
        host = %args.host,
        port = args.port,
        "Replaying test script"
    );

    let driver = StepDriver::new(DriverConfig {
        host: args.host,
        port: args.port,
        response_timeout: args.response_timeout.map(Duration::from_secs),
    });
    let summary = driver.run(&script).await;

    tracing::info!(
        attempted = summary.outcomes.len(),
        succeeded = summary.succeeded(),
        "Test script finished"
    );
    Ok(())
}
