use std::io;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokspeed::{run_speed_test, BenchmarkConfig, DEFAULT_ENDPOINT};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "tokspeed",
    version,
    about = "Measure token generation speed of a local chat-completions server"
)]
struct Args {
    /// Chat-completions URL to benchmark
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Request timeout in seconds; by default requests wait indefinitely
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    let mut config = BenchmarkConfig::try_new(&args.endpoint)?;
    if let Some(secs) = args.timeout_secs {
        config = config.with_request_timeout(Duration::from_secs(secs));
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut err = io::stderr();
    run_speed_test(config, &mut out, &mut err).await?;

    Ok(())
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}
