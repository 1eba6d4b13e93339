//! httpsource CLI
//!
//! Runs one data source invocation from a YAML or JSON attribute file and
//! prints the resulting attributes as JSON on stdout.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use httpsource::{CancellationToken, HttpClient, HttpClientConfig};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod input;

#[derive(Parser, Debug)]
#[command(name = "httpsource")]
#[command(about = "Fetch an HTTP(S) data source and print its attributes")]
struct Args {
    /// Attribute file (.json for JSON, anything else is read as YAML)
    #[arg(short, long)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: Level,

    /// Pretty-print the output
    #[arg(long, default_value = "false")]
    pretty: bool,

    /// Deadline in milliseconds when the file sets none
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Do not follow redirects
    #[arg(long, default_value = "false")]
    no_redirects: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays machine-readable
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let attrs = input::load(&args.config)?;
    info!("Loaded data source {}", args.config.display());

    let mut config = HttpClientConfig::new().follow_redirects(!args.no_redirects);
    if let Some(ms) = args.timeout_ms {
        config = config.default_timeout(Duration::from_millis(ms));
    }
    let client = HttpClient::new(config)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let result = client
        .execute_with_cancel(attrs.into_request_spec(), cancel)
        .await
        .map_err(|err| anyhow!(err.sanitized_message()))?;

    for warning in &result.warnings {
        warn!(detail = %warning.detail, "{}", warning.summary);
    }

    let output = if args.pretty {
        serde_json::to_string_pretty(&result.attributes())?
    } else {
        serde_json::to_string(&result.attributes())?
    };
    println!("{}", output);

    Ok(())
}
