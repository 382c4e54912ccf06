use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use cloudmap_sd::config::DiscoveryConfig;
use cloudmap_sd::discovery::{scheduler, Discovery, Reconciler};
use cloudmap_sd::output::FileSdWriter;
use cloudmap_sd::registry::CloudMapRegistry;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Batches queued between the discovery loop and the file writer
const SINK_CAPACITY: usize = 16;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Path of the file_sd JSON file to write
    #[arg(
        long = "output.file",
        env = "CLOUDMAP_SD_OUTPUT_FILE",
        default_value = "cloudmap_sd.json"
    )]
    output_file: PathBuf,

    /// AWS region; resolved from the default provider chain when unset
    #[arg(long = "aws.region", env = "AWS_REGION")]
    region: Option<String>,

    /// Only discover services in the namespace with this exact name
    #[arg(long = "cloudmap.namespace", env = "CLOUDMAP_SD_NAMESPACE")]
    namespace: Option<String>,

    /// Seconds between refresh cycles
    #[arg(
        long = "target.refresh",
        env = "CLOUDMAP_SD_REFRESH_INTERVAL",
        default_value_t = 60
    )]
    refresh_secs: u64,

    /// Log output format
    #[arg(long = "log.format", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Some(Commands::Version) => {
            println!("cloudmap-sd v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        None => run(args.run).await,
    }
}

fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    init_tracing(args.log_format);

    info!("Starting cloudmap-sd v{}", env!("CARGO_PKG_VERSION"));

    let config = DiscoveryConfig::from_args(args.region, args.refresh_secs, args.namespace)
        .context("invalid configuration")?;

    let registry = CloudMapRegistry::from_env(config.region.clone())
        .await
        .context("failed to set up the Cloud Map client")?;

    if let Some(namespace) = &config.namespace {
        info!("Restricting discovery to namespace {}", namespace);
    }

    let reconciler = Reconciler::new(Arc::new(registry), config.namespace.clone());
    let discovery = Discovery::new(reconciler);

    let (tx, rx) = mpsc::channel(SINK_CAPACITY);
    let writer = tokio::spawn(FileSdWriter::new(args.output_file).run(rx));

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    let result = scheduler::run(discovery, config.refresh_interval, tx, shutdown).await;

    // The scheduler owned the only sender, so the writer drains and exits
    if let Err(e) = writer.await {
        error!("File writer task failed: {}", e);
    }

    result.context("discovery loop failed")?;
    info!("Shutdown complete");
    Ok(())
}

/// Cancel `shutdown` on Ctrl-C or SIGTERM
async fn watch_signals(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("Received Ctrl-C"),
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Failed to listen for Ctrl-C: {}", e);
                    return;
                }
                info!("Received Ctrl-C");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        info!("Received Ctrl-C");
    }

    info!("Shutting down");
    shutdown.cancel();
}
