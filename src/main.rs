use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};
use windowstat::config::ServiceConfig;
use windowstat::ingest::Event;
use windowstat::server::StatsServer;
use windowstat::{SlidingWindow, WindowPolicy};

/// Sliding 60-second window statistics over timestamped events
#[derive(Parser)]
#[command(name = "windowstat", version)]
#[command(about = "Sliding 60-second window statistics over timestamped events", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service (default command)
    Serve {
        /// Path to a TOML configuration file
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short = 'p', long)]
        port: Option<u16>,

        /// Buckets folded by /stats: last-buckets or trailing-seconds
        #[arg(long)]
        window_policy: Option<WindowPolicy>,
    },
    /// Feed events from a file (or stdin) through a window and print the stats line
    Replay {
        /// File with one `<timestamp>,<x>,<y>` event per line
        file: Option<PathBuf>,

        /// Buckets folded into the result: last-buckets (default) or trailing-seconds
        #[arg(long)]
        window_policy: Option<WindowPolicy>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Serve {
            config,
            host,
            port,
            window_policy,
        }) => run_serve(cli.verbose, config, host, port, window_policy).await,
        Some(Commands::Replay {
            file,
            window_policy,
        }) => {
            init_tracing(cli.verbose, "warn");
            run_replay(file, window_policy.unwrap_or_default())
        }
        None => run_serve(cli.verbose, None, None, None, None).await,
    };

    if let Err(e) = result {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8, configured_level: &str) {
    let log_level = match verbose {
        0 => configured_level,
        1 => "debug",
        2 => "trace",
        _ => "trace,hyper=debug,tower=debug", // -vvv shows everything including dependencies
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(verbose >= 2)
        .with_thread_ids(verbose >= 3)
        .with_line_number(verbose >= 3)
        .with_writer(io::stderr)
        .init();

    debug!("windowstat started with verbosity level: {}", verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());
}

async fn run_serve(
    verbose: u8,
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    window_policy: Option<WindowPolicy>,
) -> anyhow::Result<()> {
    let mut service_config =
        ServiceConfig::load(config.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = host {
        service_config.host = host;
    }
    if let Some(port) = port {
        service_config.port = port;
    }
    if let Some(policy) = window_policy {
        service_config.window_policy = policy;
    }
    service_config.validate()?;

    init_tracing(verbose, &service_config.log_level);
    debug!("Effective configuration: {:?}", service_config);

    let window = Arc::new(SlidingWindow::with_policy(service_config.window_policy));
    StatsServer::new(window, service_config.bind_address())
        .start()
        .await
}

fn run_replay(file: Option<PathBuf>, window_policy: WindowPolicy) -> anyhow::Result<()> {
    let reader: Box<dyn BufRead> = match &file {
        Some(path) => Box::new(BufReader::new(
            std::fs::File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let window = SlidingWindow::with_policy(window_policy);
    debug!("Replaying with {} window", window.policy());
    let mut rejected = 0usize;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let recorded = line
            .parse::<Event>()
            .map_err(anyhow::Error::from)
            .and_then(|event| Ok(window.update(event.x, event.y, event.timestamp)?));
        if let Err(e) = recorded {
            rejected += 1;
            warn!("Skipping line {}: {}", index + 1, e);
        }
    }

    if rejected > 0 {
        debug!("Rejected {} event(s)", rejected);
    }
    println!("{}", window.snapshot());
    Ok(())
}
