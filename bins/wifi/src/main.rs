//! wifi-scan - list nearby wireless networks and the current association.

mod scan;
mod station;

use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use nlscan::{DiagnosticSink, WifiScan};

#[derive(Parser)]
#[command(name = "wifi-scan", version, about = "Wireless network scanner")]
struct Cli {
    /// Wireless interface to use.
    #[arg(short, long)]
    interface: String,

    /// Output JSON.
    #[arg(short = 'j', long, global = true)]
    json: bool,

    /// Give up waiting for scan results after this many seconds.
    #[arg(short, long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Scan for networks (default).
    #[command(visible_alias = "s")]
    Scan(scan::ScanArgs),

    /// Show the access point this interface is connected to.
    #[command(visible_alias = "sta")]
    Station,
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let interface = cli.interface;
    let mut wifi = WifiScan::builder(interface.as_str())
        .diagnostics(DiagnosticSink::Tracing)
        .wait_timeout(cli.timeout.map(Duration::from_secs))
        .open()
        .await
        .with_context(|| format!("opening {}", interface))?;

    match cli.command {
        None => scan::run(&mut wifi, scan::ScanArgs::default(), cli.json).await,
        Some(Command::Scan(args)) => scan::run(&mut wifi, args, cli.json).await,
        Some(Command::Station) => station::run(&mut wifi, cli.json).await,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
