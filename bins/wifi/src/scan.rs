//! Scan command implementation.

use std::time::Duration;

use anyhow::Context;
use clap::Args;
use nlscan::{BssInfo, WifiScan};

#[derive(Args)]
pub struct ScanArgs {
    /// Maximum number of networks to keep.
    #[arg(short, long, default_value_t = 32)]
    pub capacity: usize,

    /// Retry this many times while the device reports it is busy.
    #[arg(short, long, default_value_t = 5)]
    pub retries: u32,

    /// Delay between busy retries, in milliseconds.
    #[arg(long, default_value_t = 1000, value_name = "MS")]
    pub retry_delay: u64,
}

impl Default for ScanArgs {
    fn default() -> Self {
        Self {
            capacity: 32,
            retries: 5,
            retry_delay: 1000,
        }
    }
}

pub async fn run(wifi: &mut WifiScan, args: ScanArgs, json: bool) -> anyhow::Result<()> {
    let mut networks = vec![BssInfo::default(); args.capacity];
    let seen = scan_with_retries(wifi, &mut networks, &args).await?;
    let shown = &networks[..seen.min(networks.len())];

    if json {
        let value = serde_json::json!({
            "ifindex": wifi.ifindex(),
            "seen": seen,
            "networks": shown,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    print_table(shown);
    if seen > shown.len() {
        println!("({} more not shown, raise --capacity)", seen - shown.len());
    }
    Ok(())
}

async fn scan_with_retries(
    wifi: &mut WifiScan,
    networks: &mut [BssInfo],
    args: &ScanArgs,
) -> anyhow::Result<usize> {
    let mut attempt = 0;
    loop {
        match wifi.scan(networks).await {
            Ok(seen) => return Ok(seen),
            Err(e) if is_transient(&e) && attempt < args.retries => {
                attempt += 1;
                tracing::info!(attempt, retries = args.retries, "{}, retrying", e);
                tokio::time::sleep(Duration::from_millis(args.retry_delay)).await;
            }
            Err(e) => return Err(e).context("scan failed"),
        }
    }
}

/// Errors worth another attempt: someone else holds the radio, or the scan
/// was cut short.
fn is_transient(err: &nlscan::Error) -> bool {
    err.is_busy() || matches!(err, nlscan::Error::ScanAborted)
}

fn print_table(networks: &[BssInfo]) {
    println!(
        "  {:<17}  {:>5}  {:>6}  {:>7}  {:<13}  SSID",
        "BSSID", "FREQ", "SIGNAL", "AGE", "STATUS"
    );
    for bss in networks {
        let marker = if bss.is_connected() { '*' } else { ' ' };
        println!(
            "{} {:<17}  {:>5}  {:>6}  {:>5}ms  {:<13}  {}",
            marker,
            bss.bssid.to_string(),
            bss.frequency,
            format!("{}dBm", bss.signal_dbm()),
            bss.seen_ms_ago,
            bss.status.to_string(),
            bss.ssid_lossy()
        );
    }
}
