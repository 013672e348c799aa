//! Station command implementation.

use anyhow::Context;
use nlscan::WifiScan;

pub async fn run(wifi: &mut WifiScan, json: bool) -> anyhow::Result<()> {
    let station = wifi.station().await.context("reading station")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&station)?);
        return Ok(());
    }

    let Some(station) = station else {
        println!("not connected");
        return Ok(());
    };

    println!("Connected to {} ({})", station.bssid, station.ssid_lossy());
    println!("\tstatus: {}", station.status);
    match station.signal_dbm {
        Some(signal) => println!("\tsignal: {} dBm", signal),
        None => println!("\tsignal: unknown"),
    }
    if let Some(rx) = station.rx_packets {
        println!("\trx packets: {}", rx);
    }
    if let Some(tx) = station.tx_packets {
        println!("\ttx packets: {}", tx);
    }
    Ok(())
}
