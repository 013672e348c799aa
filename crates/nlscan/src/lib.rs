//! Async nl80211 scan and station client for Linux.
//!
//! This crate talks to the kernel's nl80211 generic netlink family directly.
//! It triggers scans and waits for their completion on the `scan` multicast
//! group. It reads results into caller-provided slots and queries statistics
//! for the access point the device is associated with.
//!
//! # Features
//!
//! - `serde` - Serialize scan and station records
//!
//! # Example
//!
//! ```ignore
//! use nlscan::{BssInfo, WifiScan};
//!
//! #[tokio::main]
//! async fn main() -> nlscan::Result<()> {
//!     let mut wifi = WifiScan::open("wlan0").await?;
//!
//!     let mut networks = vec![BssInfo::default(); 32];
//!     let seen = wifi.scan(&mut networks).await?;
//!     for bss in networks.iter().take(seen) {
//!         println!("{} {:>4} dBm {}", bss.bssid, bss.signal_dbm(), bss.ssid_lossy());
//!     }
//!
//!     if let Some(station) = wifi.station().await? {
//!         println!("connected to {} ({:?} dBm)", station.ssid_lossy(), station.signal_dbm);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! A connected network, when one is reported, is always the first slot.
//! `scan` returns how many networks the kernel reported, which can exceed
//! the number of slots.

pub mod netlink;
pub mod nl80211;
pub mod util;

pub use netlink::{Error, Result};
pub use nl80211::{
    BssInfo, BssStatus, DiagnosticSink, MacAddr, SessionBuilder, StationInfo, WifiScan,
};
pub use util::interface_exists;
