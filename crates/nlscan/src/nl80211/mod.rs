//! Wireless scanning via the nl80211 Generic Netlink family.
//!
//! A [`WifiScan`] session owns two generic netlink channels for one
//! interface: one subscribed to the nl80211 "scan" multicast group, one used
//! for request/response commands. A scan drains stale notifications, triggers
//! a scan only when nobody else already has, waits for the kernel to announce
//! new results and then dumps them.
//!
//! # Example
//!
//! ```rust,no_run
//! use nlscan::nl80211::{BssInfo, WifiScan};
//!
//! # async fn example() -> nlscan::Result<()> {
//! let mut wifi = WifiScan::open("wlan0").await?;
//!
//! let mut networks = vec![BssInfo::default(); 16];
//! let seen = wifi.scan(&mut networks).await?;
//! for bss in networks.iter().take(seen) {
//!     println!("{} {} {} MHz {} dBm", bss.bssid, bss.ssid_lossy(), bss.frequency, bss.signal_dbm());
//! }
//!
//! if let Some(station) = wifi.station().await? {
//!     println!("connected to {} ({:?} dBm)", station.ssid_lossy(), station.signal_dbm);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The value returned by [`WifiScan::scan`] counts every network the kernel
//! reported, which may exceed the number of slots written.

mod channel;
mod diag;
pub mod ie;
mod notify;
pub mod scan;
mod session;
pub mod station;
mod types;

pub use diag::DiagnosticSink;
pub use notify::{ScanPhase, ScanState};
pub use scan::ScanCollector;
pub use session::{SessionBuilder, WifiScan};
pub use types::{BssInfo, BssStatus, MacAddr, StationInfo};

/// nl80211 Generic Netlink family name.
pub const NL80211_GENL_NAME: &str = "nl80211";

/// Multicast group carrying scan trigger and completion events.
pub const NL80211_MULTICAST_GROUP_SCAN: &str = "scan";

/// Version written into every nl80211 request header.
pub const NL80211_GENL_VERSION: u8 = 1;

/// nl80211 commands used by the scanner.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl80211Cmd {
    GetStation = 17,
    NewStation = 19,
    GetScan = 32,
    TriggerScan = 33,
    NewScanResults = 34,
    ScanAborted = 35,
}

impl Nl80211Cmd {
    /// Map a raw generic netlink command byte.
    pub fn from_u8(cmd: u8) -> Option<Self> {
        match cmd {
            17 => Some(Self::GetStation),
            19 => Some(Self::NewStation),
            32 => Some(Self::GetScan),
            33 => Some(Self::TriggerScan),
            34 => Some(Self::NewScanResults),
            35 => Some(Self::ScanAborted),
            _ => None,
        }
    }
}

/// Top-level nl80211 attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl80211Attr {
    Unspec = 0,
    Wiphy = 1,
    WiphyName = 2,
    Ifindex = 3,
    Ifname = 4,
    Iftype = 5,
    Mac = 6,
    StaInfo = 21,
    ScanSsids = 45,
    Bss = 47,
}

/// Highest top-level attribute the scanner consumes.
pub const NL80211_ATTR_MAX: u16 = Nl80211Attr::Bss as u16;

/// Attributes nested in `NL80211_ATTR_BSS`.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl80211BssAttr {
    Invalid = 0,
    Bssid = 1,
    Frequency = 2,
    Tsf = 3,
    BeaconInterval = 4,
    Capability = 5,
    InformationElements = 6,
    SignalMbm = 7,
    SignalUnspec = 8,
    Status = 9,
    SeenMsAgo = 10,
}

/// Highest BSS attribute the scanner consumes.
pub const NL80211_BSS_MAX: u16 = Nl80211BssAttr::SeenMsAgo as u16;

/// Attributes nested in `NL80211_ATTR_STA_INFO`.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl80211StaInfo {
    Invalid = 0,
    InactiveTime = 1,
    RxBytes = 2,
    TxBytes = 3,
    Llid = 4,
    Plid = 5,
    PlinkState = 6,
    Signal = 7,
    TxBitrate = 8,
    RxPackets = 9,
    TxPackets = 10,
}

/// Highest station-info attribute the scanner consumes.
pub const NL80211_STA_INFO_MAX: u16 = Nl80211StaInfo::TxPackets as u16;
