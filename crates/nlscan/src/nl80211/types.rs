//! Scan and station record types.

use std::borrow::Cow;
use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::netlink::Error;

/// Length of a BSSID / MAC address in bytes.
pub const ETH_ALEN: usize = 6;

/// A 6-byte hardware address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MacAddr(pub [u8; ETH_ALEN]);

impl MacAddr {
    /// The all-zero address, used when the kernel sent nothing usable.
    pub const ZERO: Self = Self([0; ETH_ALEN]);

    /// Raw address bytes.
    pub fn octets(&self) -> [u8; ETH_ALEN] {
        self.0
    }

    /// Check whether every byte is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == [0; ETH_ALEN]
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl From<[u8; ETH_ALEN]> for MacAddr {
    fn from(octets: [u8; ETH_ALEN]) -> Self {
        Self(octets)
    }
}

impl TryFrom<&[u8]> for MacAddr {
    type Error = Error;

    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        let octets: [u8; ETH_ALEN] = data.try_into().map_err(|_| {
            Error::InvalidAttribute(format!(
                "hardware address must be {} bytes, got {}",
                ETH_ALEN,
                data.len()
            ))
        })?;
        Ok(Self(octets))
    }
}

/// Raw SSIDs go out as text, with invalid UTF-8 replaced.
#[cfg(feature = "serde")]
fn serialize_ssid<S: serde::Serializer>(ssid: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(ssid))
}

#[cfg(feature = "serde")]
impl Serialize for MacAddr {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Association state of a BSS as reported in `NL80211_BSS_STATUS`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "snake_case"))]
pub enum BssStatus {
    /// No status attribute, not associated.
    #[default]
    None,
    Authenticated,
    Associated,
    IbssJoined,
    /// A value newer than this crate.
    Other(u32),
}

impl BssStatus {
    /// Map the kernel's `nl80211_bss_status` value.
    pub fn from_raw(value: u32) -> Self {
        match value {
            0 => Self::Authenticated,
            1 => Self::Associated,
            2 => Self::IbssJoined,
            other => Self::Other(other),
        }
    }

    /// Check whether the device is connected to this BSS.
    ///
    /// Authenticated-only does not count.
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Associated | Self::IbssJoined)
    }
}

impl fmt::Display for BssStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Authenticated => f.write_str("authenticated"),
            Self::Associated => f.write_str("associated"),
            Self::IbssJoined => f.write_str("ibss-joined"),
            Self::Other(v) => write!(f, "unknown({})", v),
        }
    }
}

/// One observed access point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BssInfo {
    /// Hardware address of the access point.
    pub bssid: MacAddr,
    /// Network name exactly as broadcast, at most 32 bytes. Not guaranteed
    /// to be UTF-8. Empty when hidden or undecodable.
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_ssid"))]
    pub ssid: Vec<u8>,
    /// Channel frequency in MHz.
    pub frequency: u32,
    /// Signal strength in mBm (1/100 dBm), as delivered by the kernel.
    pub signal_mbm: i32,
    /// Milliseconds since the BSS was last seen.
    pub seen_ms_ago: u32,
    /// Association state.
    pub status: BssStatus,
}

impl BssInfo {
    /// Signal strength in dBm.
    pub fn signal_dbm(&self) -> i32 {
        self.signal_mbm / 100
    }

    /// Check whether the device is associated with (or joined to) this BSS.
    pub fn is_connected(&self) -> bool {
        self.status.is_connected()
    }

    /// Network name for display.
    pub fn ssid_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.ssid)
    }
}

/// Link statistics for the access point the device is associated with.
///
/// Counters the kernel did not report are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct StationInfo {
    pub bssid: MacAddr,
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_ssid"))]
    pub ssid: Vec<u8>,
    pub status: BssStatus,
    /// Signal strength in dBm.
    pub signal_dbm: Option<i8>,
    pub rx_packets: Option<u32>,
    pub tx_packets: Option<u32>,
}

impl StationInfo {
    /// Network name for display.
    pub fn ssid_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.ssid)
    }
}
