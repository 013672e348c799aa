//! Station statistics for the associated access point.

use crate::netlink::message::{NLM_F_ACK, NLM_F_REQUEST};
use crate::netlink::validation::{AttrKind, AttrPolicy, AttrRule};
use crate::netlink::{MessageBuilder, Result};

use super::types::{MacAddr, StationInfo};
use super::{
    NL80211_ATTR_MAX, NL80211_GENL_VERSION, NL80211_STA_INFO_MAX, Nl80211Attr, Nl80211Cmd,
    Nl80211StaInfo,
};

/// Top-level attributes of a `NEW_STATION` reply.
pub static NEW_STATION_POLICY: AttrPolicy = AttrPolicy::new(
    "nl80211 station",
    NL80211_ATTR_MAX,
    &[AttrRule::new(Nl80211Attr::StaInfo as u16, AttrKind::Nested)],
);

/// Attributes nested in `NL80211_ATTR_STA_INFO`.
pub static STA_INFO_POLICY: AttrPolicy = AttrPolicy::new(
    "nl80211 sta info",
    NL80211_STA_INFO_MAX,
    &[
        AttrRule::new(Nl80211StaInfo::Signal as u16, AttrKind::U8),
        AttrRule::new(Nl80211StaInfo::RxPackets as u16, AttrKind::U32),
        AttrRule::new(Nl80211StaInfo::TxPackets as u16, AttrKind::U32),
    ],
);

/// `GET_STATION` request for one peer of an interface.
pub fn get_station_request(family_id: u16, ifindex: u32, mac: MacAddr) -> MessageBuilder {
    let mut builder = MessageBuilder::genl(
        family_id,
        NLM_F_REQUEST | NLM_F_ACK,
        Nl80211Cmd::GetStation as u8,
        NL80211_GENL_VERSION,
    );
    builder.append_attr_u32(Nl80211Attr::Ifindex as u16, ifindex);
    builder.append_attr(Nl80211Attr::Mac as u16, &mac.octets());
    builder
}

/// Decode a `NEW_STATION` reply into `station`.
///
/// Only attributes present in the reply are written; everything else keeps
/// whatever `station` already held.
pub fn decode_station(attrs: &[u8], station: &mut StationInfo) -> Result<()> {
    let table = NEW_STATION_POLICY.parse(attrs)?;

    let Some(nested) = table.get(Nl80211Attr::StaInfo as u16) else {
        return Ok(());
    };
    let info = STA_INFO_POLICY.parse(nested)?;

    if let Some(signal) = info.u8(Nl80211StaInfo::Signal as u16)? {
        station.signal_dbm = Some(signal as i8);
    }
    if let Some(rx) = info.u32(Nl80211StaInfo::RxPackets as u16)? {
        station.rx_packets = Some(rx);
    }
    if let Some(tx) = info.u32(Nl80211StaInfo::TxPackets as u16)? {
        station.tx_packets = Some(tx);
    }

    Ok(())
}
