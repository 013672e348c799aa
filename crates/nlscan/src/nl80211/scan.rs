//! Scan-result decoding and placement.

use std::mem;

use crate::netlink::validation::{AttrKind, AttrPolicy, AttrRule};
use crate::netlink::{MessageBuilder, Result};
use crate::netlink::message::{NLM_F_ACK, NLM_F_DUMP, NLM_F_REQUEST};

use super::diag::DiagnosticSink;
use super::ie;
use super::types::{BssInfo, BssStatus, MacAddr};
use super::{NL80211_ATTR_MAX, NL80211_BSS_MAX, NL80211_GENL_VERSION, Nl80211Attr, Nl80211BssAttr, Nl80211Cmd};

/// Top-level attributes of a `NEW_SCAN_RESULTS` message.
pub static NEW_SCAN_RESULTS_POLICY: AttrPolicy = AttrPolicy::new(
    "nl80211 scan results",
    NL80211_ATTR_MAX,
    &[
        AttrRule::new(Nl80211Attr::Ifindex as u16, AttrKind::U32),
        AttrRule::new(Nl80211Attr::ScanSsids as u16, AttrKind::Nested),
        AttrRule::new(Nl80211Attr::Bss as u16, AttrKind::Nested),
    ],
);

/// Attributes nested in `NL80211_ATTR_BSS`.
///
/// The BSSID is accepted at any length here; [`decode_bss`] reports and
/// zeroes a BSSID that is not 6 bytes instead of failing the message.
pub static BSS_POLICY: AttrPolicy = AttrPolicy::new(
    "nl80211 bss",
    NL80211_BSS_MAX,
    &[
        AttrRule::new(Nl80211BssAttr::Bssid as u16, AttrKind::Binary),
        AttrRule::new(Nl80211BssAttr::Frequency as u16, AttrKind::U32),
        AttrRule::new(Nl80211BssAttr::InformationElements as u16, AttrKind::Binary),
        AttrRule::new(Nl80211BssAttr::Status as u16, AttrKind::U32),
        AttrRule::new(Nl80211BssAttr::SignalMbm as u16, AttrKind::U32),
        AttrRule::new(Nl80211BssAttr::SeenMsAgo as u16, AttrKind::U32),
    ],
);

/// `TRIGGER_SCAN` request for an interface.
pub fn trigger_scan_request(family_id: u16, ifindex: u32) -> MessageBuilder {
    let mut builder = MessageBuilder::genl(
        family_id,
        NLM_F_REQUEST | NLM_F_ACK,
        Nl80211Cmd::TriggerScan as u8,
        NL80211_GENL_VERSION,
    );
    builder.append_attr_u32(Nl80211Attr::Ifindex as u16, ifindex);
    builder
}

/// `GET_SCAN` dump request for an interface.
pub fn get_scan_request(family_id: u16, ifindex: u32) -> MessageBuilder {
    let mut builder = MessageBuilder::genl(
        family_id,
        NLM_F_REQUEST | NLM_F_DUMP | NLM_F_ACK,
        Nl80211Cmd::GetScan as u8,
        NL80211_GENL_VERSION,
    );
    builder.append_attr_u32(Nl80211Attr::Ifindex as u16, ifindex);
    builder
}

/// Bounded writer over a caller-owned slice of [`BssInfo`].
///
/// Records are written in delivery order. A connected record (associated or
/// IBSS-joined) always goes to slot 0; whatever held slot 0 moves to the
/// next free slot when there is one. Records that do not fit are still
/// counted, so [`seen`](Self::seen) is the number of networks the kernel
/// reported and may exceed the slice length.
#[derive(Debug)]
pub struct ScanCollector<'a> {
    slots: &'a mut [BssInfo],
    seen: usize,
}

impl<'a> ScanCollector<'a> {
    pub fn new(slots: &'a mut [BssInfo]) -> Self {
        Self { slots, seen: 0 }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Records seen so far, written or not.
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Records actually stored.
    pub fn written(&self) -> usize {
        self.seen.min(self.slots.len())
    }

    /// Place one record. Returns the slot it was written to, if any.
    pub fn push(&mut self, bss: BssInfo) -> Option<usize> {
        let capacity = self.slots.len();

        let index = if capacity == 0 {
            None
        } else if bss.is_connected() {
            if self.seen > 0 && self.seen < capacity {
                let previous = mem::take(&mut self.slots[0]);
                self.slots[self.seen] = previous;
            }
            Some(0)
        } else if self.seen < capacity {
            Some(self.seen)
        } else {
            None
        };

        if let Some(i) = index {
            self.slots[i] = bss;
        }
        self.seen += 1;

        index
    }
}

/// Decode one nested `NL80211_ATTR_BSS`.
///
/// Missing attributes leave their field at its default. A malformed BSSID or
/// SSID element is reported through `diag` and left empty.
pub fn decode_bss(data: &[u8], diag: &DiagnosticSink) -> Result<BssInfo> {
    let table = BSS_POLICY.parse(data)?;
    let mut bss = BssInfo::default();

    if let Some(raw) = table.get(Nl80211BssAttr::Bssid as u16) {
        match MacAddr::try_from(raw) {
            Ok(mac) => bss.bssid = mac,
            Err(_) => diag.emit(&format!(
                "BSSID length {} != {}, ignoring",
                raw.len(),
                super::types::ETH_ALEN
            )),
        }
    }

    if let Some(freq) = table.u32(Nl80211BssAttr::Frequency as u16)? {
        bss.frequency = freq;
    }

    if let Some(ies) = table.get(Nl80211BssAttr::InformationElements as u16) {
        match ie::parse_ssid(ies) {
            Some(ssid) => bss.ssid = ssid.to_vec(),
            None => diag.emit("information elements do not start with a valid SSID element"),
        }
    }

    if let Some(signal) = table.u32(Nl80211BssAttr::SignalMbm as u16)? {
        bss.signal_mbm = signal as i32;
    }

    if let Some(age) = table.u32(Nl80211BssAttr::SeenMsAgo as u16)? {
        bss.seen_ms_ago = age;
    }

    if let Some(status) = table.u32(Nl80211BssAttr::Status as u16)? {
        bss.status = BssStatus::from_raw(status);
    }

    Ok(bss)
}

/// Decode the attributes of one `NEW_SCAN_RESULTS` message into `collector`.
///
/// A message without a BSS attribute carries nothing and is not an error.
pub fn collect(attrs: &[u8], collector: &mut ScanCollector<'_>, diag: &DiagnosticSink) -> Result<()> {
    let table = NEW_SCAN_RESULTS_POLICY.parse(attrs)?;

    let Some(nested) = table.get(Nl80211Attr::Bss as u16) else {
        return Ok(());
    };

    let bss = decode_bss(nested, diag)?;
    let slot = collector.push(bss);
    tracing::trace!(?slot, seen = collector.seen(), "scan result");

    Ok(())
}
