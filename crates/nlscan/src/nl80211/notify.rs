//! Scan notification state machine.
//!
//! Scan events arrive on the nl80211 "scan" multicast group. Another process
//! may already have triggered a scan, or its results may be waiting, so a scan
//! attempt first replays whatever is queued and only triggers when neither
//! event was seen.

use crate::netlink::genl::GenlMsgHdr;
use crate::netlink::validation::{AttrKind, AttrPolicy, AttrRule};
use crate::netlink::{MessageIter, NlMsgHdr, Result};

use super::{NL80211_ATTR_MAX, Nl80211Attr, Nl80211Cmd};

/// Attributes read from a scan-group notification.
pub static SCAN_NOTIFY_POLICY: AttrPolicy = AttrPolicy::new(
    "nl80211 scan notification",
    NL80211_ATTR_MAX,
    &[AttrRule::new(Nl80211Attr::Ifindex as u16, AttrKind::U32)],
);

/// Where a scan attempt stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// Nothing seen yet: a trigger is needed.
    Idle,
    /// A scan was triggered (by us or someone else) and has not completed.
    WaitingForDevice,
    /// The kernel announced fresh results.
    ResultsReady,
}

/// Flags collected from scan-group notifications during one scan attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanState {
    /// An unsolicited `NEW_SCAN_RESULTS` was seen.
    pub new_results_ready: bool,
    /// A `TRIGGER_SCAN` was seen and not followed by an abort.
    pub trigger_seen: bool,
    /// The last scan seen was aborted.
    pub aborted: bool,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ScanPhase {
        if self.new_results_ready {
            ScanPhase::ResultsReady
        } else if self.trigger_seen {
            ScanPhase::WaitingForDevice
        } else {
            ScanPhase::Idle
        }
    }

    /// Check whether a trigger must be sent for this attempt.
    pub fn needs_trigger(&self) -> bool {
        !(self.new_results_ready || self.trigger_seen)
    }

    /// Record that we triggered a scan ourselves.
    pub fn triggered(&mut self) {
        self.trigger_seen = true;
        self.aborted = false;
    }

    /// Feed one notification datagram through the state machine.
    ///
    /// Messages for other families or other interfaces are ignored. An
    /// invalid notification fails the whole datagram.
    pub fn observe(&mut self, data: &[u8], family_id: u16, ifindex: u32) -> Result<()> {
        for result in MessageIter::new(data) {
            let (header, payload) = result?;

            if header.nlmsg_type != family_id {
                tracing::trace!(msg_type = header.nlmsg_type, "non-nl80211 message on scan group");
                continue;
            }

            let (genl, attrs) = GenlMsgHdr::split(payload)?;
            let table = SCAN_NOTIFY_POLICY.parse(attrs)?;

            let index = table.u32(Nl80211Attr::Ifindex as u16)?;
            if index.is_some_and(|i| i != ifindex) {
                tracing::trace!(?index, cmd = genl.cmd, "scan event for another interface");
                continue;
            }

            self.apply(header, genl.cmd);
        }

        Ok(())
    }

    fn apply(&mut self, header: &NlMsgHdr, cmd: u8) {
        match Nl80211Cmd::from_u8(cmd) {
            Some(Nl80211Cmd::TriggerScan) => {
                self.trigger_seen = true;
                self.aborted = false;
            }
            // A reply to someone's GET_SCAN dump carries their seq/pid.
            Some(Nl80211Cmd::NewScanResults) if header.is_unsolicited() => {
                self.new_results_ready = true;
            }
            Some(Nl80211Cmd::ScanAborted) => {
                self.trigger_seen = false;
                self.aborted = true;
            }
            _ => {
                tracing::debug!(
                    msg_type = header.nlmsg_type,
                    seq = header.nlmsg_seq,
                    pid = header.nlmsg_pid,
                    cmd,
                    "ignoring generic netlink command"
                );
            }
        }
    }
}
