//! One generic netlink channel: a transport plus request/response bookkeeping.

use crate::netlink::genl::{FamilyInfo, GenlMsgHdr, family_request};
use crate::netlink::message::NlMsgError;
use crate::netlink::{Error, MessageBuilder, MessageIter, NlMsgHdr, NlMsgType, Result, Transport};

use super::diag::DiagnosticSink;
use super::notify::ScanState;
use super::scan::{self, ScanCollector};
use super::station;
use super::types::{MacAddr, StationInfo};
use super::{NL80211_GENL_NAME, Nl80211Cmd};

/// What the reply stream of one exchange is decoded into.
pub(crate) enum Reply<'r, 'buf> {
    Family(&'r mut Option<FamilyInfo>),
    ScanResults(&'r mut ScanCollector<'buf>),
    Station(&'r mut StationInfo),
    /// Only an acknowledgement is expected.
    Ack,
}

impl Reply<'_, '_> {
    fn handle(
        &mut self,
        header: &NlMsgHdr,
        payload: &[u8],
        diag: &DiagnosticSink,
    ) -> Result<()> {
        let (genl, attrs) = GenlMsgHdr::split(payload)?;

        match (self, Nl80211Cmd::from_u8(genl.cmd)) {
            (Reply::Family(slot), _) => {
                **slot = Some(FamilyInfo::from_payload(payload)?);
            }
            (Reply::ScanResults(collector), Some(Nl80211Cmd::NewScanResults)) => {
                scan::collect(attrs, collector, diag)?;
            }
            (Reply::Station(info), Some(Nl80211Cmd::NewStation)) => {
                station::decode_station(attrs, info)?;
            }
            _ => {
                tracing::debug!(
                    msg_type = header.nlmsg_type,
                    seq = header.nlmsg_seq,
                    pid = header.nlmsg_pid,
                    cmd = genl.cmd,
                    "ignoring generic netlink command"
                );
            }
        }

        Ok(())
    }
}

/// A generic netlink channel bound to one interface.
pub(crate) struct Channel<T> {
    transport: T,
    family_id: u16,
    ifindex: u32,
    seq: u32,
    diag: DiagnosticSink,
}

impl<T: Transport> Channel<T> {
    pub(crate) fn new(transport: T, ifindex: u32, diag: DiagnosticSink) -> Self {
        Self {
            transport,
            family_id: 0,
            ifindex,
            seq: 1,
            diag,
        }
    }

    pub(crate) fn family_id(&self) -> u16 {
        self.family_id
    }

    pub(crate) fn set_family_id(&mut self, id: u16) {
        self.family_id = id;
    }

    pub(crate) fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Send one request and decode its replies until ACK, error or DONE.
    ///
    /// The sequence number advances once per exchange, whether it succeeded
    /// or not. Messages that do not carry this exchange's sequence number
    /// and our port id are skipped.
    pub(crate) async fn exchange(
        &mut self,
        mut request: MessageBuilder,
        operation: &str,
        mut reply: Reply<'_, '_>,
    ) -> Result<()> {
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);

        let pid = self.transport.port_id();
        request.set_seq(seq);
        request.set_pid(pid);
        let msg = request.finish();

        tracing::trace!(seq, len = msg.len(), operation, "sending request");
        self.transport.send(&msg).await?;

        loop {
            let data = self.transport.recv().await?;

            for result in MessageIter::new(&data) {
                let (header, payload) = result?;

                if header.nlmsg_seq != seq || header.nlmsg_pid != pid {
                    tracing::trace!(
                        seq = header.nlmsg_seq,
                        pid = header.nlmsg_pid,
                        expected_seq = seq,
                        "skipping message from another exchange"
                    );
                    continue;
                }

                match header.nlmsg_type {
                    NlMsgType::ERROR => {
                        let err = NlMsgError::from_bytes(payload)?;
                        if err.is_ack() {
                            return Ok(());
                        }
                        return Err(Error::from_errno(err.error).with_context(operation));
                    }
                    NlMsgType::DONE => return Ok(()),
                    NlMsgType::NOOP => continue,
                    NlMsgType::OVERRUN => {
                        return Err(Error::InvalidMessage(format!(
                            "{}: receive buffer overrun",
                            operation
                        )));
                    }
                    _ => reply.handle(header, payload, &self.diag)?,
                }
            }
        }
    }

    /// Resolve the nl80211 family id and multicast groups.
    pub(crate) async fn resolve_family(&mut self) -> Result<FamilyInfo> {
        let mut info = None;
        let result = self
            .exchange(
                family_request(NL80211_GENL_NAME),
                "resolving nl80211",
                Reply::Family(&mut info),
            )
            .await;

        match (result, info) {
            (Ok(()), Some(info)) => {
                self.family_id = info.id;
                tracing::debug!(
                    family_id = info.id,
                    groups = info.mcast_groups.len(),
                    "resolved nl80211"
                );
                Ok(info)
            }
            (Err(e), _) if e.is_io() => Err(e),
            (Err(e), _) => {
                tracing::debug!(error = %e, "nl80211 family reply unusable");
                Err(Error::FamilyNotFound {
                    name: NL80211_GENL_NAME.to_string(),
                })
            }
            (Ok(()), None) => Err(Error::FamilyNotFound {
                name: NL80211_GENL_NAME.to_string(),
            }),
        }
    }

    /// Ask the device to start scanning.
    ///
    /// A kernel `EBUSY` becomes [`Error::DeviceBusy`].
    pub(crate) async fn trigger_scan(&mut self) -> Result<()> {
        let request = scan::trigger_scan_request(self.family_id, self.ifindex);
        let operation = format!("triggering scan on ifindex {}", self.ifindex);

        self.exchange(request, &operation, Reply::Ack)
            .await
            .map_err(|e| match e.errno() {
                Some(libc::EBUSY) => Error::DeviceBusy,
                _ => e,
            })
    }

    /// Dump the kernel's scan results into `collector`.
    pub(crate) async fn get_scan(&mut self, collector: &mut ScanCollector<'_>) -> Result<()> {
        let request = scan::get_scan_request(self.family_id, self.ifindex);
        let operation = format!("reading scan results on ifindex {}", self.ifindex);
        self.exchange(request, &operation, Reply::ScanResults(&mut *collector))
            .await?;
        tracing::debug!(seen = collector.seen(), written = collector.written(), "scan dump complete");
        Ok(())
    }

    /// Query station statistics for `mac`.
    pub(crate) async fn get_station(&mut self, mac: MacAddr, info: &mut StationInfo) -> Result<()> {
        let request = station::get_station_request(self.family_id, self.ifindex, mac);
        let operation = format!("querying station {}", mac);
        self.exchange(request, &operation, Reply::Station(info)).await
    }

    /// Replay every queued notification without waiting.
    pub(crate) fn drain_notifications(&mut self, state: &mut ScanState) -> Result<usize> {
        let mut datagrams = 0;
        while let Some(data) = self.transport.try_recv()? {
            state.observe(&data, self.family_id, self.ifindex)?;
            datagrams += 1;
        }
        tracing::trace!(datagrams, ?state, "drained scan notifications");
        Ok(datagrams)
    }

    /// Block until the kernel announces new results.
    ///
    /// Ends with [`Error::ScanAborted`] if the scan is aborted first.
    pub(crate) async fn wait_for_results(&mut self, state: &mut ScanState) -> Result<()> {
        loop {
            if state.new_results_ready {
                return Ok(());
            }
            if state.aborted {
                return Err(Error::ScanAborted);
            }
            let data = self.transport.recv().await?;
            state.observe(&data, self.family_id, self.ifindex)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::fixtures::{
        self, FAMILY_ID, FakeTransport, IFINDEX, SCAN_GROUP, TestBss, ack, datagram, done,
        error_reply, family_reply, notification, scan_dump, scan_entry,
    };
    use crate::nl80211::BssInfo;

    const PID: u32 = 4321;

    fn channel(transport: FakeTransport) -> Channel<FakeTransport> {
        let mut channel = Channel::new(transport, IFINDEX, DiagnosticSink::Silent);
        channel.set_family_id(FAMILY_ID);
        channel
    }

    #[tokio::test]
    async fn test_resolve_family() {
        let transport = FakeTransport::new(PID, |req| {
            vec![datagram(&[
                family_reply(req.seq, req.pid, FAMILY_ID, &[("config", 4), ("scan", SCAN_GROUP)]),
                ack(req.seq, req.pid),
            ])]
        });
        let handle = transport.handle();
        let mut channel = Channel::new(transport, IFINDEX, DiagnosticSink::Silent);

        let info = channel.resolve_family().await.unwrap();
        assert_eq!(info.id, FAMILY_ID);
        assert_eq!(info.mcast_group("scan"), Some(SCAN_GROUP));
        assert_eq!(channel.family_id(), FAMILY_ID);

        let sent = handle.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].seq, 1);
        assert_eq!(sent[0].pid, PID);
    }

    #[tokio::test]
    async fn test_resolve_family_missing() {
        let transport = FakeTransport::new(PID, |req| vec![error_reply(req.seq, req.pid, libc::ENOENT)]);
        let mut channel = Channel::new(transport, IFINDEX, DiagnosticSink::Silent);

        let err = channel.resolve_family().await.unwrap_err();
        assert!(matches!(err, Error::FamilyNotFound { .. }));
    }

    #[tokio::test]
    async fn test_sequence_advances_per_exchange() {
        let transport = FakeTransport::new(PID, |req| match req.seq {
            1 => vec![error_reply(req.seq, req.pid, libc::EINVAL)],
            _ => vec![ack(req.seq, req.pid)],
        });
        let handle = transport.handle();
        let mut channel = channel(transport);

        assert!(channel.trigger_scan().await.is_err());
        channel.trigger_scan().await.unwrap();

        let seqs: Vec<_> = handle.sent().iter().map(|r| r.seq).collect();
        assert_eq!(seqs, [1, 2]);
    }

    #[tokio::test]
    async fn test_trigger_busy() {
        let transport = FakeTransport::new(PID, |req| vec![error_reply(req.seq, req.pid, libc::EBUSY)]);
        let mut channel = channel(transport);

        let err = channel.trigger_scan().await.unwrap_err();
        assert!(matches!(err, Error::DeviceBusy));
        assert!(err.is_busy());
    }

    #[tokio::test]
    async fn test_trigger_other_error_keeps_context() {
        let transport = FakeTransport::new(PID, |req| vec![error_reply(req.seq, req.pid, libc::ENETDOWN)]);
        let mut channel = channel(transport);

        let err = channel.trigger_scan().await.unwrap_err();
        assert_eq!(err.errno(), Some(libc::ENETDOWN));
        assert!(err.to_string().contains("triggering scan on ifindex 3"));
    }

    #[tokio::test]
    async fn test_get_scan_collects_dump() {
        let transport = FakeTransport::new(PID, |req| {
            scan_dump(
                req.seq,
                req.pid,
                &[TestBss::named(1, "a"), TestBss::named(2, "b").associated()],
            )
        });
        let mut channel = channel(transport);

        let mut slots = vec![BssInfo::default(); 4];
        let mut collector = ScanCollector::new(&mut slots);
        channel.get_scan(&mut collector).await.unwrap();
        assert_eq!(collector.seen(), 2);
        assert_eq!(slots[0].ssid, b"b");
        assert_eq!(slots[1].ssid, b"a");
    }

    #[tokio::test]
    async fn test_stale_replies_skipped() {
        let transport = FakeTransport::new(PID, |req| {
            vec![datagram(&[
                // left over from an earlier exchange
                scan_entry(req.seq - 1, req.pid, &TestBss::named(9, "stale")),
                // addressed to a different socket
                scan_entry(req.seq, req.pid + 1, &TestBss::named(8, "other")),
                scan_entry(req.seq, req.pid, &TestBss::named(1, "fresh")),
                done(req.seq, req.pid),
            ])]
        });
        let mut channel = channel(transport);
        channel.seq = 5;

        let mut slots = vec![BssInfo::default(); 4];
        let mut collector = ScanCollector::new(&mut slots);
        channel.get_scan(&mut collector).await.unwrap();
        assert_eq!(collector.seen(), 1);
        assert_eq!(slots[0].ssid, b"fresh");
    }

    #[tokio::test]
    async fn test_recv_failure_aborts_exchange() {
        let mut channel = channel(FakeTransport::silent(PID));
        let mut slots = vec![BssInfo::default(); 1];
        let mut collector = ScanCollector::new(&mut slots);

        let err = channel.get_scan(&mut collector).await.unwrap_err();
        assert!(err.is_io());
    }

    #[tokio::test]
    async fn test_get_station() {
        let transport = FakeTransport::new(PID, |req| {
            assert!(req.attr(crate::nl80211::Nl80211Attr::Mac as u16).is_some());
            vec![fixtures::station_reply(req.seq, req.pid, Some(-48), Some(10), Some(20))]
        });
        let mut channel = channel(transport);

        let mut info = StationInfo::default();
        channel.get_station(MacAddr([2, 0, 0, 0, 0, 1]), &mut info).await.unwrap();
        assert_eq!(info.signal_dbm, Some(-48));
        assert_eq!(info.rx_packets, Some(10));
        assert_eq!(info.tx_packets, Some(20));
    }

    #[tokio::test]
    async fn test_drain_and_wait() {
        let transport = FakeTransport::silent(PID);
        let handle = transport.handle();
        handle.push(notification(Nl80211Cmd::TriggerScan, IFINDEX));
        let mut channel = channel(transport);

        let mut state = ScanState::new();
        assert_eq!(channel.drain_notifications(&mut state).unwrap(), 1);
        assert!(state.trigger_seen);
        assert_eq!(channel.drain_notifications(&mut state).unwrap(), 0);

        handle.push(notification(Nl80211Cmd::NewScanResults, IFINDEX));
        channel.wait_for_results(&mut state).await.unwrap();
        assert!(state.new_results_ready);
    }

    #[tokio::test]
    async fn test_wait_ends_on_abort() {
        let transport = FakeTransport::silent(PID);
        let handle = transport.handle();
        let mut channel = channel(transport);

        let mut state = ScanState::new();
        state.triggered();
        handle.push(notification(Nl80211Cmd::ScanAborted, IFINDEX));

        let err = channel.wait_for_results(&mut state).await.unwrap_err();
        assert!(matches!(err, Error::ScanAborted));
    }
}
