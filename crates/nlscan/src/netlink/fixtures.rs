//! Scripted fake kernel for engine tests.
//!
//! [`FakeTransport`] records every request it is given and answers through a
//! responder closure. Replies land in an inbox that `recv`/`try_recv` drain
//! in order. Handles share the inbox, so one channel's responder can push
//! multicast notifications into another channel's inbox.
//!
//! Datagrams queued with [`FakeHandle::push_later`] are invisible to
//! `try_recv` and only delivered by `recv` once the inbox is empty: they model
//! events arriving after a non-blocking drain.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use super::attr::AttrIter;
use super::builder::MessageBuilder;
use super::error::{Error, Result};
use super::genl::{CTRL_VERSION, CtrlAttr, CtrlAttrMcastGrp, CtrlCmd, GENL_ID_CTRL, GenlMsgHdr};
use super::message::{MessageIter, NLM_F_MULTI, NlMsgHdr, NlMsgType};
use super::transport::Transport;
use crate::nl80211::{
    NL80211_GENL_VERSION, Nl80211Attr, Nl80211BssAttr, Nl80211Cmd, Nl80211StaInfo,
};

pub(crate) const FAMILY_ID: u16 = 0x1c;
pub(crate) const SCAN_GROUP: u32 = 5;
pub(crate) const IFINDEX: u32 = 3;

/// A request as the fake kernel saw it.
#[derive(Debug, Clone)]
pub(crate) struct Request {
    pub msg_type: u16,
    pub flags: u16,
    pub seq: u32,
    pub pid: u32,
    pub cmd: u8,
    pub attrs: Vec<u8>,
}

impl Request {
    fn parse(msg: &[u8]) -> Self {
        let (header, payload) = MessageIter::new(msg).next().unwrap().unwrap();
        let (genl, attrs) = GenlMsgHdr::split(payload).unwrap();
        Self {
            msg_type: header.nlmsg_type,
            flags: header.nlmsg_flags,
            seq: header.nlmsg_seq,
            pid: header.nlmsg_pid,
            cmd: genl.cmd,
            attrs: attrs.to_vec(),
        }
    }

    pub fn attr(&self, tag: u16) -> Option<Vec<u8>> {
        AttrIter::new(&self.attrs)
            .find(|(kind, _)| *kind == tag)
            .map(|(_, payload)| payload.to_vec())
    }
}

type Responder = Box<dyn FnMut(&Request) -> Vec<Vec<u8>> + Send>;

/// Shared view of a fake transport, usable after the transport moved.
#[derive(Clone, Default)]
pub(crate) struct FakeHandle {
    inbox: Arc<Mutex<VecDeque<Vec<u8>>>>,
    later: Arc<Mutex<VecDeque<Vec<u8>>>>,
    sent: Arc<Mutex<Vec<Request>>>,
    groups: Arc<Mutex<Vec<u32>>>,
}

impl FakeHandle {
    /// Queue a datagram for the transport's owner.
    pub fn push(&self, datagram: Vec<u8>) {
        self.inbox.lock().unwrap().push_back(datagram);
    }

    /// Queue a datagram that only a blocking receive will see.
    pub fn push_later(&self, datagram: Vec<u8>) {
        self.later.lock().unwrap().push_back(datagram);
    }

    pub fn pending(&self) -> usize {
        self.inbox.lock().unwrap().len() + self.later.lock().unwrap().len()
    }

    fn next_blocking(&self) -> Option<Vec<u8>> {
        let next = self.inbox.lock().unwrap().pop_front();
        next.or_else(|| self.later.lock().unwrap().pop_front())
    }

    pub fn sent(&self) -> Vec<Request> {
        self.sent.lock().unwrap().clone()
    }

    /// Generic netlink commands sent so far, in order.
    pub fn sent_cmds(&self) -> Vec<u8> {
        self.sent.lock().unwrap().iter().map(|r| r.cmd).collect()
    }

    pub fn groups(&self) -> Vec<u32> {
        self.groups.lock().unwrap().clone()
    }
}

pub(crate) struct FakeTransport {
    pid: u32,
    handle: FakeHandle,
    responder: Responder,
    fail_membership: bool,
    stall: bool,
}

impl FakeTransport {
    pub fn new<F>(pid: u32, responder: F) -> Self
    where
        F: FnMut(&Request) -> Vec<Vec<u8>> + Send + 'static,
    {
        Self {
            pid,
            handle: FakeHandle::default(),
            responder: Box::new(responder),
            fail_membership: false,
            stall: false,
        }
    }

    /// A transport that never answers.
    pub fn silent(pid: u32) -> Self {
        Self::new(pid, |_| Vec::new())
    }

    pub fn failing_membership(mut self) -> Self {
        self.fail_membership = true;
        self
    }

    /// Make `recv` wait forever once nothing is queued, instead of failing.
    pub fn stalling(mut self) -> Self {
        self.stall = true;
        self
    }

    pub fn handle(&self) -> FakeHandle {
        self.handle.clone()
    }
}

impl Transport for FakeTransport {
    fn port_id(&self) -> u32 {
        self.pid
    }

    async fn send(&mut self, msg: &[u8]) -> Result<()> {
        let request = Request::parse(msg);
        let replies = (self.responder)(&request);
        self.handle.sent.lock().unwrap().push(request);
        self.handle.inbox.lock().unwrap().extend(replies);
        Ok(())
    }

    async fn recv(&mut self) -> Result<Bytes> {
        match self.handle.next_blocking() {
            Some(datagram) => Ok(Bytes::from(datagram)),
            None if self.stall => std::future::pending().await,
            None => Err(Error::Io(io::Error::from(io::ErrorKind::UnexpectedEof))),
        }
    }

    fn try_recv(&mut self) -> Result<Option<Bytes>> {
        Ok(self.handle.inbox.lock().unwrap().pop_front().map(Bytes::from))
    }

    fn add_membership(&mut self, group: u32) -> Result<()> {
        if self.fail_membership {
            return Err(Error::Subscription {
                group,
                source: io::Error::from_raw_os_error(libc::EPERM),
            });
        }
        self.handle.groups.lock().unwrap().push(group);
        Ok(())
    }
}

/// Build a generic netlink message addressed to `seq`/`pid`.
pub(crate) fn genl_message(
    msg_type: u16,
    flags: u16,
    cmd: u8,
    seq: u32,
    pid: u32,
    attrs: impl FnOnce(&mut MessageBuilder),
) -> Vec<u8> {
    let mut builder = MessageBuilder::genl(msg_type, flags, cmd, NL80211_GENL_VERSION);
    builder.set_seq(seq);
    builder.set_pid(pid);
    attrs(&mut builder);
    builder.finish()
}

/// Concatenate several messages into one datagram.
pub(crate) fn datagram(msgs: &[Vec<u8>]) -> Vec<u8> {
    msgs.concat()
}

pub(crate) fn family_reply(seq: u32, pid: u32, family_id: u16, groups: &[(&str, u32)]) -> Vec<u8> {
    let mut builder =
        MessageBuilder::genl(GENL_ID_CTRL, 0, CtrlCmd::NewFamily as u8, CTRL_VERSION);
    builder.set_seq(seq);
    builder.set_pid(pid);
    builder.append_attr_str(CtrlAttr::FamilyName as u16, "nl80211");
    builder.append_attr_u16(CtrlAttr::FamilyId as u16, family_id);
    if !groups.is_empty() {
        let list = builder.nest_start(CtrlAttr::McastGroups as u16);
        for (i, (name, id)) in groups.iter().enumerate() {
            let entry = builder.nest_start(i as u16 + 1);
            builder.append_attr_u32(CtrlAttrMcastGrp::Id as u16, *id);
            builder.append_attr_str(CtrlAttrMcastGrp::Name as u16, name);
            builder.nest_end(entry);
        }
        builder.nest_end(list);
    }
    builder.finish()
}

/// `NLMSG_ERROR` with `errno` (0 for an ACK).
pub(crate) fn error_reply(seq: u32, pid: u32, errno: i32) -> Vec<u8> {
    let mut builder = MessageBuilder::new(NlMsgType::ERROR, 0);
    builder.set_seq(seq);
    builder.set_pid(pid);
    let mut payload = (-errno).to_ne_bytes().to_vec();
    let mut original = NlMsgHdr::new(0, 0);
    original.nlmsg_seq = seq;
    original.nlmsg_pid = pid;
    payload.extend_from_slice(original.as_bytes());
    builder.append_bytes(&payload);
    builder.finish()
}

pub(crate) fn ack(seq: u32, pid: u32) -> Vec<u8> {
    error_reply(seq, pid, 0)
}

pub(crate) fn done(seq: u32, pid: u32) -> Vec<u8> {
    let mut builder = MessageBuilder::new(NlMsgType::DONE, NLM_F_MULTI);
    builder.set_seq(seq);
    builder.set_pid(pid);
    builder.append_bytes(&0i32.to_ne_bytes());
    builder.finish()
}

/// Description of one BSS in a scan dump.
#[derive(Debug, Clone, Default)]
pub(crate) struct TestBss {
    pub bssid: Vec<u8>,
    pub ies: Option<Vec<u8>>,
    pub frequency: Option<u32>,
    pub signal_mbm: Option<i32>,
    pub seen_ms_ago: Option<u32>,
    pub status: Option<u32>,
}

impl TestBss {
    pub fn named(last_octet: u8, ssid: &str) -> Self {
        let mut ies = vec![0, ssid.len() as u8];
        ies.extend_from_slice(ssid.as_bytes());
        Self {
            bssid: vec![0x02, 0, 0, 0, 0, last_octet],
            ies: Some(ies),
            frequency: Some(2412),
            signal_mbm: Some(-5500),
            seen_ms_ago: Some(120),
            status: None,
        }
    }

    pub fn associated(mut self) -> Self {
        self.status = Some(1);
        self
    }

    pub fn append_to(&self, builder: &mut MessageBuilder) {
        let nest = builder.nest_start(Nl80211Attr::Bss as u16);
        builder.append_attr(Nl80211BssAttr::Bssid as u16, &self.bssid);
        if let Some(freq) = self.frequency {
            builder.append_attr_u32(Nl80211BssAttr::Frequency as u16, freq);
        }
        if let Some(ies) = &self.ies {
            builder.append_attr(Nl80211BssAttr::InformationElements as u16, ies);
        }
        if let Some(signal) = self.signal_mbm {
            builder.append_attr_u32(Nl80211BssAttr::SignalMbm as u16, signal as u32);
        }
        if let Some(age) = self.seen_ms_ago {
            builder.append_attr_u32(Nl80211BssAttr::SeenMsAgo as u16, age);
        }
        if let Some(status) = self.status {
            builder.append_attr_u32(Nl80211BssAttr::Status as u16, status);
        }
        builder.nest_end(nest);
    }
}

/// One `NEW_SCAN_RESULTS` dump entry.
pub(crate) fn scan_entry(seq: u32, pid: u32, bss: &TestBss) -> Vec<u8> {
    genl_message(
        FAMILY_ID,
        NLM_F_MULTI,
        Nl80211Cmd::NewScanResults as u8,
        seq,
        pid,
        |b| {
            b.append_attr_u32(Nl80211Attr::Ifindex as u16, IFINDEX);
            bss.append_to(b);
        },
    )
}

/// A complete scan dump: one datagram per entry, then `NLMSG_DONE`.
pub(crate) fn scan_dump(seq: u32, pid: u32, entries: &[TestBss]) -> Vec<Vec<u8>> {
    let mut out: Vec<_> = entries.iter().map(|bss| scan_entry(seq, pid, bss)).collect();
    out.push(done(seq, pid));
    out
}

/// A `NEW_STATION` reply followed by its ACK, in one datagram.
pub(crate) fn station_reply(
    seq: u32,
    pid: u32,
    signal: Option<i8>,
    rx_packets: Option<u32>,
    tx_packets: Option<u32>,
) -> Vec<u8> {
    let reply = genl_message(
        FAMILY_ID,
        0,
        Nl80211Cmd::NewStation as u8,
        seq,
        pid,
        |b| {
            b.append_attr_u32(Nl80211Attr::Ifindex as u16, IFINDEX);
            let nest = b.nest_start(Nl80211Attr::StaInfo as u16);
            if let Some(signal) = signal {
                b.append_attr_u8(Nl80211StaInfo::Signal as u16, signal as u8);
            }
            if let Some(rx) = rx_packets {
                b.append_attr_u32(Nl80211StaInfo::RxPackets as u16, rx);
            }
            if let Some(tx) = tx_packets {
                b.append_attr_u32(Nl80211StaInfo::TxPackets as u16, tx);
            }
            b.nest_end(nest);
        },
    );
    datagram(&[reply, ack(seq, pid)])
}

/// An unsolicited scan-group notification for `ifindex`.
pub(crate) fn notification(cmd: Nl80211Cmd, ifindex: u32) -> Vec<u8> {
    genl_message(FAMILY_ID, 0, cmd as u8, 0, 0, |b| {
        b.append_attr_u32(Nl80211Attr::Ifindex as u16, ifindex);
    })
}
