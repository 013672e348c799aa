//! Netlink request construction.

use super::attr::{NLA_F_NESTED, NlAttr, nla_align};
use super::genl::GenlMsgHdr;
use super::message::{NLMSG_HDRLEN, NlMsgHdr, nlmsg_align};

// Byte offsets of the nlmsghdr fields patched after construction.
const LEN_OFFSET: usize = 0;
const SEQ_OFFSET: usize = 8;
const PID_OFFSET: usize = 12;

/// Open nested attribute, closed by [`MessageBuilder::nest_end`].
#[derive(Debug, Clone, Copy)]
#[must_use = "a nested attribute must be closed with nest_end"]
pub struct NestToken {
    offset: usize,
}

/// Incrementally built netlink message.
///
/// The length field is only written by [`finish`](Self::finish). Sequence
/// number and port id can be patched at any point, which lets a request be
/// built before the channel that sends it assigns them.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    buf: Vec<u8>,
}

impl MessageBuilder {
    pub fn new(msg_type: u16, flags: u16) -> Self {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(NlMsgHdr::new(msg_type, flags).as_bytes());
        buf.resize(NLMSG_HDRLEN, 0);
        Self { buf }
    }

    /// Generic netlink request: `nlmsghdr` for `family_id`, then a
    /// `genlmsghdr` carrying `cmd` and `version`.
    pub fn genl(family_id: u16, flags: u16, cmd: u8, version: u8) -> Self {
        let mut builder = Self::new(family_id, flags);
        builder.append_bytes(GenlMsgHdr::new(cmd, version).as_bytes());
        builder
    }

    /// Append raw payload, padded to the message alignment.
    pub fn append_bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
        self.buf.resize(nlmsg_align(self.buf.len()), 0);
    }

    pub fn append_attr(&mut self, attr_type: u16, data: &[u8]) {
        self.buf.extend_from_slice(NlAttr::new(attr_type, data.len()).as_bytes());
        self.buf.extend_from_slice(data);
        self.pad_attr();
    }

    pub fn append_attr_u8(&mut self, attr_type: u16, value: u8) {
        self.append_attr(attr_type, &[value]);
    }

    pub fn append_attr_u16(&mut self, attr_type: u16, value: u16) {
        self.append_attr(attr_type, &value.to_ne_bytes());
    }

    pub fn append_attr_u32(&mut self, attr_type: u16, value: u32) {
        self.append_attr(attr_type, &value.to_ne_bytes());
    }

    /// NUL-terminated string attribute.
    pub fn append_attr_str(&mut self, attr_type: u16, value: &str) {
        self.buf.extend_from_slice(NlAttr::new(attr_type, value.len() + 1).as_bytes());
        self.buf.extend_from_slice(value.as_bytes());
        self.buf.push(0);
        self.pad_attr();
    }

    pub fn nest_start(&mut self, attr_type: u16) -> NestToken {
        let offset = self.buf.len();
        self.buf.extend_from_slice(NlAttr::new(attr_type | NLA_F_NESTED, 0).as_bytes());
        NestToken { offset }
    }

    /// Close a nested attribute: its length covers everything appended since
    /// the matching [`nest_start`](Self::nest_start).
    pub fn nest_end(&mut self, token: NestToken) {
        let len = (self.buf.len() - token.offset) as u16;
        self.buf[token.offset..token.offset + 2].copy_from_slice(&len.to_ne_bytes());
        self.pad_attr();
    }

    pub fn set_seq(&mut self, seq: u32) {
        self.patch_u32(SEQ_OFFSET, seq);
    }

    pub fn set_pid(&mut self, pid: u32) {
        self.patch_u32(PID_OFFSET, pid);
    }

    /// Write the final length and hand out the bytes.
    pub fn finish(mut self) -> Vec<u8> {
        let len = self.buf.len() as u32;
        self.patch_u32(LEN_OFFSET, len);
        self.buf
    }

    fn pad_attr(&mut self) {
        self.buf.resize(nla_align(self.buf.len()), 0);
    }

    fn patch_u32(&mut self, offset: usize, value: u32) {
        self.buf[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
    }
}
