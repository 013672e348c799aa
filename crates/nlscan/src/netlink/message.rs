//! Netlink message header and parsing.

use super::error::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

pub const NLMSG_ALIGNTO: usize = 4;

/// Round `len` up to the 4-byte message boundary.
#[inline]
pub const fn nlmsg_align(len: usize) -> usize {
    (len + NLMSG_ALIGNTO - 1) & !(NLMSG_ALIGNTO - 1)
}

/// Size of `struct nlmsghdr` on the wire.
pub const NLMSG_HDRLEN: usize = nlmsg_align(std::mem::size_of::<NlMsgHdr>());

/// `struct nlmsghdr`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlMsgHdr {
    /// Length of the message including this header.
    pub nlmsg_len: u32,
    /// Control type or generic netlink family id.
    pub nlmsg_type: u16,
    pub nlmsg_flags: u16,
    pub nlmsg_seq: u32,
    /// Port id of the sender, or the addressee for kernel replies.
    pub nlmsg_pid: u32,
}

impl NlMsgHdr {
    /// Header-only message of `msg_type`, sequence and port id left at zero.
    pub fn new(msg_type: u16, flags: u16) -> Self {
        Self {
            nlmsg_len: NLMSG_HDRLEN as u32,
            nlmsg_type: msg_type,
            nlmsg_flags: flags,
            ..Self::default()
        }
    }

    pub fn is_done(&self) -> bool {
        self.nlmsg_type == NlMsgType::DONE
    }

    /// Multicast notifications carry neither a sequence number nor a port id.
    pub fn is_unsolicited(&self) -> bool {
        self.nlmsg_seq == 0 && self.nlmsg_pid == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(data)
            .map(|(header, _)| header)
            .map_err(|_| Error::Truncated {
                expected: NLMSG_HDRLEN,
                actual: data.len(),
            })
    }
}

/// Control message types shared by every netlink protocol.
pub struct NlMsgType;

impl NlMsgType {
    /// Discard.
    pub const NOOP: u16 = 1;
    /// Error report, or an ACK when the code is zero.
    pub const ERROR: u16 = 2;
    /// End of a dump.
    pub const DONE: u16 = 3;
    /// The kernel dropped data.
    pub const OVERRUN: u16 = 4;
}

pub const NLM_F_REQUEST: u16 = 0x01;
pub const NLM_F_MULTI: u16 = 0x02;
pub const NLM_F_ACK: u16 = 0x04;
pub const NLM_F_ROOT: u16 = 0x100;
pub const NLM_F_MATCH: u16 = 0x200;
/// Return every object instead of one.
pub const NLM_F_DUMP: u16 = NLM_F_ROOT | NLM_F_MATCH;

/// Iterator over the messages batched in one datagram.
///
/// A length field that is too short or runs past the datagram yields one
/// error and ends the iteration.
pub struct MessageIter<'a> {
    data: &'a [u8],
}

impl<'a> MessageIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl<'a> Iterator for MessageIter<'a> {
    type Item = Result<(&'a NlMsgHdr, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.len() < NLMSG_HDRLEN {
            return None;
        }

        let header = match NlMsgHdr::from_bytes(self.data) {
            Ok(header) => header,
            Err(e) => return Some(Err(e)),
        };

        let len = header.nlmsg_len as usize;
        if !(NLMSG_HDRLEN..=self.data.len()).contains(&len) {
            self.data = &[];
            return Some(Err(Error::InvalidMessage(format!(
                "message length {} does not fit the datagram",
                len
            ))));
        }

        let payload = &self.data[NLMSG_HDRLEN..len];
        self.data = self.data.get(nlmsg_align(len)..).unwrap_or_default();

        Some(Ok((header, payload)))
    }
}

/// Payload of an `NLMSG_ERROR` message.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout)]
pub struct NlMsgError {
    /// Negative errno, or zero for an ACK.
    pub error: i32,
    /// Header of the request being answered.
    pub msg: NlMsgHdr,
}

impl NlMsgError {
    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(data)
            .map(|(err, _)| err)
            .map_err(|_| Error::Truncated {
                expected: std::mem::size_of::<Self>(),
                actual: data.len(),
            })
    }

    pub fn is_ack(&self) -> bool {
        self.error == 0
    }
}
