//! The 4-byte `genlmsghdr` that follows `nlmsghdr` in every generic netlink
//! message. For generic netlink, `nlmsg_type` holds the family id.

use std::mem;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::netlink::error::{Error, Result};

/// `struct genlmsghdr`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct GenlMsgHdr {
    /// Family-specific command.
    pub cmd: u8,
    pub version: u8,
    pub reserved: u16,
}

/// Bytes between `nlmsghdr` and the first attribute.
pub const GENL_HDRLEN: usize = mem::size_of::<GenlMsgHdr>();

impl GenlMsgHdr {
    pub const fn new(cmd: u8, version: u8) -> Self {
        Self {
            cmd,
            version,
            reserved: 0,
        }
    }

    /// Read the header from the start of a netlink payload. The payload
    /// need not be aligned.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from_prefix(data)
            .map(|(header, _)| header)
            .map_err(|_| Error::Truncated {
                expected: GENL_HDRLEN,
                actual: data.len(),
            })
    }

    /// Split a netlink payload into its GENL header and the attribute area.
    pub fn split(payload: &[u8]) -> Result<(Self, &[u8])> {
        let header = Self::from_bytes(payload)?;
        Ok((header, &payload[GENL_HDRLEN..]))
    }

    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genl_header_size() {
        assert_eq!(GENL_HDRLEN, 4);
    }

    #[test]
    fn test_genl_header_from_bytes() {
        let data = [0x22, 0x01, 0x00, 0x00, 0xaa]; // cmd=34, version=1
        let (hdr, rest) = GenlMsgHdr::split(&data).unwrap();
        assert_eq!(hdr.cmd, 34);
        assert_eq!(hdr.version, 1);
        assert_eq!(rest, &[0xaa]);
    }

    #[test]
    fn test_genl_header_from_bytes_too_short() {
        let data = [0x03, 0x01, 0x00];
        assert!(GenlMsgHdr::from_bytes(&data).is_err());
    }
}
