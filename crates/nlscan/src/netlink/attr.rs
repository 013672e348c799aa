//! Netlink attribute (nlattr) handling.

use super::error::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Netlink attribute alignment.
pub const NLA_ALIGNTO: usize = 4;

/// Align a length to NLA_ALIGNTO boundary.
#[inline]
pub const fn nla_align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// Size of the attribute header.
pub const NLA_HDRLEN: usize = 4; // nla_align(size_of::<NlAttr>())

/// Netlink attribute header (mirrors struct nlattr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlAttr {
    /// Length including header.
    pub nla_len: u16,
    /// Attribute type.
    pub nla_type: u16,
}

/// Set on attributes whose payload is itself a list of attributes.
pub const NLA_F_NESTED: u16 = 1 << 15;
/// Set on attributes whose payload is in network byte order.
pub const NLA_F_NET_BYTEORDER: u16 = 1 << 14;
/// Bits of `nla_type` that hold the attribute tag.
pub const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

impl NlAttr {
    /// Header for an attribute carrying `data_len` payload bytes.
    pub fn new(attr_type: u16, data_len: usize) -> Self {
        Self {
            nla_len: (NLA_HDRLEN + data_len) as u16,
            nla_type: attr_type,
        }
    }

    /// Attribute tag with the nested and byte-order flags masked off.
    pub fn kind(&self) -> u16 {
        self.nla_type & NLA_TYPE_MASK
    }

    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(data)
            .map(|(attr, _)| attr)
            .map_err(|_| Error::Truncated {
                expected: NLA_HDRLEN,
                actual: data.len(),
            })
    }
}

/// Iterator over the attributes packed in a buffer, yielding `(tag, payload)`.
///
/// Iteration stops at the first attribute whose header is truncated or whose
/// declared length runs past the end of the buffer.
pub struct AttrIter<'a> {
    data: &'a [u8],
}

impl<'a> AttrIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl<'a> Iterator for AttrIter<'a> {
    type Item = (u16, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let attr = NlAttr::from_bytes(self.data).ok()?;

        let len = usize::from(attr.nla_len);
        if !(NLA_HDRLEN..=self.data.len()).contains(&len) {
            self.data = &[];
            return None;
        }

        let payload = &self.data[NLA_HDRLEN..len];
        // the final attribute may omit its padding
        self.data = self.data.get(nla_align(len)..).unwrap_or_default();

        Some((attr.kind(), payload))
    }
}

/// Typed reads of attribute payloads. Integers are in host byte order.
pub mod get {
    use super::*;

    fn fixed<const N: usize>(data: &[u8], what: &str) -> Result<[u8; N]> {
        data.get(..N)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| Error::InvalidAttribute(format!("truncated {} attribute", what)))
    }

    pub fn u8(data: &[u8]) -> Result<u8> {
        fixed::<1>(data, "u8").map(|[b]| b)
    }

    pub fn u16_ne(data: &[u8]) -> Result<u16> {
        fixed(data, "u16").map(u16::from_ne_bytes)
    }

    pub fn u32_ne(data: &[u8]) -> Result<u32> {
        fixed(data, "u32").map(u32::from_ne_bytes)
    }

    /// String up to the first NUL, or the whole payload if there is none.
    pub fn string(data: &[u8]) -> Result<&str> {
        let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        std::str::from_utf8(&data[..end])
            .map_err(|e| Error::InvalidAttribute(format!("invalid UTF-8: {}", e)))
    }
}
