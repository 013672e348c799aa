//! Declarative attribute validation.
//!
//! Every message handler describes the attributes it consumes with an
//! [`AttrPolicy`]: a static table of [`AttrRule`]s plus the highest tag the
//! table accepts. [`AttrPolicy::parse`] walks an attribute area, checks each
//! attribute that has a rule, and returns an [`AttrTable`] indexed by tag.
//!
//! - Tags above the policy's maximum are skipped.
//! - Tags without a rule are ignored, so kernels that add attributes keep working.
//! - A rule violation fails the whole parse; there is no partial acceptance.
//! - Duplicate tags: the last one on the wire wins.
//!
//! ```
//! use nlscan::netlink::validation::{AttrKind, AttrPolicy, AttrRule};
//!
//! static POLICY: AttrPolicy = AttrPolicy::new(
//!     "example",
//!     8,
//!     &[AttrRule::new(1, AttrKind::U32), AttrRule::exact(2, AttrKind::Binary, 6)],
//! );
//!
//! // nla_len=8, nla_type=1, payload=2412u32
//! let mut data = vec![8, 0, 1, 0];
//! data.extend_from_slice(&2412u32.to_ne_bytes());
//!
//! let table = POLICY.parse(&data).unwrap();
//! assert_eq!(table.u32(1).unwrap(), Some(2412));
//! assert!(table.get(2).is_none());
//! ```

use std::fmt;

use super::attr::{AttrIter, NLA_HDRLEN, get};
use super::error::{Error, Result};

/// Expected wire representation of an attribute payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    U8,
    U16,
    U32,
    U64,
    /// Non-empty string, terminator optional.
    String,
    /// Non-empty string whose last byte is NUL.
    NulString,
    /// Presence-only attribute with an empty payload.
    Flag,
    /// A nested attribute list (empty, or at least one attribute header).
    Nested,
    /// Opaque bytes.
    Binary,
}

impl AttrKind {
    /// Natural payload size for fixed-width kinds.
    pub const fn fixed_len(self) -> Option<usize> {
        match self {
            AttrKind::U8 => Some(1),
            AttrKind::U16 => Some(2),
            AttrKind::U32 => Some(4),
            AttrKind::U64 => Some(8),
            _ => None,
        }
    }
}

impl fmt::Display for AttrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttrKind::U8 => "u8",
            AttrKind::U16 => "u16",
            AttrKind::U32 => "u32",
            AttrKind::U64 => "u64",
            AttrKind::String => "string",
            AttrKind::NulString => "nul-string",
            AttrKind::Flag => "flag",
            AttrKind::Nested => "nested",
            AttrKind::Binary => "binary",
        };
        f.write_str(name)
    }
}

/// A single validation rule: tag, wire kind and optional exact length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrRule {
    /// Attribute tag the rule applies to.
    pub tag: u16,
    /// Expected wire kind.
    pub kind: AttrKind,
    /// Exact payload length, overriding the kind's natural size.
    pub len: Option<usize>,
}

impl AttrRule {
    /// Rule with the kind's natural length (or any length for variable kinds).
    pub const fn new(tag: u16, kind: AttrKind) -> Self {
        Self {
            tag,
            kind,
            len: None,
        }
    }

    /// Rule requiring an exact payload length.
    pub const fn exact(tag: u16, kind: AttrKind, len: usize) -> Self {
        Self {
            tag,
            kind,
            len: Some(len),
        }
    }

    /// Check a payload against this rule.
    pub fn check(&self, payload: &[u8]) -> std::result::Result<(), String> {
        let expected = self.len.or(self.kind.fixed_len()).unwrap_or(0);
        let len = payload.len();

        if len < expected {
            return Err(format!("{} payload too short ({} < {})", self.kind, len, expected));
        }

        match self.kind {
            AttrKind::Flag if len > 0 => {
                return Err(format!("flag carries {} payload bytes", len));
            }
            AttrKind::String | AttrKind::NulString if len == 0 => {
                return Err(format!("empty {}", self.kind));
            }
            AttrKind::NulString if payload[len - 1] != 0 => {
                return Err("string is not NUL-terminated".to_string());
            }
            AttrKind::Nested if len != 0 && len < NLA_HDRLEN => {
                return Err(format!("nested payload of {} bytes holds no attribute", len));
            }
            _ => {}
        }

        if expected != 0 && len > expected {
            return Err(format!("{} payload too long ({} > {})", self.kind, len, expected));
        }

        Ok(())
    }
}

/// A validation table for one message kind or nested attribute list.
#[derive(Debug)]
pub struct AttrPolicy {
    name: &'static str,
    max: u16,
    rules: &'static [AttrRule],
}

impl AttrPolicy {
    /// Create a policy accepting tags `0..=max`.
    pub const fn new(name: &'static str, max: u16, rules: &'static [AttrRule]) -> Self {
        Self { name, max, rules }
    }

    /// Name used in error messages.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Highest accepted tag.
    pub fn max(&self) -> u16 {
        self.max
    }

    /// Look up the rule for a tag.
    pub fn rule(&self, tag: u16) -> Option<&AttrRule> {
        self.rules.iter().find(|r| r.tag == tag)
    }

    /// Validate an attribute area and index it by tag.
    pub fn parse<'a>(&self, data: &'a [u8]) -> Result<AttrTable<'a>> {
        let mut table = AttrTable::with_max(self.max);

        for (tag, payload) in AttrIter::new(data) {
            if tag > self.max {
                tracing::trace!(policy = self.name, tag, "attribute above policy range");
                continue;
            }

            let Some(rule) = self.rule(tag) else {
                continue;
            };

            rule.check(payload).map_err(|reason| {
                Error::InvalidAttribute(format!("{}: attribute {}: {}", self.name, tag, reason))
            })?;

            table.slots[tag as usize] = Some(payload);
        }

        Ok(table)
    }
}

/// Validated attributes of one message, indexed by tag.
#[derive(Debug, Clone)]
pub struct AttrTable<'a> {
    slots: Vec<Option<&'a [u8]>>,
}

impl<'a> AttrTable<'a> {
    fn with_max(max: u16) -> Self {
        Self {
            slots: vec![None; max as usize + 1],
        }
    }

    /// Raw payload of a validated attribute.
    pub fn get(&self, tag: u16) -> Option<&'a [u8]> {
        self.slots.get(tag as usize).copied().flatten()
    }

    /// Check whether a tag was present and valid.
    pub fn contains(&self, tag: u16) -> bool {
        self.get(tag).is_some()
    }

    /// Number of stored attributes.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Check whether no attribute was stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn u8(&self, tag: u16) -> Result<Option<u8>> {
        self.get(tag).map(get::u8).transpose()
    }

    pub fn u16(&self, tag: u16) -> Result<Option<u16>> {
        self.get(tag).map(get::u16_ne).transpose()
    }

    pub fn u32(&self, tag: u16) -> Result<Option<u32>> {
        self.get(tag).map(get::u32_ne).transpose()
    }

    pub fn str(&self, tag: u16) -> Result<Option<&'a str>> {
        self.get(tag).map(get::string).transpose()
    }
}
