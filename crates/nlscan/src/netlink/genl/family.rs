//! Family and multicast-group resolution through the control family.

use std::collections::HashMap;

use super::header::GenlMsgHdr;
use super::{
    CTRL_ATTR_MAX, CTRL_ATTR_MCAST_GRP_MAX, CTRL_VERSION, CtrlAttr, CtrlAttrMcastGrp, CtrlCmd,
    GENL_ID_CTRL,
};
use crate::netlink::attr::AttrIter;
use crate::netlink::builder::MessageBuilder;
use crate::netlink::error::{Error, Result};
use crate::netlink::message::{NLM_F_ACK, NLM_F_REQUEST};
use crate::netlink::validation::{AttrKind, AttrPolicy, AttrRule};

/// Attributes consumed from a `CTRL_CMD_GETFAMILY` reply.
pub static CTRL_POLICY: AttrPolicy = AttrPolicy::new(
    "ctrl",
    CTRL_ATTR_MAX,
    &[
        AttrRule::new(CtrlAttr::FamilyId as u16, AttrKind::U16),
        AttrRule::new(CtrlAttr::McastGroups as u16, AttrKind::Nested),
    ],
);

/// Attributes of one entry in `CTRL_ATTR_MCAST_GROUPS`.
pub static MCAST_GRP_POLICY: AttrPolicy = AttrPolicy::new(
    "ctrl mcast group",
    CTRL_ATTR_MCAST_GRP_MAX,
    &[
        AttrRule::new(CtrlAttrMcastGrp::Id as u16, AttrKind::U32),
        AttrRule::new(CtrlAttrMcastGrp::Name as u16, AttrKind::String),
    ],
);

/// Information about a Generic Netlink family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FamilyInfo {
    /// Dynamically assigned family ID (used as nlmsg_type).
    pub id: u16,
    /// Multicast groups: name -> group ID.
    pub mcast_groups: HashMap<String, u32>,
}

impl FamilyInfo {
    /// Look up a multicast group id by name.
    pub fn mcast_group(&self, name: &str) -> Option<u32> {
        self.mcast_groups.get(name).copied()
    }

    /// Decode a `CTRL_CMD_GETFAMILY` reply payload (GENL header included).
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        let (_, attrs) = GenlMsgHdr::split(payload)?;
        let table = CTRL_POLICY.parse(attrs)?;

        let id = table
            .u16(CtrlAttr::FamilyId as u16)?
            .ok_or_else(|| Error::InvalidMessage("missing family ID".into()))?;

        let mcast_groups = match table.get(CtrlAttr::McastGroups as u16) {
            Some(nested) => parse_mcast_groups(nested)?,
            None => HashMap::new(),
        };

        Ok(Self { id, mcast_groups })
    }
}

/// Parse multicast groups from CTRL_ATTR_MCAST_GROUPS.
///
/// The attribute is an array of nested entries, each holding a name and an id.
/// A named group without an id is malformed.
fn parse_mcast_groups(data: &[u8]) -> Result<HashMap<String, u32>> {
    let mut groups = HashMap::new();

    for (_idx, entry) in AttrIter::new(data) {
        let table = MCAST_GRP_POLICY.parse(entry)?;

        let Some(name) = table.str(CtrlAttrMcastGrp::Name as u16)? else {
            continue;
        };
        let id = table.u32(CtrlAttrMcastGrp::Id as u16)?.ok_or_else(|| {
            Error::InvalidMessage(format!("missing id attribute for multicast group {}", name))
        })?;

        groups.insert(name.to_string(), id);
    }

    Ok(groups)
}

/// Build a `CTRL_CMD_GETFAMILY` request for `name`.
pub fn family_request(name: &str) -> MessageBuilder {
    let mut builder = MessageBuilder::genl(
        GENL_ID_CTRL,
        NLM_F_REQUEST | NLM_F_ACK,
        CtrlCmd::GetFamily as u8,
        CTRL_VERSION,
    );
    builder.append_attr_str(CtrlAttr::FamilyName as u16, name);
    builder
}
