//! Generic netlink: the `genlmsghdr` and the control family.
//!
//! Generic netlink families get their message type at registration time. A
//! family id and its multicast groups are looked up by name through the
//! fixed control family ([`family_request`], [`FamilyInfo::from_payload`]).

mod family;
mod header;

pub use family::{CTRL_POLICY, FamilyInfo, MCAST_GRP_POLICY, family_request};
pub use header::{GENL_HDRLEN, GenlMsgHdr};

/// Message type of the control family, the only fixed generic netlink id.
pub const GENL_ID_CTRL: u16 = 0x10;

/// Version sent in control-family requests.
pub const CTRL_VERSION: u8 = 1;

/// `CTRL_CMD_*`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlCmd {
    Unspec = 0,
    NewFamily = 1,
    DelFamily = 2,
    GetFamily = 3,
}

/// `CTRL_ATTR_*`.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlAttr {
    Unspec = 0,
    FamilyId = 1,
    FamilyName = 2,
    Version = 3,
    HdrSize = 4,
    MaxAttr = 5,
    Ops = 6,
    McastGroups = 7,
    Policy = 8,
    OpPolicy = 9,
    Op = 10,
}

/// Highest control-family attribute this crate knows about.
pub const CTRL_ATTR_MAX: u16 = CtrlAttr::Op as u16;

/// `CTRL_ATTR_MCAST_GRP_*`, nested in each [`CtrlAttr::McastGroups`] entry.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlAttrMcastGrp {
    Unspec = 0,
    Name = 1,
    Id = 2,
}

/// Highest multicast-group attribute.
pub const CTRL_ATTR_MCAST_GRP_MAX: u16 = CtrlAttrMcastGrp::Id as u16;
