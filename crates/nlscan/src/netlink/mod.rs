//! Async generic netlink plumbing.
//!
//! The pieces here know nothing about wireless devices: TLV attributes,
//! `nlmsghdr` framing, a message builder, declarative attribute validation,
//! control-family resolution and an async socket behind the [`Transport`]
//! trait. The [`nl80211`](crate::nl80211) module builds the scan engine on top.
//!
//! ```ignore
//! use nlscan::netlink::{NetlinkSocket, Transport};
//! use nlscan::netlink::genl::{FamilyInfo, family_request};
//!
//! let mut socket = NetlinkSocket::new()?;
//! let mut request = family_request("nl80211");
//! request.set_seq(1);
//! socket.send(&request.finish()).await?;
//! let reply = socket.recv().await?;
//! ```

pub mod attr;
mod builder;
mod error;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod genl;
pub mod message;
mod socket;
mod transport;
pub mod validation;

pub use attr::{AttrIter, NlAttr};
pub use builder::{MessageBuilder, NestToken};
pub use error::{Error, Result};
pub use message::{MessageIter, NLMSG_HDRLEN, NlMsgHdr, NlMsgType};
pub use socket::{NetlinkSocket, buffer_size};
pub use transport::Transport;
pub use validation::{AttrKind, AttrPolicy, AttrRule, AttrTable};
