//! The seam between the protocol engine and a netlink socket.

use bytes::Bytes;

use super::error::Result;

/// A datagram transport speaking generic netlink.
///
/// [`NetlinkSocket`](super::socket::NetlinkSocket) is the production
/// implementation. The protocol engine only ever talks to this trait, so the
/// scan state machine can be driven by a scripted kernel in tests.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Port id assigned by the kernel at bind time.
    fn port_id(&self) -> u32;

    /// Send one complete netlink message.
    async fn send(&mut self, msg: &[u8]) -> Result<()>;

    /// Wait for the next datagram.
    async fn recv(&mut self) -> Result<Bytes>;

    /// Receive a datagram if one is already queued.
    ///
    /// Returns `Ok(None)` when nothing is waiting. Any other failure is an error.
    fn try_recv(&mut self) -> Result<Option<Bytes>>;

    /// Join a multicast group.
    fn add_membership(&mut self, group: u32) -> Result<()>;
}
