//! Low-level async generic netlink socket.

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};

use bytes::{Bytes, BytesMut};
use netlink_sys::{Socket, SocketAddr, protocols};
use tokio::io::Interest;
use tokio::io::unix::AsyncFd;

use super::error::{Error, Result};
use super::transport::Transport;

/// Smallest receive buffer, large enough for any nl80211 dump datagram.
const MIN_BUFFER_SIZE: usize = 8192;

/// Receive buffer size: one page or 8 KiB, whichever is larger.
pub fn buffer_size() -> usize {
    // SAFETY: sysconf has no preconditions.
    let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    usize::try_from(page).unwrap_or(0).max(MIN_BUFFER_SIZE)
}

/// Async `NETLINK_GENERIC` socket.
///
/// The descriptor is always non-blocking. [`Transport::recv`] waits for
/// readiness through tokio, [`Transport::try_recv`] returns immediately.
pub struct NetlinkSocket {
    /// The underlying async file descriptor.
    fd: AsyncFd<Socket>,
    /// Local port ID (assigned by kernel).
    pid: u32,
    /// Receive buffer, reused across datagrams.
    buf: BytesMut,
}

impl NetlinkSocket {
    /// Open and bind a generic netlink socket with an auto-assigned port id.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Result<Self> {
        Self::create_socket().map_err(Error::SocketUnavailable)
    }

    fn create_socket() -> io::Result<Self> {
        let mut socket = Socket::new(protocols::NETLINK_GENERIC)?;
        socket.set_non_blocking(true)?;

        // Bind to get a port ID
        let mut addr = SocketAddr::new(0, 0);
        socket.bind(&addr)?;
        socket.get_address(&mut addr)?;
        let pid = addr.port_number();

        // Extended ACKs are a nicety; older kernels reject the option.
        socket.set_ext_ack(true).ok();

        let fd = AsyncFd::new(socket)?;

        tracing::debug!(pid, "opened generic netlink socket");

        Ok(Self {
            fd,
            pid,
            buf: BytesMut::with_capacity(buffer_size()),
        })
    }

    /// Get the local port ID.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    fn prepare_buf(&mut self) {
        self.buf.clear();
        self.buf.reserve(buffer_size());
    }
}

/// Fail when the kernel had more bytes than the buffer kept.
///
/// `received` is the datagram length reported under `MSG_TRUNC`.
fn check_datagram_len(received: usize, kept: usize) -> Result<()> {
    if received > kept {
        tracing::warn!(received, kept, "netlink datagram truncated");
        return Err(Error::Truncated {
            expected: received,
            actual: kept,
        });
    }
    Ok(())
}

impl Transport for NetlinkSocket {
    fn port_id(&self) -> u32 {
        self.pid
    }

    async fn send(&mut self, msg: &[u8]) -> Result<()> {
        loop {
            let mut guard = self.fd.ready(Interest::WRITABLE).await?;

            match guard.try_io(|inner| inner.get_ref().send(msg, 0)) {
                Ok(result) => {
                    result?;
                    return Ok(());
                }
                Err(_would_block) => continue,
            }
        }
    }

    async fn recv(&mut self) -> Result<Bytes> {
        self.prepare_buf();
        let Self { fd, buf, .. } = self;

        loop {
            let mut guard = fd.ready(Interest::READABLE).await?;

            match guard.try_io(|inner| inner.get_ref().recv(buf, libc::MSG_TRUNC)) {
                Ok(result) => {
                    let received = result?;
                    // recv advanced the buffer, so buf[..] holds the datagram
                    check_datagram_len(received, buf.len())?;
                    return Ok(Bytes::copy_from_slice(&buf[..]));
                }
                Err(_would_block) => continue,
            }
        }
    }

    fn try_recv(&mut self) -> Result<Option<Bytes>> {
        self.prepare_buf();

        match self.fd.get_ref().recv(&mut self.buf, libc::MSG_TRUNC) {
            Ok(received) => {
                check_datagram_len(received, self.buf.len())?;
                Ok(Some(Bytes::copy_from_slice(&self.buf)))
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn add_membership(&mut self, group: u32) -> Result<()> {
        self.fd
            .get_mut()
            .add_membership(group)
            .map_err(|source| Error::Subscription { group, source })
    }
}

impl AsRawFd for NetlinkSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.get_ref().as_raw_fd()
    }
}
