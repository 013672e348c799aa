//! Error types for netlink and nl80211 operations.

use std::io;

/// Result type for netlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong talking to nl80211.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Kernel returned an error code.
    #[error("kernel error: {message} (errno {errno})")]
    Kernel {
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Kernel error with operation context.
    #[error("{operation}: {message} (errno {errno})")]
    KernelWithContext {
        /// The operation that failed.
        operation: String,
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Message was truncated.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Expected message length.
        expected: usize,
        /// Actual bytes received.
        actual: usize,
    },

    /// Invalid message format.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Invalid attribute format.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// Interface not found.
    #[error("interface not found: {name}")]
    InterfaceNotFound {
        /// The interface name that was not found.
        name: String,
    },

    /// The generic netlink socket could not be opened or bound.
    #[error("netlink socket unavailable: {0}")]
    SocketUnavailable(#[source] io::Error),

    /// Generic netlink family is not registered in the kernel.
    #[error("generic netlink family not found: {name}")]
    FamilyNotFound {
        /// The family name that was looked up.
        name: String,
    },

    /// The family does not expose the requested multicast group.
    #[error("multicast group '{group}' not found in family {family}")]
    MulticastGroupNotFound {
        /// The family name.
        family: String,
        /// The group name.
        group: String,
    },

    /// Joining a multicast group failed.
    #[error("cannot subscribe to multicast group {group}: {source}")]
    Subscription {
        /// The numeric group id.
        group: u32,
        /// The underlying socket error.
        #[source]
        source: io::Error,
    },

    /// The device rejected a scan trigger because it is busy.
    #[error("device busy, retry later")]
    DeviceBusy,

    /// A scan in progress was aborted by the kernel.
    #[error("scan aborted")]
    ScanAborted,

    /// Waiting for scan results exceeded the configured deadline.
    #[error("timed out waiting for scan results")]
    Timeout,
}

impl Error {
    /// Kernel error from the negative code of an `NLMSG_ERROR` payload.
    pub fn from_errno(errno: i32) -> Self {
        let message = io::Error::from_raw_os_error(-errno).to_string();
        Self::Kernel {
            errno: -errno,
            message,
        }
    }

    /// Create a kernel error with operation context.
    pub fn from_errno_with_context(errno: i32, operation: impl Into<String>) -> Self {
        let message = io::Error::from_raw_os_error(-errno).to_string();
        Self::KernelWithContext {
            operation: operation.into(),
            errno: -errno,
            message,
        }
    }

    /// Name the operation a kernel error belongs to. Other errors pass through.
    pub fn with_context(self, operation: impl Into<String>) -> Self {
        match self {
            Self::Kernel { errno, message } => Self::KernelWithContext {
                operation: operation.into(),
                errno,
                message,
            },
            other => other,
        }
    }

    /// Check if the thing asked for does not exist: a kernel `ENOENT` or
    /// `ENODEV`, or a failed interface, family or group lookup.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => {
                matches!(*errno, libc::ENOENT | libc::ENODEV)
            }
            Self::InterfaceNotFound { .. }
            | Self::FamilyNotFound { .. }
            | Self::MulticastGroupNotFound { .. } => true,
            _ => false,
        }
    }

    /// Check if the kernel refused for lack of privileges. Triggering a
    /// scan needs `CAP_NET_ADMIN`.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => {
                matches!(*errno, libc::EPERM | libc::EACCES)
            }
            Self::SocketUnavailable(e) | Self::Subscription { source: e, .. } => {
                e.kind() == io::ErrorKind::PermissionDenied
            }
            _ => false,
        }
    }

    /// Check if this is a "device busy" condition.
    ///
    /// Busy errors are transient: the caller may retry the whole operation
    /// after a delay of its choosing.
    pub fn is_busy(&self) -> bool {
        match self {
            Self::DeviceBusy => true,
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => {
                *errno == libc::EBUSY
            }
            _ => false,
        }
    }

    /// Check if this error happened while opening a session.
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            Self::InterfaceNotFound { .. }
                | Self::SocketUnavailable(_)
                | Self::FamilyNotFound { .. }
                | Self::MulticastGroupNotFound { .. }
                | Self::Subscription { .. }
        )
    }

    /// Check if this is a transport failure (send/receive).
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Get the errno value if this is a kernel error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => Some(*errno),
            Self::DeviceBusy => Some(libc::EBUSY),
            _ => None,
        }
    }
}
