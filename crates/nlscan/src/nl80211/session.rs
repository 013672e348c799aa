//! The scan session: two channels bound to one wireless interface.

use std::time::Duration;

use crate::netlink::{Error, NetlinkSocket, Result, Transport};
use crate::util::ifname;

use super::channel::Channel;
use super::diag::DiagnosticSink;
use super::notify::ScanState;
use super::scan::ScanCollector;
use super::types::{BssInfo, StationInfo};
use super::{NL80211_GENL_NAME, NL80211_MULTICAST_GROUP_SCAN};

#[derive(Debug, Clone)]
enum Target {
    Name(String),
    Index(u32),
}

/// Builder for a [`WifiScan`] session.
///
/// ```rust,no_run
/// use std::time::Duration;
/// use nlscan::nl80211::{DiagnosticSink, SessionBuilder};
///
/// # async fn example() -> nlscan::Result<()> {
/// let wifi = SessionBuilder::new("wlan0")
///     .diagnostics(DiagnosticSink::Tracing)
///     .wait_timeout(Some(Duration::from_secs(10)))
///     .open()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    target: Target,
    diag: DiagnosticSink,
    wait_timeout: Option<Duration>,
}

impl SessionBuilder {
    /// Session for the interface with this name.
    pub fn new(interface: impl Into<String>) -> Self {
        Self::with_target(Target::Name(interface.into()))
    }

    /// Session for an interface index, skipping name resolution.
    pub fn for_ifindex(ifindex: u32) -> Self {
        Self::with_target(Target::Index(ifindex))
    }

    fn with_target(target: Target) -> Self {
        Self {
            target,
            diag: DiagnosticSink::default(),
            wait_timeout: None,
        }
    }

    /// Where diagnostics go (standard error by default).
    pub fn diagnostics(mut self, sink: DiagnosticSink) -> Self {
        self.diag = sink;
        self
    }

    /// Bound the wait for scan completion. `None` waits as long as the
    /// driver takes.
    pub fn wait_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Open the session over real netlink sockets.
    pub async fn open(self) -> Result<WifiScan<NetlinkSocket>> {
        self.open_with(NetlinkSocket::new).await
    }

    /// Open the session with a custom transport factory.
    ///
    /// `connect` is called twice, notification channel first. It is not
    /// called at all when the interface does not resolve.
    pub async fn open_with<T, F>(self, connect: F) -> Result<WifiScan<T>>
    where
        T: Transport,
        F: FnMut() -> Result<T>,
    {
        let diag = self.diag.clone();
        self.establish(connect)
            .await
            .inspect_err(|e| diag.emit(&format!("cannot open scan session: {}", e)))
    }

    fn resolve_ifindex(&self) -> Result<u32> {
        match &self.target {
            Target::Index(index) => Ok(*index),
            Target::Name(name) => ifname::name_to_index(name)
                .map_err(|_| Error::InterfaceNotFound { name: name.clone() }),
        }
    }

    async fn establish<T, F>(self, mut connect: F) -> Result<WifiScan<T>>
    where
        T: Transport,
        F: FnMut() -> Result<T>,
    {
        let ifindex = self.resolve_ifindex()?;

        let mut notifications = Channel::new(connect()?, ifindex, self.diag.clone());
        let mut commands = Channel::new(connect()?, ifindex, self.diag.clone());

        let family = notifications.resolve_family().await?;
        let group = family
            .mcast_group(NL80211_MULTICAST_GROUP_SCAN)
            .ok_or_else(|| Error::MulticastGroupNotFound {
                family: NL80211_GENL_NAME.to_string(),
                group: NL80211_MULTICAST_GROUP_SCAN.to_string(),
            })?;

        commands.set_family_id(family.id);
        notifications.transport_mut().add_membership(group)?;

        tracing::debug!(ifindex, family_id = family.id, group, "scan session ready");

        Ok(WifiScan {
            notifications,
            commands,
            ifindex,
            diag: self.diag,
            wait_timeout: self.wait_timeout,
        })
    }
}

/// A scan session bound to one wireless interface.
///
/// Not meant to be shared between concurrent callers: every operation takes
/// `&mut self`. Use one session per interface.
pub struct WifiScan<T: Transport = NetlinkSocket> {
    notifications: Channel<T>,
    commands: Channel<T>,
    ifindex: u32,
    diag: DiagnosticSink,
    wait_timeout: Option<Duration>,
}

impl WifiScan<NetlinkSocket> {
    /// Open a session on `interface` with default settings.
    pub async fn open(interface: &str) -> Result<Self> {
        SessionBuilder::new(interface).open().await
    }

    /// Start configuring a session on `interface`.
    pub fn builder(interface: impl Into<String>) -> SessionBuilder {
        SessionBuilder::new(interface)
    }
}

impl<T: Transport> WifiScan<T> {
    /// Index of the interface this session scans on.
    pub fn ifindex(&self) -> u32 {
        self.ifindex
    }

    /// Resolved nl80211 family id.
    pub fn family_id(&self) -> u16 {
        self.commands.family_id()
    }

    /// Run one scan and write the results into `out`.
    ///
    /// Returns how many networks the kernel reported. This may be larger than
    /// `out.len()`; only the first `out.len()` are written. A connected
    /// network, if any, is always in `out[0]`.
    ///
    /// [`Error::DeviceBusy`] means the device refused to start a scan; retry
    /// after a delay.
    pub async fn scan(&mut self, out: &mut [BssInfo]) -> Result<usize> {
        let result = self.run_scan(out).await;
        self.report(result)
    }

    async fn run_scan(&mut self, out: &mut [BssInfo]) -> Result<usize> {
        let mut state = ScanState::new();

        // someone else may have triggered a scan, or left results waiting
        self.notifications.drain_notifications(&mut state)?;
        self.trigger_scan_if_necessary(&mut state).await?;
        self.wait_for_results(&mut state).await?;

        let mut collector = ScanCollector::new(out);
        self.commands.get_scan(&mut collector).await?;
        Ok(collector.seen())
    }

    /// Trigger a scan unless `state` already saw a trigger or fresh results.
    ///
    /// Returns whether a trigger was sent.
    pub async fn trigger_scan_if_necessary(&mut self, state: &mut ScanState) -> Result<bool> {
        if !state.needs_trigger() {
            tracing::debug!(phase = ?state.phase(), "scan already under way");
            return Ok(false);
        }

        self.commands.trigger_scan().await?;
        state.triggered();
        Ok(true)
    }

    async fn wait_for_results(&mut self, state: &mut ScanState) -> Result<()> {
        let wait = self.notifications.wait_for_results(state);
        match self.wait_timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| Error::Timeout)?,
            None => wait.await,
        }
    }

    /// Statistics for the access point the device is connected to.
    ///
    /// Reads the current scan results into a single slot. If no associated
    /// or IBSS-joined network is reported, returns `None` without querying
    /// the station.
    pub async fn station(&mut self) -> Result<Option<StationInfo>> {
        let result = self.query_station().await;
        self.report(result)
    }

    async fn query_station(&mut self) -> Result<Option<StationInfo>> {
        let mut slot = [BssInfo::default()];
        let mut collector = ScanCollector::new(&mut slot);
        self.commands.get_scan(&mut collector).await?;
        let seen = collector.seen();

        let [bss] = slot;
        if seen == 0 || !bss.is_connected() {
            tracing::debug!(seen, "not associated");
            return Ok(None);
        }

        let mut info = StationInfo {
            bssid: bss.bssid,
            ssid: bss.ssid,
            status: bss.status,
            ..Default::default()
        };

        match self.commands.get_station(bss.bssid, &mut info).await {
            Ok(()) => Ok(Some(info)),
            // the association went away between the two queries
            Err(e) if e.is_not_found() => {
                self.diag.emit(&format!("station {} vanished: {}", bss.bssid, e));
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Close both channels.
    pub fn close(self) {}

    fn report<V>(&self, result: Result<V>) -> Result<V> {
        result.inspect_err(|e| self.diag.emit(&e.to_string()))
    }
}

impl<T: Transport> std::fmt::Debug for WifiScan<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WifiScan")
            .field("ifindex", &self.ifindex)
            .field("family_id", &self.commands.family_id())
            .field("wait_timeout", &self.wait_timeout)
            .finish_non_exhaustive()
    }
}
