//! Reachability probe used before any network call.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use tracing::debug;

pub trait Connectivity: Send + Sync {
    /// True iff the host has at least one usable network transport right now.
    fn is_available(&self) -> bool;
}

/// Well-known public resolvers. Only used to ask the OS for a route; nothing
/// is sent to them.
const PROBE_TARGET_V4: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)),
    53,
);
const PROBE_TARGET_V6: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V6(Ipv6Addr::new(0x2606, 0x4700, 0x4700, 0, 0, 0, 0, 0x1111)),
    53,
);

/// Reports connectivity by asking the routing table for a path off-host.
///
/// Connecting a UDP socket only selects a route and a source address, so the
/// probe is side-effect free. A missing route on both address families means
/// no interface (wireless, cellular or wired) is up.
#[derive(Debug, Clone)]
pub struct RouteProbeConnectivity {
    targets: Vec<SocketAddr>,
}

impl RouteProbeConnectivity {
    pub fn new() -> Self {
        Self {
            targets: vec![PROBE_TARGET_V4, PROBE_TARGET_V6],
        }
    }

    pub fn with_targets(targets: Vec<SocketAddr>) -> Self {
        Self { targets }
    }

    fn has_route(target: SocketAddr) -> bool {
        let bind_addr: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = match UdpSocket::bind(bind_addr) {
            Ok(socket) => socket,
            Err(err) => {
                debug!(%target, error = %err, "connectivity probe: bind failed");
                return false;
            }
        };
        if let Err(err) = socket.connect(target) {
            debug!(%target, error = %err, "connectivity probe: no route");
            return false;
        }

        match socket.local_addr() {
            Ok(local) => !local.ip().is_unspecified() && !local.ip().is_loopback(),
            Err(_) => false,
        }
    }
}

impl Default for RouteProbeConnectivity {
    fn default() -> Self {
        Self::new()
    }
}

impl Connectivity for RouteProbeConnectivity {
    fn is_available(&self) -> bool {
        self.targets.iter().any(|target| Self::has_route(*target))
    }
}

/// Constant answer, for offline mode and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedConnectivity(pub bool);

impl Connectivity for FixedConnectivity {
    fn is_available(&self) -> bool {
        self.0
    }
}
