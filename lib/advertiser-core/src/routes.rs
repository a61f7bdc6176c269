//! Advertised routes and the set tracking them

use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;

use ipnetwork::IpNetwork;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::CoreError;

/// A single advertised network prefix in canonical `addr/len` form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route(IpNetwork);

impl Route {
    /// Host route for a single address: `/32` for IPv4, `/128` for IPv6.
    pub fn host(addr: IpAddr) -> Self {
        Route(IpNetwork::from(addr))
    }

    /// Host route for a textual address, as found in a Service's
    /// `spec.clusterIP` field.
    pub fn host_from_str(addr: &str) -> Result<Self, CoreError> {
        let parsed = addr
            .parse::<IpAddr>()
            .map_err(|source| CoreError::InvalidAddress {
                addr: addr.to_string(),
                source,
            })?;
        Ok(Self::host(parsed))
    }
}

impl FromStr for Route {
    type Err = CoreError;

    /// Parses either a bare address (normalized to a host route) or an
    /// explicit `addr/len` prefix.
    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        let network = entry
            .parse::<IpNetwork>()
            .map_err(|source| CoreError::InvalidRoute {
                entry: entry.to_string(),
                source,
            })?;
        Ok(Route(network))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// RouteSet maintains the authoritative set of currently advertised routes.
///
/// Mutations report whether they changed the set; callers use that to
/// decide when a push to the overlay is warranted. The set itself never
/// pushes. Cloning yields another handle to the same underlying set.
#[derive(Clone, Default)]
pub struct RouteSet {
    routes: Arc<RwLock<BTreeSet<String>>>,
}

impl RouteSet {
    pub fn new() -> Self {
        Self {
            routes: Arc::new(RwLock::new(BTreeSet::new())),
        }
    }

    /// Insert a route. Returns true if the set was modified.
    pub async fn add(&self, route: &Route) -> bool {
        let mut routes = self.routes.write().await;
        let changed = routes.insert(route.to_string());
        if changed {
            info!("advertising route {}", route);
        }
        changed
    }

    /// Remove a route. Returns true if the set was modified.
    pub async fn remove(&self, route: &Route) -> bool {
        let mut routes = self.routes.write().await;
        let changed = routes.remove(&route.to_string());
        if changed {
            info!("withdrawing route {}", route);
        }
        changed
    }

    /// Current contents in lexicographic order.
    pub async fn snapshot(&self) -> Vec<String> {
        let routes = self.routes.read().await;
        routes.iter().cloned().collect()
    }

    /// Number of advertised routes.
    pub async fn len(&self) -> usize {
        let routes = self.routes.read().await;
        routes.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
