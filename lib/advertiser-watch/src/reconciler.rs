//! Bridges service lifecycle events to route set mutations and pushes

use advertiser_core::{Route, RouteSet};
use advertiser_overlay::OverlayClient;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use tracing::{debug, error, info, warn};

use crate::handler::{EventHandler, WatchedObject};

/// ServiceRouteReconciler keeps the advertised route set in sync with the
/// cluster IPs of watched services.
///
/// Every mutation that actually changes the set triggers a push of the
/// full snapshot. Push failures are logged and swallowed; a failed push
/// must never stall or kill notification delivery.
pub struct ServiceRouteReconciler {
    routes: RouteSet,
    overlay: OverlayClient,
}

impl ServiceRouteReconciler {
    pub fn new(routes: RouteSet, overlay: OverlayClient) -> Self {
        Self { routes, overlay }
    }

    /// Push the full current route set to the overlay, logging any failure.
    pub async fn push_current(&self) {
        let snapshot = self.routes.snapshot().await;
        if let Err(err) = self.overlay.push(&snapshot).await {
            error!("pushing route advertisements: {}", err);
        }
    }

    /// The advertised route for a service, if it has a usable cluster IP.
    ///
    /// Headless services (`clusterIP: None`) and services without an
    /// assigned address have no route.
    fn service_route(svc: &Service) -> Option<Route> {
        let ip = svc.spec.as_ref()?.cluster_ip.as_deref()?;
        if ip.is_empty() || ip == "None" {
            return None;
        }
        match Route::host_from_str(ip) {
            Ok(route) => Some(route),
            Err(err) => {
                warn!("service {}: {}", service_name(svc), err);
                None
            }
        }
    }
}

fn service_name(svc: &Service) -> &str {
    svc.metadata.name.as_deref().unwrap_or("unknown")
}

#[async_trait]
impl EventHandler for ServiceRouteReconciler {
    async fn on_add(&self, obj: WatchedObject) {
        let svc = match obj {
            WatchedObject::Service(svc) => svc,
            WatchedObject::Other { kind } => {
                debug!("add: got non-service object of kind {}", kind);
                return;
            }
        };

        let Some(route) = Self::service_route(&svc) else {
            return;
        };
        info!("discovered service {} at {}", service_name(&svc), route);

        if self.routes.add(&route).await {
            self.push_current().await;
        }
    }

    async fn on_update(&self, old: WatchedObject, new: WatchedObject) {
        let (WatchedObject::Service(old_svc), WatchedObject::Service(new_svc)) = (old, new) else {
            debug!("update: got non-service object");
            return;
        };

        let old_route = Self::service_route(&old_svc);
        let new_route = Self::service_route(&new_svc);
        if old_route == new_route {
            return;
        }
        info!(
            "cluster ip changed for service {}: {:?} -> {:?}",
            service_name(&new_svc),
            old_route.as_ref().map(ToString::to_string),
            new_route.as_ref().map(ToString::to_string),
        );

        let mut changed = false;
        if let Some(route) = old_route {
            changed |= self.routes.remove(&route).await;
        }
        if let Some(route) = new_route {
            changed |= self.routes.add(&route).await;
        }

        // One push covers both mutations.
        if changed {
            self.push_current().await;
        }
    }

    async fn on_delete(&self, obj: WatchedObject) {
        let svc = match obj {
            WatchedObject::Service(svc) => svc,
            WatchedObject::Other { kind } => {
                debug!("delete: got non-service object of kind {}", kind);
                return;
            }
        };

        let Some(route) = Self::service_route(&svc) else {
            return;
        };
        info!("service {} removed", service_name(&svc));

        if self.routes.remove(&route).await {
            self.push_current().await;
        }
    }
}
