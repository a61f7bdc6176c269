//! Notification payloads and the handler interface for resource watches

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;

/// A resource delivered by a watch stream.
///
/// The watches set up by this crate only ever deliver services, but
/// handlers must tolerate whatever the wiring hands them, so the payload
/// carries its kind and the check becomes a pattern match.
#[derive(Clone, Debug)]
pub enum WatchedObject {
    /// A core/v1 Service.
    Service(Box<Service>),
    /// Any other resource kind, carried only by its kind name.
    Other { kind: String },
}

impl WatchedObject {
    pub fn service(svc: Service) -> Self {
        WatchedObject::Service(Box::new(svc))
    }
}

impl From<Service> for WatchedObject {
    fn from(svc: Service) -> Self {
        WatchedObject::service(svc)
    }
}

/// Callbacks invoked by a namespace watch.
///
/// A single watch delivers events strictly sequentially; watches for
/// separate namespaces deliver concurrently, so implementations must be
/// safe to call from multiple tasks.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// A resource appeared, either at initial listing or later.
    async fn on_add(&self, obj: WatchedObject);

    /// A tracked resource changed; `old` is the last state the watch saw.
    async fn on_update(&self, old: WatchedObject, new: WatchedObject);

    /// A tracked resource went away; `obj` is its final state.
    async fn on_delete(&self, obj: WatchedObject);
}
