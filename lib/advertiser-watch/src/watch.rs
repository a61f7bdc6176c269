//! Per-namespace service watches

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::TryStreamExt;
use k8s_openapi::api::core::v1::Service;
use kube::{Api, Client};
use kube_runtime::watcher::{self, Config as WatcherConfig, Event};
use kube_runtime::WatchStreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::handler::{EventHandler, WatchedObject};

/// Handle to a running namespace watch.
pub struct ServiceWatch {
    pub namespace: String,
    ready: watch::Receiver<bool>,
    task: JoinHandle<()>,
}

impl ServiceWatch {
    /// Wait until the watch has completed its initial listing.
    pub async fn wait_ready(&mut self) {
        while !*self.ready.borrow() {
            if self.ready.changed().await.is_err() {
                return;
            }
        }
    }

    /// Wait for the watch task to finish after shutdown was signaled.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

/// Spawn a watch over services in `namespace`, delivering lifecycle events
/// to `handler` until `shutdown` flips to true.
///
/// Events within the returned watch are delivered strictly sequentially;
/// watches for separate namespaces run concurrently.
pub fn spawn_service_watch(
    client: Client,
    namespace: &str,
    handler: Arc<dyn EventHandler>,
    shutdown: watch::Receiver<bool>,
) -> ServiceWatch {
    let (ready_tx, ready_rx) = watch::channel(false);
    let namespace = namespace.to_string();
    let task = tokio::spawn(run_watch(
        client,
        namespace.clone(),
        handler,
        shutdown,
        ready_tx,
    ));
    ServiceWatch {
        namespace,
        ready: ready_rx,
        task,
    }
}

async fn run_watch(
    client: Client,
    namespace: String,
    handler: Arc<dyn EventHandler>,
    mut shutdown: watch::Receiver<bool>,
    ready: watch::Sender<bool>,
) {
    let services: Api<Service> = Api::namespaced(client, &namespace);
    let stream = watcher::watcher(services, WatcherConfig::default()).default_backoff();
    tokio::pin!(stream);

    let mut state = WatchState::default();
    info!("watching services in namespace {}", namespace);

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                // A dropped sender counts as shutdown.
                if changed.is_err() || *shutdown.borrow_and_update() {
                    debug!("stopping service watch for namespace {}", namespace);
                    return;
                }
            }
            event = stream.try_next() => match event {
                Ok(Some(event)) => {
                    state.apply(event, handler.as_ref()).await;
                    if state.synced {
                        ready.send_replace(true);
                    }
                }
                Ok(None) => {
                    error!("service watch stream for namespace {} ended", namespace);
                    return;
                }
                Err(err) => {
                    // The backoff layer already spaced out the retry.
                    error!("service watch for namespace {}: {}", namespace, err);
                }
            },
        }
    }
}

/// Tracks last-seen services so watcher events can be widened into
/// add/update/delete callbacks carrying old state.
#[derive(Default)]
struct WatchState {
    known: HashMap<String, Service>,
    relisted: HashSet<String>,
    listing: bool,
    synced: bool,
}

impl WatchState {
    async fn apply(&mut self, event: Event<Service>, handler: &dyn EventHandler) {
        match event {
            Event::Init => {
                self.listing = true;
                self.relisted.clear();
            }
            Event::InitApply(svc) => {
                if self.listing {
                    self.relisted.insert(key(&svc));
                }
                self.upsert(svc, handler).await;
            }
            Event::InitDone => {
                if self.listing {
                    self.listing = false;
                    self.drop_unlisted(handler).await;
                }
                self.synced = true;
            }
            Event::Apply(svc) => {
                self.upsert(svc, handler).await;
            }
            Event::Delete(svc) => {
                self.known.remove(&key(&svc));
                handler.on_delete(WatchedObject::service(svc)).await;
            }
        }
    }

    async fn upsert(&mut self, svc: Service, handler: &dyn EventHandler) {
        match self.known.insert(key(&svc), svc.clone()) {
            Some(old) => {
                handler
                    .on_update(WatchedObject::service(old), WatchedObject::service(svc))
                    .await;
            }
            None => handler.on_add(WatchedObject::service(svc)).await,
        }
    }

    /// Deliver deletes for services that disappeared while the watch was
    /// disconnected: known before the re-list, absent from it.
    async fn drop_unlisted(&mut self, handler: &dyn EventHandler) {
        let gone: Vec<String> = self
            .known
            .keys()
            .filter(|name| !self.relisted.contains(*name))
            .cloned()
            .collect();
        for name in gone {
            if let Some(svc) = self.known.remove(&name) {
                debug!("service {} vanished during re-list", name);
                handler.on_delete(WatchedObject::service(svc)).await;
            }
        }
    }
}

fn key(svc: &Service) -> String {
    svc.metadata.name.clone().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use k8s_openapi::api::core::v1::ServiceSpec;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum Seen {
        Add(String),
        Update(String, String),
        Delete(String),
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Seen>>,
    }

    impl Recorder {
        fn take(&self) -> Vec<Seen> {
            std::mem::take(&mut *self.seen.lock().unwrap())
        }
    }

    fn name_of(obj: &WatchedObject) -> String {
        match obj {
            WatchedObject::Service(svc) => svc.metadata.name.clone().unwrap_or_default(),
            WatchedObject::Other { kind } => kind.clone(),
        }
    }

    #[async_trait]
    impl EventHandler for Recorder {
        async fn on_add(&self, obj: WatchedObject) {
            self.seen.lock().unwrap().push(Seen::Add(name_of(&obj)));
        }

        async fn on_update(&self, old: WatchedObject, new: WatchedObject) {
            self.seen
                .lock()
                .unwrap()
                .push(Seen::Update(name_of(&old), name_of(&new)));
        }

        async fn on_delete(&self, obj: WatchedObject) {
            self.seen.lock().unwrap().push(Seen::Delete(name_of(&obj)));
        }
    }

    fn service(name: &str, cluster_ip: &str) -> Service {
        Service {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                cluster_ip: Some(cluster_ip.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn apply_of_unknown_service_is_an_add() {
        let recorder = Recorder::default();
        let mut state = WatchState::default();

        state.apply(Event::Apply(service("foo", "198.51.100.1")), &recorder).await;

        assert_eq!(recorder.take(), vec![Seen::Add("foo".to_string())]);
    }

    #[tokio::test]
    async fn apply_of_known_service_is_an_update_with_old_state() {
        let recorder = Recorder::default();
        let mut state = WatchState::default();

        state.apply(Event::Apply(service("foo", "198.51.100.1")), &recorder).await;
        state.apply(Event::Apply(service("foo", "198.51.100.2")), &recorder).await;

        assert_eq!(
            recorder.take(),
            vec![
                Seen::Add("foo".to_string()),
                Seen::Update("foo".to_string(), "foo".to_string()),
            ]
        );
        // The stored state now reflects the newer object.
        let stored = state.known.get("foo").unwrap();
        assert_eq!(
            stored.spec.as_ref().unwrap().cluster_ip.as_deref(),
            Some("198.51.100.2")
        );
    }

    #[tokio::test]
    async fn delete_forgets_the_service() {
        let recorder = Recorder::default();
        let mut state = WatchState::default();

        state.apply(Event::Apply(service("foo", "198.51.100.1")), &recorder).await;
        state.apply(Event::Delete(service("foo", "198.51.100.1")), &recorder).await;
        // A later apply is an add again, not an update.
        state.apply(Event::Apply(service("foo", "198.51.100.1")), &recorder).await;

        assert_eq!(
            recorder.take(),
            vec![
                Seen::Add("foo".to_string()),
                Seen::Delete("foo".to_string()),
                Seen::Add("foo".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn initial_listing_marks_synced_on_init_done() {
        let recorder = Recorder::default();
        let mut state = WatchState::default();

        state.apply(Event::Init, &recorder).await;
        assert!(!state.synced);
        state.apply(Event::InitApply(service("foo", "198.51.100.1")), &recorder).await;
        state.apply(Event::InitDone, &recorder).await;

        assert!(state.synced);
        assert_eq!(recorder.take(), vec![Seen::Add("foo".to_string())]);
    }

    #[tokio::test]
    async fn relist_synthesizes_deletes_for_vanished_services() {
        let recorder = Recorder::default();
        let mut state = WatchState::default();

        state.apply(Event::Init, &recorder).await;
        state.apply(Event::InitApply(service("foo", "198.51.100.1")), &recorder).await;
        state.apply(Event::InitApply(service("bar", "198.51.100.2")), &recorder).await;
        state.apply(Event::InitDone, &recorder).await;
        recorder.take();

        // Reconnect: the re-list no longer contains bar.
        state.apply(Event::Init, &recorder).await;
        state.apply(Event::InitApply(service("foo", "198.51.100.1")), &recorder).await;
        state.apply(Event::InitDone, &recorder).await;

        let seen = recorder.take();
        assert!(seen.contains(&Seen::Delete("bar".to_string())));
        assert!(seen.contains(&Seen::Update("foo".to_string(), "foo".to_string())));
        assert!(!state.known.contains_key("bar"));
    }
}
