//! Service watches feeding the route advertisement reconciler
//!
//! This library provides:
//! - The notification payload model and handler interface for watches
//! - ServiceRouteReconciler, which turns service lifecycle events into
//!   route set mutations and overlay pushes
//! - Per-namespace watch tasks with an initial-sync readiness signal

pub mod handler;
pub mod reconciler;
pub mod watch;

pub use handler::{EventHandler, WatchedObject};
pub use reconciler::ServiceRouteReconciler;
pub use watch::{spawn_service_watch, ServiceWatch};
