use std::sync::Arc;

use advertiser_core::{seed_static_routes, RouteSet};
use advertiser_overlay::OverlayClient;
use advertiser_watch::{spawn_service_watch, ServiceRouteReconciler};
use anyhow::Result;
use kube::Client;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::fmt::init as tracing_init;

mod config;

use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();

    info!("Starting route-advertiser...");

    let config = Config::from_env()?;
    info!(
        "Advertising to {} for namespaces {}",
        config.endpoint,
        config.namespaces.join(",")
    );

    let overlay = OverlayClient::connect(&config.endpoint).await?;
    info!("Overlay endpoint probe succeeded");

    let routes = RouteSet::new();
    let seeded = seed_static_routes(&routes, &config.extra_routes).await;
    if seeded > 0 {
        info!("Seeded {} static routes", seeded);
    }

    // Publish the seeded (possibly empty) set up front so the overlay
    // starts from the advertiser's state even if no service event ever
    // fires.
    if let Err(err) = overlay.push(&routes.snapshot().await).await {
        warn!("Initial route push failed: {}", err);
    }

    let client = Client::try_default().await?;
    let reconciler = Arc::new(ServiceRouteReconciler::new(routes, overlay));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut watches = Vec::new();
    for namespace in &config.namespaces {
        watches.push(spawn_service_watch(
            client.clone(),
            namespace,
            reconciler.clone(),
            shutdown_rx.clone(),
        ));
    }

    for namespace_watch in &mut watches {
        namespace_watch.wait_ready().await;
        info!(
            "Initial sync complete for namespace {}",
            namespace_watch.namespace
        );
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting...");

    let _ = shutdown_tx.send(true);
    for namespace_watch in watches {
        namespace_watch.join().await;
    }

    Ok(())
}
