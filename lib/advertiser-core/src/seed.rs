//! Static route seeding from configuration

use tracing::warn;

use crate::routes::{Route, RouteSet};

/// Split a comma-separated configuration value into trimmed, non-empty
/// entries, preserving order.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Add the configured always-on extra routes to `routes`.
///
/// Each entry is either a bare address (normalized to a host route) or an
/// explicit CIDR prefix. Malformed entries are logged and skipped without
/// aborting the rest. Returns the number of routes added.
pub async fn seed_static_routes(routes: &RouteSet, raw: &str) -> usize {
    let mut added = 0;
    for entry in split_list(raw) {
        match entry.parse::<Route>() {
            Ok(route) => {
                if routes.add(&route).await {
                    added += 1;
                }
            }
            Err(err) => warn!("skipping static route: {}", err),
        }
    }
    added
}
