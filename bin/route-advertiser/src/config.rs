//! Environment-driven configuration

use advertiser_core::split_list;
use anyhow::{bail, Result};

/// Default advertisement endpoint: the overlay client's local API.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8088";

/// Runtime configuration, read from ADVERTISER_* environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    /// Namespaces whose services feed the advertised route set.
    pub namespaces: Vec<String>,
    /// Advertisement endpoint URL.
    pub endpoint: String,
    /// Raw comma-separated list of always-advertised extra routes.
    pub extra_routes: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let raw = std::env::var("ADVERTISER_NAMESPACES").unwrap_or_default();
        let namespaces = split_list(&raw);
        if namespaces.is_empty() {
            bail!("ADVERTISER_NAMESPACES must name at least one namespace");
        }

        let endpoint = std::env::var("ADVERTISER_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let extra_routes = std::env::var("ADVERTISER_EXTRA_ROUTES").unwrap_or_default();

        Ok(Self {
            namespaces,
            endpoint,
            extra_routes,
        })
    }
}
