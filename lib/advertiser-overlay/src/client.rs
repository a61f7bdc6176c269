//! HTTP client for the overlay's route advertisement endpoint

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::error::OverlayError;

/// Bounds both the construction-time probe and each push.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Payload accepted by the advertisement endpoint: the full route list,
/// comma-joined into a single string.
#[derive(Serialize)]
struct AdvertisePayload {
    #[serde(rename = "advertiseRoutes")]
    advertise_routes: String,
}

impl AdvertisePayload {
    fn new(routes: &[String]) -> Self {
        Self {
            advertise_routes: routes.join(","),
        }
    }
}

/// OverlayClient replaces the overlay's advertised route list with the full
/// set handed to each [`push`](OverlayClient::push) call.
///
/// The endpoint is fixed at construction. Cloning is cheap; clones share
/// the underlying HTTP connection pool.
#[derive(Clone, Debug)]
pub struct OverlayClient {
    http: reqwest::Client,
    endpoint: String,
}

impl OverlayClient {
    /// Create a client and verify the endpoint answers a GET on its root
    /// with a success status, so misconfiguration is caught before any
    /// watch starts.
    pub async fn connect(endpoint: impl Into<String>) -> Result<Self, OverlayError> {
        let client = Self::new_unchecked(endpoint);
        let response = client
            .http
            .get(&client.endpoint)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|source| OverlayError::Unreachable {
                endpoint: client.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OverlayError::ProbeStatus {
                endpoint: client.endpoint.clone(),
                status,
            });
        }

        Ok(client)
    }

    /// Create a client without probing the endpoint.
    pub fn new_unchecked(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// The advertisement endpoint this client was configured with.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Replace the overlay's advertised routes with `routes`.
    ///
    /// Issues exactly one POST per call; no retry, no batching. Callers
    /// decide when a push is warranted and what to do with a failure.
    pub async fn push(&self, routes: &[String]) -> Result<(), OverlayError> {
        debug!("pushing {} routes to {}", routes.len(), self.endpoint);

        let response = self
            .http
            .post(&self.endpoint)
            .timeout(REQUEST_TIMEOUT)
            .json(&AdvertisePayload::new(routes))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OverlayError::PushStatus {
                endpoint: self.endpoint.clone(),
                status,
            });
        }

        Ok(())
    }
}
