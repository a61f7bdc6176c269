//! Overlay network integration
//!
//! Pushes the advertiser's full route list to the overlay's local HTTP API.

pub mod client;
pub mod error;

pub use client::OverlayClient;
pub use error::{OverlayError, Result};
