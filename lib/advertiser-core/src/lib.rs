//! Core route state for the overlay route advertiser
//!
//! This library provides:
//! - Route parsing and host-route normalization
//! - RouteSet, the mutation-tracked set of advertised routes
//! - Static route seeding from configuration

pub mod error;
pub mod routes;
pub mod seed;

pub use error::{CoreError, Result};
pub use routes::{Route, RouteSet};
pub use seed::{seed_static_routes, split_list};
