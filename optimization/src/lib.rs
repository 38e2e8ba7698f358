//! Translation layer in front of the hosted optimization service.
//!
//! Requests arrive as plain JSON or as a gzip-compressed upload
//! ([`decode`]), are validated against the [`request`] schema and forwarded
//! through a [`FleetRouting`] implementation. Upstream failures are mapped
//! onto HTTP statuses by [`status::map_upstream_error`].

pub mod client;
pub mod config;
pub mod decode;
pub mod errors;
pub mod metrics_defs;
pub mod request;
pub mod status;
pub mod translator;

pub use client::{CloudFleetRouting, FleetRouting};
pub use errors::{OptimizationError, UpstreamError};
pub use request::OptimizeToursRequest;
pub use translator::optimize_tours;
