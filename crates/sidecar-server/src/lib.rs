//! HTTP surface of the PGBouncer monitoring sidecar.
//!
//! Routes are collected on a [`RegistryBuilder`], frozen into a [`Registry`]
//! and served through [`server::router`]. Each route is a [`Guarded`]
//! producer: one allowed method, one deadline, one child cancellation scope
//! per request.

pub mod error;
pub mod guard;
pub mod registry;
pub mod response;
pub mod routes;
pub mod server;
pub mod shutdown;

pub use error::AppError;
pub use guard::Guarded;
pub use registry::{Registry, RegistryBuilder};
pub use routes::{register_all, RouteOptions};
