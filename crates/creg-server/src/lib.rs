//! HTTP server for the certificate registry.
//!
//! Exposes issuance, verification, and per-student listing as a small JSON
//! API over a shared [`creg_engine::Registry`]. Registry calls run on the
//! blocking pool.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ApiError, ErrorBody, ServerError, ServerResult};
pub use server::RegistryServer;
