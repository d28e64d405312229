//! # HTTP Server Module
//!
//! Runnable HTTP surface of the REST shim.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/rest/v1/:table` - list / create
//! - `/rest/v1/:table/:id` - get / update / delete

pub mod config;
pub mod seed;
pub mod server;

pub use config::{ConfigError, ConfigResult, LogConfig, ServerConfig};
pub use seed::{build_registry, load_seed};
pub use server::HttpServer;
