pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

/// Name reported to tracing and the MongoDB handshake.
pub const SERVICE_NAME: &str = "items-service";
