//! Infrastructure shared by the items service binaries: layered
//! configuration, the [`error::AppError`] taxonomy and its HTTP rendering,
//! tracing bootstrap, and the request middleware every router installs.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;

pub use axum;
pub use tracing;
pub use validator;
