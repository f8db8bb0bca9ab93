pub mod metrics;
pub mod security_headers;
pub mod timeout;
pub mod tracing;

pub use self::metrics::metrics_middleware;
pub use security_headers::security_headers_middleware;
pub use timeout::request_timeout_middleware;
pub use self::tracing::{REQUEST_ID_HEADER, request_id_middleware};
