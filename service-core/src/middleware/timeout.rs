use crate::error::AppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Duration;

/// Bound the whole request by `limit`.
///
/// On elapse the handler future is dropped, which cancels whatever store call
/// it was waiting on, and the client gets a JSON 408 instead.
pub async fn request_timeout_middleware(
    State(limit): State<Duration>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();

    match tokio::time::timeout(limit, next.run(req)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(
                method = %method,
                uri = %uri,
                timeout_ms = limit.as_millis() as u64,
                "Request timed out"
            );
            AppError::RequestTimeout(limit).into_response()
        }
    }
}
