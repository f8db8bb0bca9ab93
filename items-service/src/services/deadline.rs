use service_core::error::AppError;
use std::future::Future;
use std::time::Duration;

/// Run a store call under `deadline`.
///
/// The timer nests inside the caller's future: if the request is dropped
/// first, the store call is dropped with it.
pub async fn within<T, F>(operation: &'static str, deadline: Duration, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::timeout(operation, deadline)),
    }
}
