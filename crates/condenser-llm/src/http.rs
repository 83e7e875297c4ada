//! Shared HTTP plumbing for the network-backed providers

use crate::LlmError;
use std::future::Future;
use std::time::Duration;
use tokio::runtime::{Builder, Handle};
use tracing::warn;

/// Build the reqwest client used by every HTTP provider.
///
/// Pooling is disabled: a provider may be driven from short-lived runtimes
/// (see [`block_on`]), and a pooled connection does not survive the runtime
/// that opened it.
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(0)
        .build()
        .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))
}

/// Drive an async request to completion from synchronous code.
///
/// Must be called off the async executor, e.g. from `spawn_blocking`. Uses the
/// surrounding runtime when there is one, otherwise a private single-threaded
/// runtime.
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output, LlmError> {
    match Handle::try_current() {
        Ok(handle) => Ok(handle.block_on(future)),
        Err(_) => {
            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| LlmError::Other(format!("Failed to start runtime: {}", e)))?;
            Ok(runtime.block_on(future))
        }
    }
}

fn map_send_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Communication(format!("Request failed: {}", e))
    }
}

/// Send a request, retrying transport failures and 5xx responses with
/// exponential backoff (1s, 2s, 4s, ...).
///
/// Returns the first successful response. `404` maps to
/// [`LlmError::ModelNotAvailable`] and `429` to
/// [`LlmError::RateLimitExceeded`]; neither is retried. Timeouts are not
/// retried either: a backend that is too slow once will be too slow again.
pub(crate) async fn send_with_retries<B>(
    build: B,
    max_retries: u32,
    model: &str,
) -> Result<reqwest::Response, LlmError>
where
    B: Fn() -> reqwest::RequestBuilder,
{
    let mut attempts = 0;
    let mut last_error = None;

    while attempts < max_retries.max(1) {
        match build().send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(LlmError::ModelNotAvailable(model.to_string()));
                }
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    return Err(LlmError::RateLimitExceeded);
                }

                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                let error = LlmError::Communication(format!("HTTP {}: {}", status, error_text));
                if status.is_client_error() {
                    return Err(error);
                }
                last_error = Some(error);
            }
            Err(e) => {
                let error = map_send_error(e);
                if matches!(error, LlmError::Timeout) {
                    return Err(error);
                }
                last_error = Some(error);
            }
        }

        attempts += 1;
        if attempts < max_retries {
            let delay = Duration::from_secs(2u64.pow(attempts - 1));
            warn!("Inference request failed (attempt {}), retrying in {:?}", attempts, delay);
            tokio::time::sleep(delay).await;
        }
    }

    Err(last_error.unwrap_or_else(|| LlmError::Communication("Max retries exceeded".to_string())))
}

/// Decode a JSON body, mapping timeouts and parse failures
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, LlmError> {
    response.json::<T>().await.map_err(|e| {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::InvalidResponse(format!("Failed to parse response: {}", e))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_on_without_runtime() {
        let value = block_on(async { 21 * 2 }).unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_block_on_from_blocking_pool() {
        let value = tokio::task::spawn_blocking(|| block_on(async { "inside" }).unwrap())
            .await
            .unwrap();
        assert_eq!(value, "inside");
    }
}
