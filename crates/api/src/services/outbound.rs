//! Outbound HTTP delivery and background task tracking.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tokio::task::JoinHandle;

/// Failure of a JSON POST after all retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("Endpoint rejected the request with status {status}")]
    Rejected { status: u16 },

    #[error("Endpoint kept failing with status {status}")]
    ServerError { status: u16 },
}

/// Builds the shared HTTP client for an outbound provider.
pub fn build_client(timeout: Duration) -> Result<Client, DeliveryError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DeliveryError::Transport(e.to_string()))
}

/// POSTs `body` as JSON, retrying transport failures and 5xx responses.
///
/// Client errors are not retried. Returns the number of attempts made.
pub async fn post_json_with_retry<T: Serialize + ?Sized>(
    client: &Client,
    url: &str,
    body: &T,
    max_retries: u32,
) -> Result<u32, DeliveryError> {
    let mut last_error = None;
    for attempt in 0..=max_retries {
        if attempt > 0 {
            // Exponential backoff: 100ms, 200ms, 400ms, etc.
            tokio::time::sleep(Duration::from_millis(100u64 << (attempt - 1).min(6))).await;
        }

        match client.post(url).json(body).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!(url = %url, attempt = attempt, "Outbound request delivered");
                return Ok(attempt + 1);
            }
            Ok(resp) if resp.status().is_server_error() => {
                let status = resp.status().as_u16();
                tracing::debug!(url = %url, status = status, attempt = attempt, "Retrying after server error");
                last_error = Some(DeliveryError::ServerError { status });
            }
            Ok(resp) => {
                return Err(DeliveryError::Rejected {
                    status: resp.status().as_u16(),
                });
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, attempt = attempt, "Retrying after transport error");
                last_error = Some(DeliveryError::Transport(e.to_string()));
            }
        }
    }

    Err(last_error.unwrap_or_else(|| DeliveryError::Transport("no attempt made".to_string())))
}

/// Fire-and-forget tasks spawned by the alert sink.
///
/// The engine never awaits outbound effects; shutdown drains this set so an
/// emergency call in flight is not dropped.
#[derive(Clone, Default)]
pub struct OutboundTasks {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl OutboundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` on the current runtime. Without a runtime the task is
    /// dropped with a warning.
    pub fn spawn<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(task = name, "No async runtime, outbound task dropped");
            return;
        };

        let handle = runtime.spawn(task);
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Tasks that have not finished yet.
    pub fn pending(&self) -> usize {
        let handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// Waits for every tracked task. Returns false if the timeout elapsed
    /// first; the remaining tasks are aborted.
    pub async fn drain(&self, timeout: Duration) -> bool {
        let handles: Vec<_> = {
            let mut guard = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
            guard.drain(..).collect()
        };
        if handles.is_empty() {
            return true;
        }

        tracing::info!(tasks = handles.len(), "Waiting for outbound tasks");
        let aborts: Vec<_> = handles.iter().map(JoinHandle::abort_handle).collect();
        let all = async {
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::error!(error = %e, "Outbound task failed");
                }
            }
        };

        match tokio::time::timeout(timeout, all).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!("Timeout waiting for outbound tasks, aborting the rest");
                aborts.iter().for_each(|a| a.abort());
                false
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_server::serve_statuses;
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn test_post_succeeds_first_try() {
        let (url, served) = serve_statuses(vec!["200 OK"]).await;
        let client = build_client(Duration::from_secs(2)).unwrap();

        let attempts = post_json_with_retry(&client, &url, &serde_json::json!({"a": 1}), 3)
            .await
            .unwrap();
        assert_eq!(attempts, 1);
        assert_eq!(served.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_post_retries_server_errors() {
        let (url, served) =
            serve_statuses(vec!["503 Service Unavailable", "500 Internal Server Error", "204 No Content"]).await;
        let client = build_client(Duration::from_secs(2)).unwrap();

        let attempts = post_json_with_retry(&client, &url, &serde_json::json!({}), 3)
            .await
            .unwrap();
        assert_eq!(attempts, 3);
        assert_eq!(served.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_post_does_not_retry_client_errors() {
        let (url, served) = serve_statuses(vec!["400 Bad Request"]).await;
        let client = build_client(Duration::from_secs(2)).unwrap();

        let result = post_json_with_retry(&client, &url, &serde_json::json!({}), 3).await;
        assert_eq!(result, Err(DeliveryError::Rejected { status: 400 }));
        assert_eq!(served.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_post_gives_up_after_retries() {
        let (url, served) = serve_statuses(vec!["502 Bad Gateway"]).await;
        let client = build_client(Duration::from_secs(2)).unwrap();

        let result = post_json_with_retry(&client, &url, &serde_json::json!({}), 1).await;
        assert_eq!(result, Err(DeliveryError::ServerError { status: 502 }));
        assert_eq!(served.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_drain_waits_for_tasks() {
        let tasks = OutboundTasks::new();
        let done = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&done);

        tasks.spawn("test", async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            flag.store(true, Ordering::SeqCst);
        });

        assert!(tasks.drain(Duration::from_secs(2)).await);
        assert!(done.load(Ordering::SeqCst));
        assert_eq!(tasks.pending(), 0);
    }

    #[tokio::test]
    async fn test_drain_times_out() {
        let tasks = OutboundTasks::new();
        tasks.spawn("stuck", std::future::pending());
        assert!(!tasks.drain(Duration::from_millis(20)).await);
    }

    #[test]
    fn test_spawn_without_runtime_is_dropped() {
        let tasks = OutboundTasks::new();
        tasks.spawn("orphan", async {});
        assert_eq!(tasks.pending(), 0);
    }
}
