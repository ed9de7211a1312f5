use crate::embeddings::{validate_embeddings, EmbeddingProvider};
use crate::error::{Result, VectorStoreError};
use std::future::Future;
use std::time::Duration;

/// Bounded retry with exponential backoff for embedding calls
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Per-attempt deadline; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl RetryPolicy {
    /// One attempt, no deadline
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            timeout: None,
        }
    }

    /// Delay before retry number `attempt` (1-based)
    #[must_use]
    pub fn backoff(&self, attempt: usize) -> Duration {
        let exp = attempt.saturating_sub(1).min(16) as u32;
        self.base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay)
    }
}

/// Run `fut` under an optional deadline, mapping expiry to [`VectorStoreError::Timeout`]
pub async fn with_timeout<T, F>(operation: &str, limit: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let Some(limit) = limit else {
        return fut.await;
    };
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| VectorStoreError::Timeout {
            operation: operation.to_string(),
            after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        })?
}

/// Embed `texts`, retrying retryable failures per `policy`.
///
/// Output shape is validated on every attempt. When all attempts fail the
/// last error is returned.
pub async fn embed_with_retry(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    policy: &RetryPolicy,
) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0usize;
    loop {
        attempt += 1;
        let result = with_timeout("embedding request", policy.timeout, provider.embed_batch(texts))
            .await
            .and_then(|vectors| {
                validate_embeddings(texts.len(), &vectors, provider.dimension())?;
                Ok(vectors)
            });

        match result {
            Ok(vectors) => return Ok(vectors),
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                let delay = policy.backoff(attempt);
                log::warn!(
                    "Embedding attempt {attempt}/{max_attempts} failed: {err}; retrying in {} ms",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                if attempt > 1 {
                    log::warn!("Embedding failed after {attempt} attempts: {err}");
                }
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
        width: usize,
    }

    impl Flaky {
        fn new(failures: usize, width: usize) -> Self {
            Self {
                failures,
                calls: AtomicUsize::new(0),
                width,
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for Flaky {
        fn model_id(&self) -> &str {
            "flaky"
        }

        fn dimension(&self) -> usize {
            2
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(VectorStoreError::EmbeddingError(format!("outage {call}")));
            }
            Ok(texts.iter().map(|_| vec![0.5; self.width]).collect())
        }
    }

    struct Unauthorized {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for Unauthorized {
        fn model_id(&self) -> &str {
            "unauthorized"
        }

        fn dimension(&self) -> usize {
            2
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(VectorStoreError::EmbeddingRejected {
                status: 401,
                message: "invalid api key".to_string(),
            })
        }
    }

    struct Stalled;

    #[async_trait]
    impl EmbeddingProvider for Stalled {
        fn model_id(&self) -> &str {
            "stalled"
        }

        fn dimension(&self) -> usize {
            2
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }
    }

    fn texts() -> Vec<String> {
        vec!["a".to_string(), "b".to_string()]
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            timeout: None,
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
        assert_eq!(policy.backoff(4), Duration::from_millis(500));
        assert_eq!(policy.backoff(40), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failures() {
        let provider = Flaky::new(2, 2);
        let vectors = embed_with_retry(&provider, &texts(), &RetryPolicy::default())
            .await
            .unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn surfaces_last_error_when_exhausted() {
        let provider = Flaky::new(10, 2);
        let err = embed_with_retry(&provider, &texts(), &RetryPolicy::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Embedding error: outage 2");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_width_is_retried_then_reported() {
        let provider = Flaky::new(0, 3);
        let policy = RetryPolicy {
            max_attempts: 2,
            ..RetryPolicy::default()
        };
        let err = embed_with_retry(&provider, &texts(), &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::EmbeddingError(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_request_is_not_retried() {
        let provider = Unauthorized {
            calls: AtomicUsize::new(0),
        };
        let err = embed_with_retry(&provider, &texts(), &RetryPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VectorStoreError::EmbeddingRejected { status: 401, .. }
        ));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_provider_times_out() {
        let policy = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(10),
            timeout: Some(Duration::from_millis(50)),
        };
        let err = embed_with_retry(&Stalled, &texts(), &policy)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VectorStoreError::Timeout { after_ms: 50, .. }
        ));
    }

    #[tokio::test]
    async fn empty_input_never_calls_provider() {
        let provider = Flaky::new(10, 2);
        let vectors = embed_with_retry(&provider, &[], &RetryPolicy::none())
            .await
            .unwrap();
        assert!(vectors.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
