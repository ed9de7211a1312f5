//! Client for OpenAI-compatible `/embeddings` endpoints.

use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use crate::error::{Result, VectorStoreError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Single-attempt embeddings client; retries are the caller's business.
#[derive(Clone, Debug)]
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    model_id: String,
    dimension: usize,
}

impl HttpEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &config.api_key {
            let auth = format!("Bearer {}", key.trim());
            let value = HeaderValue::from_str(&auth)
                .map_err(|_| VectorStoreError::invalid_config("invalid embedding API key"))?;
            headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| {
                VectorStoreError::invalid_config(format!("failed to build HTTP client: {e}"))
            })?;
        let endpoint = format!("{}/embeddings", config.base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            endpoint,
            model_id: config.model_id.clone(),
            dimension: config.dimension,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model_id,
            input: texts,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                VectorStoreError::EmbeddingError(format!("request to {} failed: {e}", self.endpoint))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(status_error(status, body));
        }

        let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            VectorStoreError::EmbeddingError(format!("malformed embedding response: {e}"))
        })?;
        parsed.data.sort_by_key(|entry| entry.index);
        Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
    }
}

/// Server-side trouble (5xx) and throttling (429) are worth retrying; any
/// other refusal will fail the same way again.
fn status_error(status: StatusCode, body: String) -> VectorStoreError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        VectorStoreError::EmbeddingError(format!("embeddings request failed ({status}): {body}"))
    } else {
        VectorStoreError::EmbeddingRejected {
            status: status.as_u16(),
            message: body,
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::EmbeddingMode;
    use std::time::Duration;

    fn config(base_url: &str) -> EmbeddingConfig {
        EmbeddingConfig {
            mode: EmbeddingMode::Http,
            base_url: base_url.to_string(),
            request_timeout: Duration::from_millis(500),
            ..EmbeddingConfig::default()
        }
    }

    #[test]
    fn endpoint_joins_base_url() {
        let embedder = HttpEmbedder::new(&config("http://localhost:9999/v1/")).unwrap();
        assert_eq!(embedder.endpoint(), "http://localhost:9999/v1/embeddings");
        assert_eq!(embedder.dimension(), 768);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_embedding_error() {
        let embedder = HttpEmbedder::new(&config("http://127.0.0.1:9/v1")).unwrap();
        let err = embedder
            .embed_batch(&["hello".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::EmbeddingError(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn empty_batch_skips_the_network() {
        let embedder = HttpEmbedder::new(&config("http://127.0.0.1:9/v1")).unwrap();
        assert!(embedder.embed_batch(&[]).await.unwrap().is_empty());
    }

    #[test]
    fn only_server_errors_and_throttling_are_retryable() {
        for code in [500u16, 502, 503, 429] {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(status_error(status, String::new()).is_retryable(), "{code}");
        }
        for code in [400u16, 401, 403, 404, 422] {
            let status = StatusCode::from_u16(code).unwrap();
            let err = status_error(status, "nope".to_string());
            assert!(!err.is_retryable(), "{code}");
            assert!(matches!(
                err,
                VectorStoreError::EmbeddingRejected { status, .. } if status == code
            ));
        }
    }

    #[test]
    fn invalid_api_key_is_config_error() {
        let bad = EmbeddingConfig {
            api_key: Some("line\nbreak".to_string()),
            ..config("http://localhost:9999/v1")
        };
        assert!(matches!(
            HttpEmbedder::new(&bad),
            Err(VectorStoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn response_is_reordered_by_index() {
        let mut parsed: EmbeddingResponse = serde_json::from_str(
            r#"{"data":[{"embedding":[2.0],"index":1},{"embedding":[1.0],"index":0}]}"#,
        )
        .unwrap();
        parsed.data.sort_by_key(|entry| entry.index);
        assert_eq!(parsed.data[0].embedding, vec![1.0]);
    }
}
