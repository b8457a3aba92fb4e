//! Embedding providers.
//!
//! [`EmbeddingProvider`] is the single seam the pipeline uses for both of its
//! embedding passes: boundary detection inside the chunker and the final
//! vectors handed to the store. Sharing one provider instance keeps the two
//! uses configured identically.
//!
//! [`OpenAiEmbeddingProvider`] talks to any OpenAI-compatible `/embeddings`
//! endpoint. [`MockEmbeddingProvider`] produces deterministic hash-derived
//! vectors for tests and offline runs.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::types::IngestError;

/// A batch text-to-vector capability.
///
/// Implementations must be order-preserving: `output[i]` embeds `texts[i]`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short identifier for logging (model name or "mock").
    fn id(&self) -> &str;

    /// Fixed output dimensionality, when the provider can declare it ahead
    /// of the first call.
    fn dimensions(&self) -> Option<usize>;

    /// Embeds a batch of texts, one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IngestError>;
}

/// Client for OpenAI-compatible embedding endpoints.
///
/// Inputs beyond `batch_size` are split into sequential sub-batches.
/// Rate-limit and server errors are retried with capped exponential backoff;
/// auth and client errors fail immediately.
pub struct OpenAiEmbeddingProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimensions: Option<usize>,
    batch_size: usize,
    max_retries: usize,
}

impl OpenAiEmbeddingProvider {
    const DEFAULT_BATCH_SIZE: usize = 64;
    const DEFAULT_MAX_RETRIES: usize = 3;

    /// Builds a provider for `model` against `base_url` (e.g.
    /// `https://api.openai.com/v1`).
    pub fn new(
        api_key: impl AsRef<str>,
        base_url: impl AsRef<str>,
        model: impl Into<String>,
    ) -> Result<Self, IngestError> {
        let api_key = api_key.as_ref().trim();
        let model = model.into();
        if api_key.is_empty() {
            return Err(IngestError::Config("missing embedding API key".into()));
        }
        if model.trim().is_empty() {
            return Err(IngestError::Config("missing embedding model name".into()));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {api_key}");
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|err| IngestError::Config(format!("invalid API key: {err}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .default_headers(headers)
            .use_rustls_tls()
            .build()?;

        let endpoint = format!("{}/embeddings", base_url.as_ref().trim_end_matches('/'));
        Ok(Self {
            client,
            endpoint,
            model,
            dimensions: None,
            batch_size: Self::DEFAULT_BATCH_SIZE,
            max_retries: Self::DEFAULT_MAX_RETRIES,
        })
    }

    /// Requests a specific output dimensionality from the endpoint.
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    /// Caps the number of texts sent per request.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Sets the attempt budget for retryable failures.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    async fn send_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, IngestError> {
        let mut attempt = 0usize;
        loop {
            let request = EmbeddingRequest {
                model: &self.model,
                input: inputs,
                dimensions: self.dimensions,
            };
            match self.client.post(&self.endpoint).json(&request).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let mut parsed: EmbeddingResponse =
                            response.json().await.map_err(|err| {
                                IngestError::Embedding(format!(
                                    "invalid embedding response: {err}"
                                ))
                            })?;
                        parsed.data.sort_by_key(|entry| entry.index);
                        if parsed.data.len() != inputs.len() {
                            return Err(IngestError::Embedding(format!(
                                "provider returned {} embeddings for {} inputs",
                                parsed.data.len(),
                                inputs.len()
                            )));
                        }
                        return Ok(parsed
                            .data
                            .into_iter()
                            .map(|entry| entry.embedding)
                            .collect());
                    }

                    if Self::retryable_status(status) && attempt + 1 < self.max_retries {
                        attempt += 1;
                        tracing::warn!(%status, attempt, "embedding request throttled, retrying");
                        tokio::time::sleep(Self::backoff(attempt)).await;
                        continue;
                    }
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    return Err(IngestError::Embedding(format!(
                        "embedding request failed ({status}): {body}"
                    )));
                }
                Err(err) => {
                    if Self::retryable_transport(&err) && attempt + 1 < self.max_retries {
                        attempt += 1;
                        tracing::warn!(error = %err, attempt, "embedding transport error, retrying");
                        tokio::time::sleep(Self::backoff(attempt)).await;
                        continue;
                    }
                    return Err(IngestError::Embedding(err.to_string()));
                }
            }
        }
    }

    fn retryable_status(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    fn retryable_transport(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect() || err.is_request()
    }

    fn backoff(attempt: usize) -> Duration {
        let capped = attempt.min(5) as u32;
        Duration::from_millis(250 * (1 << capped))
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn id(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IngestError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.send_batch(batch).await?);
        }
        Ok(vectors)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// Deterministic offline provider.
///
/// Vectors are L2-normalized bags of hashed words, so texts sharing
/// vocabulary land close together and identical texts embed identically.
#[derive(Debug, Clone)]
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self { dimensions: 32 }
    }

    #[must_use]
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions.max(1);
        self
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn id(&self) -> &str {
        "mock"
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dimensions)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IngestError> {
        Ok(texts
            .iter()
            .map(|text| bag_of_words_vector(text, self.dimensions))
            .collect())
    }
}

fn bag_of_words_vector(text: &str, dimensions: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dimensions];
    for word in text.split_whitespace() {
        let word: String = word
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        if word.is_empty() {
            continue;
        }
        let mut hasher = DefaultHasher::new();
        word.hash(&mut hasher);
        vector[(hasher.finish() % dimensions as u64) as usize] += 1.0;
    }
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut vector {
            *value /= norm;
        }
    } else {
        vector[0] = 1.0;
    }
    vector
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn mock_provider_is_deterministic() {
        let provider = MockEmbeddingProvider::new();
        let inputs = vec![
            "hello world".to_string(),
            "goodbye world".to_string(),
            "hello world".to_string(),
        ];

        let first = provider.embed_batch(&inputs).await.unwrap();
        let second = provider.embed_batch(&inputs).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0], first[2]);
        assert_ne!(first[0], first[1]);
    }

    #[tokio::test]
    async fn mock_provider_output_matches_declared_dimensions() {
        let provider = MockEmbeddingProvider::new().with_dimensions(16);
        let vectors = provider
            .embed_batch(&["one".to_string(), "two".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 2);
        for vector in &vectors {
            assert_eq!(Some(vector.len()), provider.dimensions());
        }
    }

    #[tokio::test]
    async fn openai_provider_reorders_by_index() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/embeddings")
                    .header("authorization", "Bearer test-key");
                then.status(200).json_body(json!({
                    "data": [
                        { "index": 1, "embedding": [0.0, 1.0] },
                        { "index": 0, "embedding": [1.0, 0.0] }
                    ]
                }));
            })
            .await;

        let provider =
            OpenAiEmbeddingProvider::new("test-key", server.base_url(), "test-model").unwrap();
        let vectors = provider
            .embed_batch(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn openai_provider_rejects_count_mismatch() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(200).json_body(json!({
                    "data": [ { "index": 0, "embedding": [1.0] } ]
                }));
            })
            .await;

        let provider =
            OpenAiEmbeddingProvider::new("test-key", server.base_url(), "test-model").unwrap();
        let err = provider
            .embed_batch(&["first".to_string(), "second".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Embedding(_)));
    }

    #[tokio::test]
    async fn openai_provider_retries_after_throttling() {
        let server = MockServer::start_async().await;
        let mut throttled = server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(429).body("slow down");
            })
            .await;

        let provider =
            OpenAiEmbeddingProvider::new("test-key", server.base_url(), "test-model").unwrap();
        let call = tokio::spawn(async move { provider.embed_batch(&["text".to_string()]).await });

        // Once the first request has been throttled, swap in a healthy
        // endpoint so the retry (after backoff) lands on a 200.
        while throttled.hits_async().await == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        throttled.delete_async().await;
        let healthy = server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(200).json_body(json!({
                    "data": [ { "index": 0, "embedding": [1.0, 0.0] } ]
                }));
            })
            .await;

        let vectors = call.await.unwrap().unwrap();
        healthy.assert_async().await;
        assert_eq!(vectors, vec![vec![1.0, 0.0]]);
    }

    #[tokio::test]
    async fn openai_provider_caps_retry_attempts() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(429).body("slow down");
            })
            .await;

        let provider = OpenAiEmbeddingProvider::new("test-key", server.base_url(), "test-model")
            .unwrap()
            .with_max_retries(2);
        let err = provider
            .embed_batch(&["text".to_string()])
            .await
            .unwrap_err();

        // Initial attempt plus exactly one retry, then the error surfaces.
        mock.assert_hits_async(2).await;
        assert!(matches!(err, IngestError::Embedding(_)));
    }

    #[tokio::test]
    async fn openai_provider_surfaces_auth_failure_without_retry() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(401).body("invalid api key");
            })
            .await;

        let provider =
            OpenAiEmbeddingProvider::new("bad-key", server.base_url(), "test-model").unwrap();
        let err = provider
            .embed_batch(&["text".to_string()])
            .await
            .unwrap_err();

        // Exactly one hit: auth failures are not retried.
        mock.assert_async().await;
        assert!(matches!(err, IngestError::Embedding(_)));
    }

    #[tokio::test]
    async fn empty_input_short_circuits() {
        let provider =
            OpenAiEmbeddingProvider::new("test-key", "http://localhost:1", "test-model").unwrap();
        let vectors = provider.embed_batch(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }

    #[test]
    fn provider_construction_validates_inputs() {
        assert!(OpenAiEmbeddingProvider::new("", "http://x", "model").is_err());
        assert!(OpenAiEmbeddingProvider::new("key", "http://x", "  ").is_err());
    }
}
