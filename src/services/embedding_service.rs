use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Embedding request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Embedding service returned status {0}")]
    RemoteStatus(u16),

    #[error("Embedding response contained no vector")]
    MissingVector,

    #[error("Embedding has {got} dimensions, expected {expected}")]
    DimensionMismatch { got: usize, expected: usize },
}

/// Anything that can turn text into an embedding vector. The HTTP client
/// below is the production implementation; the ingestion pipeline takes this
/// trait so its skip-on-failure behavior is testable without a remote call.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Convert text to its embedding vector. The input is passed to the
    /// model unmodified; for a fixed model version, identical input yields
    /// identical output.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

/// Client for the remote embedding model. One remote call per `embed`
/// invocation: no caching, no batching, no truncation. Text that the remote
/// endpoint rejects (for size or anything else) surfaces as a remote error;
/// callers that need to embed long text chunk it themselves first.
pub struct EmbeddingService {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl EmbeddingService {
    pub fn new(endpoint: String, api_key: String, model: String, dimensions: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
            dimensions,
        }
    }

    pub fn from_config() -> Self {
        let embedding = &config::config().embedding;
        Self::new(
            embedding.endpoint.clone(),
            embedding.api_key.clone(),
            embedding.model.clone(),
            embedding.dimensions,
        )
    }
}

#[async_trait]
impl Embedder for EmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/embeddings", self.endpoint.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.model,
                "input": text,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbeddingError::RemoteStatus(status.as_u16()));
        }

        let body: EmbeddingResponse = response.json().await?;
        extract_vector(body, self.dimensions)
    }
}

/// Pull the vector out of a success response. A missing, empty, or
/// wrong-sized vector is an error; a partial vector must never reach the
/// retrieval index.
fn extract_vector(
    body: EmbeddingResponse,
    expected_dimensions: usize,
) -> Result<Vec<f32>, EmbeddingError> {
    let row = body
        .data
        .into_iter()
        .next()
        .ok_or(EmbeddingError::MissingVector)?;

    if row.embedding.is_empty() {
        return Err(EmbeddingError::MissingVector);
    }

    if expected_dimensions != 0 && row.embedding.len() != expected_dimensions {
        return Err(EmbeddingError::DimensionMismatch {
            got: row.embedding.len(),
            expected: expected_dimensions,
        });
    }

    Ok(row.embedding)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(vectors: Vec<Vec<f32>>) -> EmbeddingResponse {
        EmbeddingResponse {
            data: vectors
                .into_iter()
                .map(|embedding| EmbeddingRow { embedding })
                .collect(),
        }
    }

    #[test]
    fn extracts_first_vector() {
        let body = response(vec![vec![0.1, 0.2, 0.3]]);
        assert_eq!(extract_vector(body, 3).unwrap(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn empty_data_is_an_error() {
        assert!(matches!(
            extract_vector(response(vec![]), 3),
            Err(EmbeddingError::MissingVector)
        ));
    }

    #[test]
    fn empty_vector_is_an_error() {
        assert!(matches!(
            extract_vector(response(vec![vec![]]), 0),
            Err(EmbeddingError::MissingVector)
        ));
    }

    #[test]
    fn wrong_dimension_count_is_an_error() {
        assert!(matches!(
            extract_vector(response(vec![vec![0.5; 4]]), 3),
            Err(EmbeddingError::DimensionMismatch { got: 4, expected: 3 })
        ));
    }

    #[test]
    fn zero_expectation_skips_the_dimension_check() {
        let body = response(vec![vec![0.5; 7]]);
        assert_eq!(extract_vector(body, 0).unwrap().len(), 7);
    }

    #[test]
    fn parses_remote_response_shape() {
        let json = r#"{"data":[{"embedding":[0.25,-0.5]}]}"#;
        let body: EmbeddingResponse = serde_json::from_str(json).unwrap();
        assert_eq!(extract_vector(body, 2).unwrap(), vec![0.25, -0.5]);
    }
}
