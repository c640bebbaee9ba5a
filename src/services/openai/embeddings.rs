//! Embedding client for generating text embeddings.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::OpenAiClient;
use crate::error::OpenAiError;

/// Request body for the /embeddings endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

/// Response from the /embeddings endpoint.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Client for the embeddings endpoint.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    client: Arc<OpenAiClient>,
    model: String,
}

impl EmbeddingClient {
    pub fn new(client: Arc<OpenAiClient>, model: impl Into<String>) -> Self {
        tracing::info!("embedding client initialized");
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate the embedding for a single text.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, OpenAiError> {
        let embeddings = self.embed_batch(vec![text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| OpenAiError::InvalidResponse("empty embedding response".to_string()))
    }

    /// Generate embeddings for a batch of texts, in input order.
    pub async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, OpenAiError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbedRequest {
            input: &texts,
            model: &self.model,
        };

        let response = self
            .client
            .send(self.client.post("embeddings").json(&request))
            .await
            .inspect_err(|e| tracing::error!(model = %self.model, error = %e, "embedding request failed"))?;

        let mut body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| OpenAiError::InvalidResponse(e.to_string()))?;

        if body.data.len() != texts.len() {
            return Err(OpenAiError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                body.data.len()
            )));
        }

        body.data.sort_by_key(|d| d.index);
        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }

    /// Render an embedding for the terminal: its dimension, then the values.
    pub fn display(embedding: &[f32]) -> String {
        let rule = "-".repeat(67);
        format!(
            "{rule}\nDimension of text embedding: {}\n{rule}\n{:?}\n{rule}\n",
            embedding.len(),
            embedding
        )
    }
}
