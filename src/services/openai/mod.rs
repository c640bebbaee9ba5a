//! Thin wrappers around the OpenAI chat, audio, and embedding endpoints.
//!
//! One [`OpenAiClient`] is built at startup and shared (`Arc`) by every
//! wrapper, so all calls reuse the same connection pool and credentials.

mod audio;
mod chat;
mod embeddings;
mod prompts;

pub use audio::{AudioClient, SpeechOptions};
pub use chat::{ChatSession, StreamEvent, parse_stream_line};
pub use embeddings::EmbeddingClient;
pub use prompts::youtube_summary_prompt;

use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

use crate::error::OpenAiError;
use crate::models::OpenAiConfig;

/// Authenticated HTTP handle for the OpenAI API.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    /// Build the shared client. Fails when no API key is configured; there
    /// is no partially-initialized client to call into afterwards.
    pub fn new(config: &OpenAiConfig) -> Result<Self, OpenAiError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| OpenAiError::ConnectionError("missing OpenAI API key".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OpenAiError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.api_key)
    }

    /// Send a request and turn non-2xx responses into [`OpenAiError::ServerError`].
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, OpenAiError> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OpenAiError::ServerError { status, body });
        }

        Ok(response)
    }
}

#[cfg(test)]
pub(crate) fn test_client(base_url: &str) -> std::sync::Arc<OpenAiClient> {
    let config = OpenAiConfig {
        base_url: base_url.to_string(),
        api_key: Some("sk-test".to_string()),
        ..Default::default()
    };
    std::sync::Arc::new(OpenAiClient::new(&config).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_api_key() {
        let result = OpenAiClient::new(&OpenAiConfig::default());
        assert!(matches!(result, Err(OpenAiError::ConnectionError(_))));
    }

    #[test]
    fn test_base_url_trimming() {
        let config = OpenAiConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let client = OpenAiClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/v1");
    }

    #[tokio::test]
    async fn test_server_error_carries_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/embeddings")
            .match_header("authorization", "Bearer sk-test")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client.send(client.post("embeddings")).await.unwrap_err();
        match err {
            OpenAiError::ServerError { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
