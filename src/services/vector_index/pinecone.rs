//! Pinecone backend over the REST API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{IndexHandle, VectorIndexService};
use crate::error::VectorIndexError;
use crate::models::{
    DistanceMetric, IndexDescriptor, Metadata, QueryMatch, Record, ServerlessSpec, VectorDriver,
    VectorIndexConfig,
};

const API_VERSION: &str = "2024-07";

#[derive(Debug, Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexModel>,
}

#[derive(Debug, Deserialize)]
struct IndexModel {
    name: String,
    #[serde(default)]
    host: String,
}

#[derive(Debug, Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: u32,
    metric: DistanceMetric,
    spec: CreateSpec<'a>,
}

#[derive(Debug, Serialize)]
struct CreateSpec<'a> {
    serverless: &'a ServerlessSpec,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [Record],
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<MatchModel>,
}

#[derive(Debug, Deserialize)]
struct MatchModel {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Metadata>,
}

/// Shared request plumbing for the control and data planes.
#[derive(Debug, Clone)]
struct Transport {
    client: Client,
    api_key: String,
}

impl Transport {
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    async fn error_body(response: Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        format!("status {}: {}", status, body)
    }
}

/// Pinecone vector index backend.
pub struct PineconeBackend {
    transport: Transport,
    base_url: String,
    namespace: Option<String>,
}

impl PineconeBackend {
    pub fn new(config: &VectorIndexConfig) -> Result<Self, VectorIndexError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| VectorIndexError::ConnectionError("missing Pinecone API key".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VectorIndexError::ConnectionError(e.to_string()))?;

        Ok(Self {
            transport: Transport { client, api_key },
            base_url: config.endpoint().trim_end_matches('/').to_string(),
            namespace: config.namespace.clone(),
        })
    }

    async fn describe_index(&self, name: &str) -> Result<IndexModel, VectorIndexError> {
        let url = format!("{}/indexes/{}", self.base_url, name);
        let response = self
            .transport
            .authorize(self.transport.client.get(&url))
            .send()
            .await
            .map_err(|e| VectorIndexError::ClientError(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(VectorIndexError::NotFound(name.to_string()));
        }
        if !response.status().is_success() {
            return Err(VectorIndexError::ClientError(
                Transport::error_body(response).await,
            ));
        }

        response
            .json()
            .await
            .map_err(|e| VectorIndexError::ClientError(e.to_string()))
    }
}

/// Data-plane hosts come back without a scheme.
fn host_url(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", host.trim_end_matches('/'))
    }
}

#[async_trait]
impl VectorIndexService for PineconeBackend {
    async fn health_check(&self) -> Result<bool, VectorIndexError> {
        self.list_indexes()
            .await
            .map(|_| true)
            .map_err(|e| VectorIndexError::ConnectionError(e.to_string()))
    }

    async fn list_indexes(&self) -> Result<Vec<String>, VectorIndexError> {
        let url = format!("{}/indexes", self.base_url);
        let response = self
            .transport
            .authorize(self.transport.client.get(&url))
            .send()
            .await
            .map_err(|e| VectorIndexError::ListError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VectorIndexError::ListError(
                Transport::error_body(response).await,
            ));
        }

        let list: IndexList = response
            .json()
            .await
            .map_err(|e| VectorIndexError::ListError(e.to_string()))?;

        Ok(list.indexes.into_iter().map(|i| i.name).collect())
    }

    async fn create_index(&self, descriptor: &IndexDescriptor) -> Result<(), VectorIndexError> {
        let url = format!("{}/indexes", self.base_url);
        let request = CreateIndexRequest {
            name: &descriptor.name,
            dimension: descriptor.dimension,
            metric: descriptor.metric,
            spec: CreateSpec {
                serverless: &descriptor.spec,
            },
        };

        let response = self
            .transport
            .authorize(self.transport.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| VectorIndexError::CreateError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VectorIndexError::CreateError(
                Transport::error_body(response).await,
            ));
        }

        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<(), VectorIndexError> {
        let url = format!("{}/indexes/{}", self.base_url, name);
        let response = self
            .transport
            .authorize(self.transport.client.delete(&url))
            .send()
            .await
            .map_err(|e| VectorIndexError::DeleteError(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(VectorIndexError::NotFound(name.to_string()));
        }
        if !response.status().is_success() {
            return Err(VectorIndexError::DeleteError(
                Transport::error_body(response).await,
            ));
        }

        Ok(())
    }

    async fn get_index(&self, name: &str) -> Result<Box<dyn IndexHandle>, VectorIndexError> {
        let model = self.describe_index(name).await?;
        if model.host.is_empty() {
            return Err(VectorIndexError::ClientError(format!(
                "index '{}' has no host yet",
                name
            )));
        }

        Ok(Box::new(PineconeIndex {
            transport: self.transport.clone(),
            name: model.name,
            host: host_url(&model.host),
            namespace: self.namespace.clone(),
        }))
    }

    fn driver(&self) -> VectorDriver {
        VectorDriver::Pinecone
    }
}

/// Data-plane handle for one Pinecone index.
pub struct PineconeIndex {
    transport: Transport,
    name: String,
    host: String,
    namespace: Option<String>,
}

#[async_trait]
impl IndexHandle for PineconeIndex {
    async fn upsert(&self, batch: Vec<Record>) -> Result<(), VectorIndexError> {
        if batch.is_empty() {
            return Ok(());
        }

        let url = format!("{}/vectors/upsert", self.host);
        let request = UpsertRequest {
            vectors: &batch,
            namespace: self.namespace.as_deref(),
        };

        let response = self
            .transport
            .authorize(self.transport.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| VectorIndexError::UpsertError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VectorIndexError::UpsertError(
                Transport::error_body(response).await,
            ));
        }

        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<QueryMatch>, VectorIndexError> {
        let url = format!("{}/query", self.host);
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };

        let response = self
            .transport
            .authorize(self.transport.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| VectorIndexError::QueryError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VectorIndexError::QueryError(
                Transport::error_body(response).await,
            ));
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| VectorIndexError::QueryError(e.to_string()))?;

        Ok(body
            .matches
            .into_iter()
            .map(|m| QueryMatch {
                id: m.id,
                score: m.score,
                metadata: m.metadata.unwrap_or_default(),
            })
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
