//! Vector index abstraction layer.
//!
//! Backends (Pinecone, Qdrant) implement [`VectorIndexService`] for
//! index management and hand out an [`IndexHandle`] for data operations
//! on a single index. The batching and provisioning flows only ever see
//! these traits.

#[cfg(test)]
pub(crate) mod mock;
mod pinecone;
mod qdrant;

pub use pinecone::PineconeBackend;
pub use qdrant::QdrantBackend;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::VectorIndexError;
use crate::models::{IndexDescriptor, QueryMatch, Record, VectorDriver, VectorIndexConfig};

/// Data-plane operations on one index.
#[async_trait]
pub trait IndexHandle: Send + Sync {
    /// Insert or overwrite records by id.
    async fn upsert(&self, batch: Vec<Record>) -> Result<(), VectorIndexError>;

    /// Nearest-neighbour query. Backends return at most `top_k` matches but
    /// make no ordering promise.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<QueryMatch>, VectorIndexError>;

    /// Name of the index this handle points at.
    fn name(&self) -> &str;
}

/// Control-plane operations of a vector index service.
#[async_trait]
pub trait VectorIndexService: Send + Sync {
    /// Check that the service is reachable with the configured credentials.
    async fn health_check(&self) -> Result<bool, VectorIndexError>;

    /// Names of all indexes visible to this client.
    async fn list_indexes(&self) -> Result<Vec<String>, VectorIndexError>;

    /// Create an index with the descriptor's dimension, metric, and spec.
    async fn create_index(&self, descriptor: &IndexDescriptor) -> Result<(), VectorIndexError>;

    async fn delete_index(&self, name: &str) -> Result<(), VectorIndexError>;

    /// Open a handle for data operations on an existing index.
    async fn get_index(&self, name: &str) -> Result<Box<dyn IndexHandle>, VectorIndexError>;

    fn driver(&self) -> VectorDriver;
}

/// Create a vector index backend based on configuration.
///
/// The returned handle is meant to be built once and shared.
pub fn create_backend(
    config: &VectorIndexConfig,
) -> Result<Arc<dyn VectorIndexService>, VectorIndexError> {
    match config.driver {
        VectorDriver::Pinecone => {
            let backend = PineconeBackend::new(config)?;
            Ok(Arc::new(backend))
        }
        VectorDriver::Qdrant => {
            let backend = QdrantBackend::new(config)?;
            Ok(Arc::new(backend))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_pinecone_backend_requires_key() {
        let config = VectorIndexConfig::default();
        let result = create_backend(&config);
        assert!(matches!(result, Err(VectorIndexError::ConnectionError(_))));
    }

    #[test]
    fn test_create_pinecone_backend() {
        let config = VectorIndexConfig {
            api_key: Some("pc-test".to_string()),
            ..Default::default()
        };
        let backend = create_backend(&config).unwrap();
        assert_eq!(backend.driver(), VectorDriver::Pinecone);
    }
}
