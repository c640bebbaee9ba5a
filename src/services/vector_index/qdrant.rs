//! Qdrant vector index backend implementation.
//!
//! Collections stand in for indexes. Qdrant point ids must be integers or
//! UUIDs, so record ids are mapped to UUIDv5 and kept in the payload.

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    Value, VectorParamsBuilder,
};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::{IndexHandle, VectorIndexService};
use crate::error::VectorIndexError;
use crate::models::{
    DistanceMetric, IndexDescriptor, Metadata, MetadataValue, QueryMatch, Record, VectorDriver,
    VectorIndexConfig,
};

/// Payload key holding the caller's record id.
const RECORD_ID_KEY: &str = "_id";

/// Qdrant vector index backend.
pub struct QdrantBackend {
    client: Arc<Qdrant>,
}

impl QdrantBackend {
    pub fn new(config: &VectorIndexConfig) -> Result<Self, VectorIndexError> {
        let mut builder = Qdrant::from_url(config.endpoint());

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| VectorIndexError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }
}

fn distance(metric: DistanceMetric) -> Distance {
    match metric {
        DistanceMetric::Cosine => Distance::Cosine,
        DistanceMetric::Euclidean => Distance::Euclid,
        DistanceMetric::DotProduct => Distance::Dot,
    }
}

fn point_id(record_id: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, record_id.as_bytes()).to_string()
}

fn to_payload(record_id: String, metadata: Metadata) -> HashMap<String, Value> {
    let mut payload: HashMap<String, Value> = HashMap::new();
    for (key, value) in metadata {
        let value: Value = match value {
            MetadataValue::Bool(b) => b.into(),
            MetadataValue::Number(n) => n.into(),
            MetadataValue::String(s) => s.into(),
            MetadataValue::List(items) => items
                .into_iter()
                .map(Value::from)
                .collect::<Vec<Value>>()
                .into(),
        };
        payload.insert(key, value);
    }
    payload.insert(RECORD_ID_KEY.to_string(), record_id.into());
    payload
}

fn from_payload(payload: HashMap<String, Value>) -> (Option<String>, Metadata) {
    let mut record_id = None;
    let mut metadata = Metadata::new();

    for (key, value) in payload {
        let converted = match value.kind {
            Some(Kind::StringValue(s)) if key == RECORD_ID_KEY => {
                record_id = Some(s);
                continue;
            }
            Some(Kind::StringValue(s)) => MetadataValue::String(s),
            Some(Kind::DoubleValue(n)) => MetadataValue::Number(n),
            Some(Kind::IntegerValue(n)) => MetadataValue::Number(n as f64),
            Some(Kind::BoolValue(b)) => MetadataValue::Bool(b),
            Some(Kind::ListValue(list)) => MetadataValue::List(
                list.values
                    .into_iter()
                    .filter_map(|v| match v.kind {
                        Some(Kind::StringValue(s)) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => continue,
        };
        metadata.insert(key, converted);
    }

    (record_id, metadata)
}

#[async_trait]
impl VectorIndexService for QdrantBackend {
    async fn health_check(&self) -> Result<bool, VectorIndexError> {
        self.client
            .health_check()
            .await
            .map(|_| true)
            .map_err(|e| VectorIndexError::ConnectionError(e.to_string()))
    }

    async fn list_indexes(&self) -> Result<Vec<String>, VectorIndexError> {
        let response = self
            .client
            .list_collections()
            .await
            .map_err(|e| VectorIndexError::ListError(e.to_string()))?;

        Ok(response.collections.into_iter().map(|c| c.name).collect())
    }

    async fn create_index(&self, descriptor: &IndexDescriptor) -> Result<(), VectorIndexError> {
        let create_collection = CreateCollectionBuilder::new(&descriptor.name).vectors_config(
            VectorParamsBuilder::new(u64::from(descriptor.dimension), distance(descriptor.metric)),
        );

        self.client
            .create_collection(create_collection)
            .await
            .map_err(|e| VectorIndexError::CreateError(e.to_string()))?;

        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<(), VectorIndexError> {
        self.client
            .delete_collection(name)
            .await
            .map_err(|e| VectorIndexError::DeleteError(e.to_string()))?;

        Ok(())
    }

    async fn get_index(&self, name: &str) -> Result<Box<dyn IndexHandle>, VectorIndexError> {
        let exists = self
            .client
            .collection_exists(name)
            .await
            .map_err(|e| VectorIndexError::ClientError(e.to_string()))?;

        if !exists {
            return Err(VectorIndexError::NotFound(name.to_string()));
        }

        Ok(Box::new(QdrantIndex {
            client: Arc::clone(&self.client),
            collection: name.to_string(),
        }))
    }

    fn driver(&self) -> VectorDriver {
        VectorDriver::Qdrant
    }
}

/// Data-plane handle for one Qdrant collection.
pub struct QdrantIndex {
    client: Arc<Qdrant>,
    collection: String,
}

#[async_trait]
impl IndexHandle for QdrantIndex {
    async fn upsert(&self, batch: Vec<Record>) -> Result<(), VectorIndexError> {
        if batch.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = batch
            .into_iter()
            .map(|record| {
                let id = point_id(&record.id);
                let payload = to_payload(record.id, record.metadata);
                PointStruct::new(id, record.values, payload)
            })
            .collect();

        let upsert = UpsertPointsBuilder::new(&self.collection, points).wait(true);

        self.client
            .upsert_points(upsert)
            .await
            .map_err(|e| VectorIndexError::UpsertError(e.to_string()))?;

        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<QueryMatch>, VectorIndexError> {
        // The record id lives in the payload, so it is always fetched.
        let search = SearchPointsBuilder::new(&self.collection, vector.to_vec(), top_k as u64)
            .with_payload(true);

        let results = self
            .client
            .search_points(search)
            .await
            .map_err(|e| VectorIndexError::QueryError(e.to_string()))?;

        let matches = results
            .result
            .into_iter()
            .map(|point| {
                let (record_id, metadata) = from_payload(point.payload);

                let id = record_id.unwrap_or_else(|| match &point.id {
                    Some(id) => match &id.point_id_options {
                        Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(uuid)) => {
                            uuid.clone()
                        }
                        Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(num)) => {
                            num.to_string()
                        }
                        None => String::new(),
                    },
                    None => String::new(),
                });

                QueryMatch {
                    id,
                    score: point.score,
                    metadata: if include_metadata {
                        metadata
                    } else {
                        Metadata::new()
                    },
                }
            })
            .collect();

        Ok(matches)
    }

    fn name(&self) -> &str {
        &self.collection
    }
}
