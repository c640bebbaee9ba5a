//! MongoDB access for source documents and their text chunks.

use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::options::{ClientOptions, ServerApi, ServerApiVersion};
use mongodb::{Client, Collection};

use crate::error::DocumentStoreError;
use crate::models::ChunkDocument;

/// Handle to a MongoDB deployment, pinned to Server API v1.
#[derive(Debug, Clone)]
pub struct MongoDatabase {
    client: Client,
}

impl MongoDatabase {
    pub async fn connect(uri: &str) -> Result<Self, DocumentStoreError> {
        let mut options = ClientOptions::parse(uri).await.map_err(|e| {
            tracing::error!(error = %e, "invalid MongoDB URI");
            DocumentStoreError::ConnectionError(e.to_string())
        })?;
        options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());

        let client = Client::with_options(options)
            .map_err(|e| DocumentStoreError::ConnectionError(e.to_string()))?;

        tracing::info!("MongoDB client initialized");
        Ok(Self { client })
    }

    pub async fn ping(&self) -> Result<(), DocumentStoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    fn collection(&self, db: &str, coll: &str) -> Collection<Document> {
        self.client.database(db).collection(coll)
    }

    pub async fn find_one(
        &self,
        db: &str,
        coll: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<Option<Document>, DocumentStoreError> {
        let collection = self.collection(db, coll);
        let mut action = collection.find_one(filter);
        if let Some(projection) = projection {
            action = action.projection(projection);
        }
        let found = action
            .await
            .inspect_err(|e| tracing::error!(db, coll, error = %e, "find_one failed"))?;
        Ok(found)
    }

    pub async fn find(
        &self,
        db: &str,
        coll: &str,
        filter: Document,
        projection: Option<Document>,
        sort: Option<Document>,
    ) -> Result<Vec<Document>, DocumentStoreError> {
        let collection = self.collection(db, coll);
        let mut action = collection.find(filter);
        if let Some(projection) = projection {
            action = action.projection(projection);
        }
        if let Some(sort) = sort {
            action = action.sort(sort);
        }
        let cursor = action
            .await
            .inspect_err(|e| tracing::error!(db, coll, error = %e, "find failed"))?;
        Ok(cursor.try_collect().await?)
    }

    /// Insert a document and return its id.
    pub async fn insert_one(
        &self,
        db: &str,
        coll: &str,
        document: Document,
    ) -> Result<Bson, DocumentStoreError> {
        let result = self
            .collection(db, coll)
            .insert_one(document)
            .await
            .inspect_err(|e| tracing::error!(db, coll, error = %e, "insert_one failed"))?;
        Ok(result.inserted_id)
    }

    /// Apply `update` to the first match and return the modified count.
    pub async fn update_one(
        &self,
        db: &str,
        coll: &str,
        filter: Document,
        update: Document,
    ) -> Result<u64, DocumentStoreError> {
        let result = self
            .collection(db, coll)
            .update_one(filter, update)
            .await
            .inspect_err(|e| tracing::error!(db, coll, error = %e, "update_one failed"))?;
        Ok(result.modified_count)
    }

    /// Create the document if absent, set its source, and append its chunks.
    pub async fn insert_or_update_chunk(
        &self,
        db: &str,
        coll: &str,
        document: &ChunkDocument,
    ) -> Result<(), DocumentStoreError> {
        let update = chunk_upsert_update(document)?;
        let result = self
            .collection(db, coll)
            .update_one(doc! { "_id": document.id.as_str() }, update)
            .upsert(true)
            .await
            .inspect_err(|e| tracing::error!(db, coll, id = %document.id, error = %e, "chunk upsert failed"))?;

        tracing::debug!(
            id = %document.id,
            matched = result.matched_count,
            upserted = result.upserted_id.is_some(),
            "chunk document written"
        );
        Ok(())
    }

    /// Fetch every document holding `chunk_id`, each with `data` narrowed to
    /// that chunk. Chunk ids are not unique across documents.
    pub async fn get_document_by_chunk_id(
        &self,
        db: &str,
        coll: &str,
        chunk_id: &str,
    ) -> Result<Vec<Document>, DocumentStoreError> {
        let cursor = self
            .collection(db, coll)
            .aggregate(chunk_lookup_pipeline(chunk_id))
            .await
            .inspect_err(|e| tracing::error!(db, coll, chunk_id, error = %e, "chunk lookup failed"))?;
        Ok(cursor.try_collect().await?)
    }
}

fn chunk_upsert_update(document: &ChunkDocument) -> Result<Document, DocumentStoreError> {
    let chunks = mongodb::bson::to_bson(&document.data)?;
    Ok(doc! {
        "$set": { "source": document.source.as_str() },
        "$push": { "data": { "$each": chunks } },
    })
}

fn chunk_lookup_pipeline(chunk_id: &str) -> Vec<Document> {
    vec![
        doc! { "$match": { "data.chunk_id": chunk_id } },
        doc! {
            "$project": {
                "source": 1,
                "data": {
                    "$filter": {
                        "input": "$data",
                        "as": "chunk",
                        "cond": { "$eq": ["$$chunk.chunk_id", chunk_id] },
                    }
                },
            }
        },
    ]
}
