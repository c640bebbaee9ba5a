//! Recording in-memory index service for tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{IndexHandle, VectorIndexService};
use crate::error::VectorIndexError;
use crate::models::{IndexDescriptor, QueryMatch, Record, VectorDriver};

#[derive(Debug, Default)]
pub struct MockState {
    pub indexes: Vec<String>,
    pub list_calls: usize,
    pub create_calls: Vec<IndexDescriptor>,
    pub upserts: Vec<Vec<Record>>,
    pub query_calls: usize,
    pub matches: Vec<QueryMatch>,
    pub fail_create: bool,
    pub fail_list: bool,
    pub fail_upsert_at: Option<usize>,
    pub fail_query: bool,
}

/// Records every call so tests can assert on traffic.
#[derive(Debug, Clone, Default)]
pub struct RecordingIndexService {
    state: Arc<Mutex<MockState>>,
}

impl RecordingIndexService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(name: &str) -> Self {
        let service = Self::new();
        service.state().indexes.push(name.to_string());
        service
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl VectorIndexService for RecordingIndexService {
    async fn health_check(&self) -> Result<bool, VectorIndexError> {
        Ok(true)
    }

    async fn list_indexes(&self) -> Result<Vec<String>, VectorIndexError> {
        let mut state = self.state();
        state.list_calls += 1;
        if state.fail_list {
            return Err(VectorIndexError::ListError("service unavailable".to_string()));
        }
        Ok(state.indexes.clone())
    }

    async fn create_index(&self, descriptor: &IndexDescriptor) -> Result<(), VectorIndexError> {
        let mut state = self.state();
        state.create_calls.push(descriptor.clone());
        if state.fail_create {
            return Err(VectorIndexError::CreateError("quota exceeded".to_string()));
        }
        state.indexes.push(descriptor.name.clone());
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<(), VectorIndexError> {
        let mut state = self.state();
        let before = state.indexes.len();
        state.indexes.retain(|n| n != name);
        if state.indexes.len() == before {
            return Err(VectorIndexError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn get_index(&self, name: &str) -> Result<Box<dyn IndexHandle>, VectorIndexError> {
        if !self.state().indexes.iter().any(|n| n == name) {
            return Err(VectorIndexError::NotFound(name.to_string()));
        }
        Ok(Box::new(RecordingIndex {
            name: name.to_string(),
            state: Arc::clone(&self.state),
        }))
    }

    fn driver(&self) -> VectorDriver {
        VectorDriver::Pinecone
    }
}

pub struct RecordingIndex {
    name: String,
    state: Arc<Mutex<MockState>>,
}

impl RecordingIndex {
    pub fn detached(name: &str, state: MockState) -> Self {
        Self {
            name: name.to_string(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl IndexHandle for RecordingIndex {
    async fn upsert(&self, batch: Vec<Record>) -> Result<(), VectorIndexError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_upsert_at == Some(state.upserts.len()) {
            return Err(VectorIndexError::UpsertError("request too large".to_string()));
        }
        state.upserts.push(batch);
        Ok(())
    }

    async fn query(
        &self,
        _vector: &[f32],
        _top_k: usize,
        _include_metadata: bool,
    ) -> Result<Vec<QueryMatch>, VectorIndexError> {
        let mut state = self.state.lock().unwrap();
        state.query_calls += 1;
        if state.fail_query {
            return Err(VectorIndexError::QueryError("timeout".to_string()));
        }
        // All configured matches, unranked and untruncated.
        Ok(state.matches.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
