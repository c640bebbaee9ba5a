use std::sync::Arc;

use crate::error::{PipelineError, ProvisionError};
use crate::models::{IndexDescriptor, QueryResult};
use crate::services::provision::IndexProvisioner;
use crate::services::vector_index::VectorIndexService;

/// Top-k similarity search against an existing index.
///
/// Never creates an index: a missing index is a provision failure, not an
/// empty result.
#[derive(Clone)]
pub struct QueryOrchestrator {
    service: Arc<dyn VectorIndexService>,
    provisioner: IndexProvisioner,
}

impl QueryOrchestrator {
    pub fn new(service: Arc<dyn VectorIndexService>) -> Self {
        Self {
            provisioner: IndexProvisioner::new(Arc::clone(&service)),
            service,
        }
    }

    pub async fn search(
        &self,
        descriptor: &IndexDescriptor,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<QueryResult, PipelineError> {
        if top_k == 0 {
            return Err(PipelineError::InvalidArgument(
                "top_k must be a positive integer".to_string(),
            ));
        }
        if query_embedding.is_empty() {
            return Err(PipelineError::InvalidArgument(
                "query embedding is empty".to_string(),
            ));
        }

        self.provisioner.ensure_index(descriptor, false).await?;

        let index = self.service.get_index(&descriptor.name).await.map_err(|cause| {
            tracing::error!(index = %descriptor.name, error = %cause, "opening index failed");
            ProvisionError::Unavailable {
                index: descriptor.name.clone(),
                cause,
            }
        })?;

        let matches = index
            .query(query_embedding, top_k, true)
            .await
            .map_err(|cause| {
                tracing::error!(index = %descriptor.name, error = %cause, "query failed");
                PipelineError::QueryFailed(cause)
            })?;

        let result = QueryResult::ranked(matches, top_k);
        tracing::debug!(index = %descriptor.name, matches = result.len(), "query complete");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Metadata, QueryMatch};
    use crate::services::vector_index::mock::RecordingIndexService;

    fn matches(scores: &[f32]) -> Vec<QueryMatch> {
        scores
            .iter()
            .enumerate()
            .map(|(i, score)| QueryMatch {
                id: format!("m{i}"),
                score: *score,
                metadata: Metadata::new(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_search_truncates_and_sorts() {
        let service = RecordingIndexService::with_index("docs");
        service.state().matches = matches(&[0.3, 0.9, 0.1, 0.7, 0.5, 0.8, 0.2]);
        let orchestrator = QueryOrchestrator::new(Arc::new(service));

        let result = orchestrator
            .search(&IndexDescriptor::new("docs", 2), &[0.1, 0.2], 5)
            .await
            .unwrap();

        assert_eq!(result.len(), 5);
        let scores: Vec<f32> = result.iter().map(|m| m.score).collect();
        assert_eq!(scores, vec![0.9, 0.8, 0.7, 0.5, 0.3]);
    }

    #[tokio::test]
    async fn test_zero_top_k_is_invalid_without_calls() {
        let service = RecordingIndexService::with_index("docs");
        let orchestrator = QueryOrchestrator::new(Arc::new(service.clone()));

        let err = orchestrator
            .search(&IndexDescriptor::new("docs", 2), &[0.1, 0.2], 0)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::InvalidArgument(_)));
        let state = service.state();
        assert_eq!(state.list_calls, 0);
        assert_eq!(state.query_calls, 0);
    }

    #[tokio::test]
    async fn test_missing_index_is_provision_failure() {
        let service = RecordingIndexService::new();
        let orchestrator = QueryOrchestrator::new(Arc::new(service.clone()));

        let err = orchestrator
            .search(&IndexDescriptor::new("docs", 2), &[0.1, 0.2], 3)
            .await
            .unwrap_err();

        assert_eq!(err.stage(), "provision");
        assert!(matches!(
            err,
            PipelineError::Provision(ProvisionError::NotFound { .. })
        ));
        let state = service.state();
        assert!(state.create_calls.is_empty());
        assert_eq!(state.query_calls, 0);
    }

    #[tokio::test]
    async fn test_query_failure() {
        let service = RecordingIndexService::with_index("docs");
        service.state().fail_query = true;
        let orchestrator = QueryOrchestrator::new(Arc::new(service));

        let err = orchestrator
            .search(&IndexDescriptor::new("docs", 2), &[0.1, 0.2], 3)
            .await
            .unwrap_err();
        assert_eq!(err.stage(), "query");
    }

    #[tokio::test]
    async fn test_no_matches_is_empty_result() {
        let service = RecordingIndexService::with_index("docs");
        let orchestrator = QueryOrchestrator::new(Arc::new(service));

        let result = orchestrator
            .search(&IndexDescriptor::new("docs", 2), &[0.1, 0.2], 3)
            .await
            .unwrap();
        assert!(result.is_empty());
    }
}
