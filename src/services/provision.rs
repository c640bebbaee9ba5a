//! Check-then-create provisioning for vector indexes.

use std::sync::Arc;

use crate::error::ProvisionError;
use crate::models::IndexDescriptor;
use crate::services::vector_index::VectorIndexService;

/// How an index became ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexReady {
    /// The index was already listed.
    Existing,
    /// The index was missing and has just been created.
    Created,
}

/// Ensures a named index exists before it is used.
///
/// Safe to call on every operation: when the index is already listed the
/// only traffic is the list call.
///
/// Index creation is eventually consistent upstream. Right after a
/// successful create, the index may not be listed or open for data yet;
/// no wait is performed here.
#[derive(Clone)]
pub struct IndexProvisioner {
    service: Arc<dyn VectorIndexService>,
}

impl IndexProvisioner {
    pub fn new(service: Arc<dyn VectorIndexService>) -> Self {
        Self { service }
    }

    pub async fn ensure_index(
        &self,
        descriptor: &IndexDescriptor,
        create_if_missing: bool,
    ) -> Result<IndexReady, ProvisionError> {
        let names = self.service.list_indexes().await.map_err(|cause| {
            tracing::error!(index = %descriptor.name, error = %cause, "listing indexes failed");
            ProvisionError::ListFailed {
                index: descriptor.name.clone(),
                cause,
            }
        })?;

        if names.iter().any(|name| name == &descriptor.name) {
            tracing::info!(index = %descriptor.name, "index already exists");
            return Ok(IndexReady::Existing);
        }

        if !create_if_missing {
            tracing::warn!(index = %descriptor.name, "index does not exist");
            return Err(ProvisionError::NotFound {
                index: descriptor.name.clone(),
            });
        }

        self.service.create_index(descriptor).await.map_err(|cause| {
            tracing::error!(index = %descriptor.name, error = %cause, "creating index failed");
            ProvisionError::CreateFailed {
                index: descriptor.name.clone(),
                cause,
            }
        })?;

        tracing::info!(
            index = %descriptor.name,
            dimension = descriptor.dimension,
            metric = %descriptor.metric,
            "index created"
        );
        Ok(IndexReady::Created)
    }
}
