use std::sync::Arc;

use crate::error::{PipelineError, ProvisionError};
use crate::models::{IndexDescriptor, Record};
use crate::services::batch::RecordBatcher;
use crate::services::provision::{IndexProvisioner, IndexReady};
use crate::services::vector_index::VectorIndexService;

/// Result of a completed upsert run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertSummary {
    pub count: usize,
    pub batches: usize,
    pub provisioned: IndexReady,
}

/// Provisions the target index, then streams records through a
/// [`RecordBatcher`].
///
/// A failed batch aborts the run. Batches flushed before the failure stay
/// in the index; re-submitting the same records is safe because the record
/// id is the upsert key.
#[derive(Clone)]
pub struct UpsertOrchestrator {
    service: Arc<dyn VectorIndexService>,
    provisioner: IndexProvisioner,
}

impl UpsertOrchestrator {
    pub fn new(service: Arc<dyn VectorIndexService>) -> Self {
        Self {
            provisioner: IndexProvisioner::new(Arc::clone(&service)),
            service,
        }
    }

    pub async fn upsert_all<I>(
        &self,
        descriptor: &IndexDescriptor,
        records: I,
        create_if_missing: bool,
    ) -> Result<UpsertSummary, PipelineError>
    where
        I: IntoIterator<Item = Record>,
    {
        self.upsert_all_with_progress(descriptor, records, create_if_missing, |_| {})
            .await
    }

    /// Same as [`upsert_all`](Self::upsert_all), calling `on_record` with the
    /// running record count after each record is buffered.
    pub async fn upsert_all_with_progress<I, F>(
        &self,
        descriptor: &IndexDescriptor,
        records: I,
        create_if_missing: bool,
        mut on_record: F,
    ) -> Result<UpsertSummary, PipelineError>
    where
        I: IntoIterator<Item = Record>,
        F: FnMut(usize),
    {
        let provisioned = self
            .provisioner
            .ensure_index(descriptor, create_if_missing)
            .await?;

        let index = self.service.get_index(&descriptor.name).await.map_err(|cause| {
            tracing::error!(index = %descriptor.name, error = %cause, "opening index failed");
            ProvisionError::Unavailable {
                index: descriptor.name.clone(),
                cause,
            }
        })?;

        tracing::info!(index = %descriptor.name, "upserting records");

        let mut batcher = RecordBatcher::new(index.as_ref());
        let mut added = 0usize;
        for record in records {
            batcher.add(record).await?;
            added += 1;
            on_record(added);
        }
        let stats = batcher.finalize().await?;

        tracing::info!(
            index = %descriptor.name,
            records = stats.records,
            batches = stats.batches,
            "upsert complete"
        );

        Ok(UpsertSummary {
            count: stats.records,
            batches: stats.batches,
            provisioned,
        })
    }
}
