//! Bounded record buffer that flushes to an index in fixed-size batches.

use crate::error::UpsertFailed;
use crate::models::Record;
use crate::services::vector_index::IndexHandle;

/// Records per upsert request.
pub const UPSERT_BATCH_SIZE: usize = 200;

/// Totals reported once the batcher is finalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub records: usize,
    pub batches: usize,
}

/// Buffers records and sends them to the index in order.
///
/// Every record passed to [`add`](Self::add) goes upstream exactly once,
/// in insertion order, in batches of at most `threshold` records. Batches
/// are sent one at a time; a failed batch is reported and nothing after it
/// is sent by the caller's loop.
pub struct RecordBatcher<'a> {
    index: &'a dyn IndexHandle,
    buffer: Vec<Record>,
    threshold: usize,
    stats: BatchStats,
}

impl<'a> RecordBatcher<'a> {
    pub fn new(index: &'a dyn IndexHandle) -> Self {
        Self::with_threshold(index, UPSERT_BATCH_SIZE)
    }

    pub fn with_threshold(index: &'a dyn IndexHandle, threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            index,
            buffer: Vec::with_capacity(threshold),
            threshold,
            stats: BatchStats::default(),
        }
    }

    /// Buffer a record, flushing when the buffer reaches the threshold.
    pub async fn add(&mut self, record: Record) -> Result<(), UpsertFailed> {
        self.buffer.push(record);
        if self.buffer.len() >= self.threshold {
            self.flush().await?;
        }
        Ok(())
    }

    /// Flush whatever is left and return the totals.
    pub async fn finalize(mut self) -> Result<BatchStats, UpsertFailed> {
        if !self.buffer.is_empty() {
            self.flush().await?;
        }
        Ok(self.stats)
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    async fn flush(&mut self) -> Result<(), UpsertFailed> {
        let batch = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.threshold));
        let size = batch.len();
        let batch_index = self.stats.batches;

        if let Err(cause) = self.index.upsert(batch).await {
            tracing::error!(
                index = self.index.name(),
                batch_index,
                size,
                error = %cause,
                "batch upsert failed"
            );
            return Err(UpsertFailed { batch_index, cause });
        }

        self.stats.batches += 1;
        self.stats.records += size;
        tracing::debug!(index = self.index.name(), batch_index, size, "batch upserted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::vector_index::mock::{MockState, RecordingIndex};

    fn records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| Record::new(format!("r{i}"), vec![i as f32, 0.5]).with_metadata("t", i as i64))
            .collect()
    }

    #[tokio::test]
    async fn test_flushes_at_threshold() {
        let index = RecordingIndex::detached("docs", MockState::default());
        let mut batcher = RecordBatcher::new(&index);

        for record in records(UPSERT_BATCH_SIZE - 1) {
            batcher.add(record).await.unwrap();
        }
        assert!(index.state().upserts.is_empty());
        assert_eq!(batcher.pending(), UPSERT_BATCH_SIZE - 1);

        batcher.add(Record::new("last", vec![0.0, 0.0])).await.unwrap();
        assert_eq!(index.state().upserts.len(), 1);
        assert_eq!(batcher.pending(), 0);

        let stats = batcher.finalize().await.unwrap();
        assert_eq!(stats, BatchStats { records: 200, batches: 1 });
        assert_eq!(index.state().upserts.len(), 1);
    }

    #[tokio::test]
    async fn test_450_records_make_three_ordered_batches() {
        let index = RecordingIndex::detached("docs", MockState::default());
        let input = records(450);
        let mut batcher = RecordBatcher::new(&index);

        for record in input.clone() {
            batcher.add(record).await.unwrap();
        }
        let stats = batcher.finalize().await.unwrap();
        assert_eq!(stats, BatchStats { records: 450, batches: 3 });

        let state = index.state();
        let sizes: Vec<usize> = state.upserts.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![200, 200, 50]);
        let sent: Vec<Record> = state.upserts.concat();
        assert_eq!(sent, input);
    }

    #[tokio::test]
    async fn test_batch_count_matches_ceiling_for_many_sizes() {
        for n in [0usize, 1, 7, 199, 200, 201, 399, 400, 401, 1000] {
            let index = RecordingIndex::detached("docs", MockState::default());
            let input = records(n);
            let mut batcher = RecordBatcher::new(&index);
            for record in input.clone() {
                batcher.add(record).await.unwrap();
            }
            let stats = batcher.finalize().await.unwrap();

            let state = index.state();
            assert_eq!(state.upserts.len(), n.div_ceil(UPSERT_BATCH_SIZE), "n = {n}");
            assert_eq!(stats.batches, state.upserts.len());
            assert!(state.upserts.iter().all(|b| !b.is_empty() && b.len() <= UPSERT_BATCH_SIZE));
            assert_eq!(state.upserts.concat(), input, "n = {n}");
        }
    }

    #[tokio::test]
    async fn test_finalize_on_empty_sends_nothing() {
        let index = RecordingIndex::detached("docs", MockState::default());
        let stats = RecordBatcher::new(&index).finalize().await.unwrap();
        assert_eq!(stats, BatchStats::default());
        assert!(index.state().upserts.is_empty());
    }

    #[tokio::test]
    async fn test_failure_reports_batch_index() {
        let index = RecordingIndex::detached(
            "docs",
            MockState {
                fail_upsert_at: Some(1),
                ..Default::default()
            },
        );
        let mut batcher = RecordBatcher::with_threshold(&index, 2);

        batcher.add(Record::new("a", vec![1.0])).await.unwrap();
        batcher.add(Record::new("b", vec![1.0])).await.unwrap();
        batcher.add(Record::new("c", vec![1.0])).await.unwrap();
        let err = batcher.add(Record::new("d", vec![1.0])).await.unwrap_err();

        assert_eq!(err.batch_index, 1);
        assert_eq!(index.state().upserts.len(), 1);
    }
}
