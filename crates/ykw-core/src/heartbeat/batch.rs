//! Batching: group a heartbeat stream into consecutive bounded batches.

use super::HeartbeatRecord;

/// An ordered, non-empty run of consecutive records from one session.
/// The batch is due once wall clock reaches its last record's timestamp.
#[derive(Debug, Clone)]
pub struct HeartbeatBatch {
    records: Vec<HeartbeatRecord>,
}

impl HeartbeatBatch {
    fn new(records: Vec<HeartbeatRecord>) -> Self {
        debug_assert!(!records.is_empty());
        Self { records }
    }

    pub fn records(&self) -> &[HeartbeatRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn last(&self) -> &HeartbeatRecord {
        self.records.last().expect("batch is non-empty")
    }

    /// Millisecond epoch at which this batch becomes due.
    pub fn due_epoch_ms(&self) -> Option<i64> {
        self.last().epoch_ms()
    }

    /// Cumulative progress after this batch (last record's progress).
    pub fn final_progress(&self) -> f64 {
        self.last().progress
    }
}

/// Iterator adapter yielding batches of up to `size` records; the last batch
/// may be shorter, and no batch is empty.
pub struct Batched<I> {
    inner: I,
    size: usize,
}

impl<I: Iterator<Item = HeartbeatRecord>> Iterator for Batched<I> {
    type Item = HeartbeatBatch;

    fn next(&mut self) -> Option<HeartbeatBatch> {
        let mut records = Vec::with_capacity(self.size);
        for record in self.inner.by_ref() {
            records.push(record);
            if records.len() == self.size {
                break;
            }
        }
        if records.is_empty() {
            None
        } else {
            Some(HeartbeatBatch::new(records))
        }
    }
}

/// Group `records` into batches of at most `size` (`size >= 1`).
pub fn batched<I>(records: I, size: usize) -> Batched<I::IntoIter>
where
    I: IntoIterator<Item = HeartbeatRecord>,
{
    Batched {
        inner: records.into_iter(),
        size: size.max(1),
    }
}
