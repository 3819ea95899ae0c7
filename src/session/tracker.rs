//! Client-side bookkeeping of sent matrices.
//!
//! The remote service only knows indices. Everything needed to decode a
//! result later (kind, dimension, byte length) is remembered here, keyed by
//! the index the service assigned.
//!
//! ```text
//! record_sent ─► Queued ─► take_next_to_calculate ─► Calculating ─► mark_collected ─► Collected
//!                  ▲                                     │
//!                  └──────────── requeue ────────────────┘
//! ```
//!
//! "Oldest" means first recorded; a requeued record keeps its place.

use std::collections::HashMap;

use crate::error::{ClientError, Result};
use crate::numeric::NumericKind;

/// Where a sent matrix is in its lifecycle, as far as this client knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Stored remotely, not started yet.
    Queued,
    /// Start requested; result not downloaded yet.
    Calculating,
    /// Completed result downloaded.
    Collected,
}

/// Everything remembered about one sent matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub index: u8,
    pub stage: Stage,
    pub kind: NumericKind,
    pub dimension: u32,
    /// Bytes of the matrix as sent; the transposed result has the same length.
    pub byte_length: usize,
    seq: u64,
}

/// Index-keyed registry of sent matrices.
#[derive(Debug, Default)]
pub struct SessionTracker {
    records: HashMap<u8, JobRecord>,
    latest: Option<u8>,
    next_seq: u64,
}

impl SessionTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a matrix the service stored under `index`.
    ///
    /// A reused index replaces the older record.
    pub fn record_sent(&mut self, index: u8, kind: NumericKind, dimension: u32, byte_length: usize) {
        let seq = self.next_seq;
        self.next_seq += 1;

        let previous = self.records.insert(
            index,
            JobRecord {
                index,
                stage: Stage::Queued,
                kind,
                dimension,
                byte_length,
                seq,
            },
        );
        if previous.is_some() {
            tracing::debug!("Index {} reused by the service, replacing old record", index);
        }
        self.latest = Some(index);
        tracing::debug!("Recorded index {} ({}x{} {})", index, dimension, dimension, kind);
    }

    /// Move the oldest queued record to `Calculating` and return its index.
    ///
    /// # Errors
    ///
    /// `NoPendingJob` if nothing is queued.
    pub fn take_next_to_calculate(&mut self) -> Result<u8> {
        let index = self.oldest_in(Stage::Queued).ok_or(ClientError::NoPendingJob)?;
        self.set_stage(index, Stage::Calculating);
        Ok(index)
    }

    /// Index of the oldest record still calculating. Does not change it.
    ///
    /// # Errors
    ///
    /// `NoRunningJob` if nothing is calculating.
    pub fn take_next_to_poll(&self) -> Result<u8> {
        self.oldest_in(Stage::Calculating)
            .ok_or(ClientError::NoRunningJob)
    }

    /// Byte length of the completed result for `index`.
    ///
    /// # Errors
    ///
    /// `UnknownIndex` if this client never sent `index`.
    pub fn expected_result_length(&self, index: u8) -> Result<usize> {
        self.record(index)
            .map(|record| record.byte_length)
            .ok_or(ClientError::UnknownIndex(index))
    }

    /// Most recently recorded index.
    #[inline]
    pub fn latest(&self) -> Option<u8> {
        self.latest
    }

    /// Stage of `index`, if known.
    pub fn stage(&self, index: u8) -> Option<Stage> {
        self.records.get(&index).map(|record| record.stage)
    }

    /// Full record of `index`, if known.
    pub fn record(&self, index: u8) -> Option<&JobRecord> {
        self.records.get(&index)
    }

    /// Mark an explicitly started index as calculating. Unknown indices are ignored.
    pub fn mark_calculating(&mut self, index: u8) {
        self.set_stage(index, Stage::Calculating);
    }

    /// Put a calculating record back in the queue.
    pub fn requeue(&mut self, index: u8) {
        if self.stage(index) == Some(Stage::Calculating) {
            self.set_stage(index, Stage::Queued);
        }
    }

    /// Mark the result of `index` as downloaded.
    pub fn mark_collected(&mut self, index: u8) {
        self.set_stage(index, Stage::Collected);
    }

    /// Number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been sent yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn oldest_in(&self, stage: Stage) -> Option<u8> {
        self.records
            .values()
            .filter(|record| record.stage == stage)
            .min_by_key(|record| record.seq)
            .map(|record| record.index)
    }

    fn set_stage(&mut self, index: u8, stage: Stage) {
        if let Some(record) = self.records.get_mut(&index) {
            tracing::debug!("Index {}: {:?} -> {:?}", index, record.stage, stage);
            record.stage = stage;
        }
    }
}
