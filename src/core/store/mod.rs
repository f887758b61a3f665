//! Record store - the storage collaborator behind aggregation
//!
//! `RecordStore` is the read side the aggregator queries; `RecordSink` is
//! the write side used by imports. `MemoryStore` backs tests and embedding,
//! `SqliteStore` backs the command-line tool.

mod import;
mod serialize;
mod sqlite;


use thiserror::Error;

use crate::core::category::ResultLabel;
use crate::core::records::{CountRecord, MeanRecord, PassRateRecord, RecordKey, SegmentTotals};

pub use import::{import_dir, import_file, ImportStats, ImportTarget};
pub use sqlite::SqliteStore;

/// Errors from the storage collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid row for {key}: {message}")]
    InvalidRow { key: String, message: String },

    #[error("Embedded schema '{0}' not found")]
    MissingSchema(String),
}

/// Read-only queries used by the aggregator
///
/// Results are order-irrelevant; the aggregator sorts what it receives.
/// A `None` segment means "whole batch", a `None` label means "no result
/// filter".
pub trait RecordStore {
    fn query_counts(
        &self,
        batch: &str,
        segment: Option<&str>,
        label: Option<ResultLabel>,
    ) -> Result<Vec<CountRecord>, StoreError>;

    fn query_means(
        &self,
        batch: &str,
        segment: Option<&str>,
        label: Option<ResultLabel>,
    ) -> Result<Vec<MeanRecord>, StoreError>;

    fn query_pass_rates(
        &self,
        batch: &str,
        segment: Option<&str>,
        label: Option<ResultLabel>,
    ) -> Result<Vec<PassRateRecord>, StoreError>;

    /// Totals for every segment of `batch`, or just `segment` when given
    fn query_segment_totals(
        &self,
        batch: &str,
        segment: Option<&str>,
    ) -> Result<Vec<SegmentTotals>, StoreError>;

    /// Totals for every segment of every batch
    fn all_segments(&self) -> Result<Vec<SegmentTotals>, StoreError>;
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    fn query_counts(
        &self,
        batch: &str,
        segment: Option<&str>,
        label: Option<ResultLabel>,
    ) -> Result<Vec<CountRecord>, StoreError> {
        (**self).query_counts(batch, segment, label)
    }

    fn query_means(
        &self,
        batch: &str,
        segment: Option<&str>,
        label: Option<ResultLabel>,
    ) -> Result<Vec<MeanRecord>, StoreError> {
        (**self).query_means(batch, segment, label)
    }

    fn query_pass_rates(
        &self,
        batch: &str,
        segment: Option<&str>,
        label: Option<ResultLabel>,
    ) -> Result<Vec<PassRateRecord>, StoreError> {
        (**self).query_pass_rates(batch, segment, label)
    }

    fn query_segment_totals(
        &self,
        batch: &str,
        segment: Option<&str>,
    ) -> Result<Vec<SegmentTotals>, StoreError> {
        (**self).query_segment_totals(batch, segment)
    }

    fn all_segments(&self) -> Result<Vec<SegmentTotals>, StoreError> {
        (**self).all_segments()
    }
}

/// Write side used when loading records
pub trait RecordSink {
    fn put_segment(&mut self, totals: SegmentTotals) -> Result<(), StoreError>;
    fn put_count(&mut self, record: CountRecord) -> Result<(), StoreError>;
    fn put_mean(&mut self, record: MeanRecord) -> Result<(), StoreError>;
    fn put_pass_rate(&mut self, record: PassRateRecord) -> Result<(), StoreError>;
}

/// Whether a record key falls inside a (batch, segment, label) query
///
/// Under a label filter, records whose label cannot be parsed never match.
pub fn key_matches(
    key: &RecordKey,
    batch: &str,
    segment: Option<&str>,
    label: Option<ResultLabel>,
) -> bool {
    key.batch == batch
        && segment.map_or(true, |s| key.segment.as_deref() == Some(s))
        && label.map_or(true, |l| ResultLabel::parse(&key.overall_result) == Some(l))
}

/// In-memory record store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    counts: Vec<CountRecord>,
    means: Vec<MeanRecord>,
    pass_rates: Vec<PassRateRecord>,
    segments: Vec<SegmentTotals>,
    /// Contents saved by `begin`, restored by `rollback`
    saved: Option<Box<MemoryStore>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_segment(mut self, totals: SegmentTotals) -> Self {
        self.segments.push(totals);
        self
    }

    pub fn with_count(mut self, record: CountRecord) -> Self {
        self.counts.push(record);
        self
    }

    pub fn with_mean(mut self, record: MeanRecord) -> Self {
        self.means.push(record);
        self
    }

    pub fn with_pass_rate(mut self, record: PassRateRecord) -> Self {
        self.pass_rates.push(record);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
            && self.means.is_empty()
            && self.pass_rates.is_empty()
            && self.segments.is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn query_counts(
        &self,
        batch: &str,
        segment: Option<&str>,
        label: Option<ResultLabel>,
    ) -> Result<Vec<CountRecord>, StoreError> {
        Ok(self
            .counts
            .iter()
            .filter(|r| key_matches(r.key(), batch, segment, label))
            .cloned()
            .collect())
    }

    fn query_means(
        &self,
        batch: &str,
        segment: Option<&str>,
        label: Option<ResultLabel>,
    ) -> Result<Vec<MeanRecord>, StoreError> {
        Ok(self
            .means
            .iter()
            .filter(|r| key_matches(r.key(), batch, segment, label))
            .cloned()
            .collect())
    }

    fn query_pass_rates(
        &self,
        batch: &str,
        segment: Option<&str>,
        label: Option<ResultLabel>,
    ) -> Result<Vec<PassRateRecord>, StoreError> {
        Ok(self
            .pass_rates
            .iter()
            .filter(|r| key_matches(r.key(), batch, segment, label))
            .cloned()
            .collect())
    }

    fn query_segment_totals(
        &self,
        batch: &str,
        segment: Option<&str>,
    ) -> Result<Vec<SegmentTotals>, StoreError> {
        Ok(self
            .segments
            .iter()
            .filter(|s| s.batch == batch)
            .filter(|s| segment.map_or(true, |seg| s.segment.as_deref() == Some(seg)))
            .cloned()
            .collect())
    }

    fn all_segments(&self) -> Result<Vec<SegmentTotals>, StoreError> {
        Ok(self.segments.clone())
    }
}

impl RecordSink for MemoryStore {
    fn put_segment(&mut self, totals: SegmentTotals) -> Result<(), StoreError> {
        self.segments
            .retain(|s| !(s.batch == totals.batch && s.segment == totals.segment));
        self.segments.push(totals);
        Ok(())
    }

    fn put_count(&mut self, record: CountRecord) -> Result<(), StoreError> {
        self.counts.retain(|r| r.key() != record.key());
        self.counts.push(record);
        Ok(())
    }

    fn put_mean(&mut self, record: MeanRecord) -> Result<(), StoreError> {
        self.means.retain(|r| r.key() != record.key());
        self.means.push(record);
        Ok(())
    }

    fn put_pass_rate(&mut self, record: PassRateRecord) -> Result<(), StoreError> {
        self.pass_rates.retain(|r| r.key() != record.key());
        self.pass_rates.push(record);
        Ok(())
    }
}
