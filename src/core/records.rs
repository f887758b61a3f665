//! Inspection record types
//!
//! Records are produced upstream and are read-only inputs to aggregation.
//! Field values are validated against the field catalog when a record is
//! built, so an aggregation never sees a field the catalog does not know.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::catalog::FieldCatalog;
use crate::core::error::AggregateError;

/// Identity shared by count, mean and pass-rate records
///
/// `overall_result` is kept exactly as stored; it is only interpreted as a
/// `ResultLabel` when a weight has to be looked up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub batch: String,
    pub segment: Option<String>,
    pub overall_result: String,
}

impl RecordKey {
    pub fn new(batch: &str, segment: Option<&str>, overall_result: &str) -> Self {
        Self {
            batch: batch.to_string(),
            segment: segment.map(str::to_string),
            overall_result: overall_result.to_string(),
        }
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.batch,
            self.segment.as_deref().unwrap_or("-"),
            self.overall_result
        )
    }
}

/// Which of the three record families a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Count,
    Mean,
    PassRate,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Count => "count",
            RecordKind::Mean => "mean",
            RecordKind::PassRate => "pass_rate",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn collect_values<S, V, I>(values: I, kind: RecordKind) -> Result<BTreeMap<String, V>, AggregateError>
where
    S: Into<String>,
    I: IntoIterator<Item = (S, V)>,
{
    let catalog = FieldCatalog::standard();
    let mut map = BTreeMap::new();
    for (field, value) in values {
        let field = field.into();
        catalog.check_field(&field, kind)?;
        map.insert(field, value);
    }
    Ok(map)
}

/// Occurrence counts per mean field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountRecord {
    key: RecordKey,
    values: BTreeMap<String, u64>,
}

impl CountRecord {
    /// Build a count record, rejecting fields outside the catalog
    pub fn new<S, I>(key: RecordKey, values: I) -> Result<Self, AggregateError>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, u64)>,
    {
        Ok(Self {
            key,
            values: collect_values(values, RecordKind::Count)?,
        })
    }

    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    /// Count for a field; fields the record does not carry count as zero
    pub fn get(&self, field: &str) -> u64 {
        self.values.get(field).copied().unwrap_or(0)
    }

    pub fn values(&self) -> &BTreeMap<String, u64> {
        &self.values
    }
}

/// Per-unit measurement means
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeanRecord {
    key: RecordKey,
    values: BTreeMap<String, f64>,
}

impl MeanRecord {
    /// Build a mean record, rejecting fields outside the catalog
    pub fn new<S, I>(key: RecordKey, values: I) -> Result<Self, AggregateError>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, f64)>,
    {
        Ok(Self {
            key,
            values: collect_values(values, RecordKind::Mean)?,
        })
    }

    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    pub fn get(&self, field: &str) -> f64 {
        self.values.get(field).copied().unwrap_or(0.0)
    }

    pub fn values(&self) -> &BTreeMap<String, f64> {
        &self.values
    }
}

/// Pass percentages for one result population
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassRateRecord {
    key: RecordKey,
    values: BTreeMap<String, f64>,
}

impl PassRateRecord {
    /// Build a pass-rate record, rejecting fields outside the catalog
    pub fn new<S, I>(key: RecordKey, values: I) -> Result<Self, AggregateError>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, f64)>,
    {
        Ok(Self {
            key,
            values: collect_values(values, RecordKind::PassRate)?,
        })
    }

    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    /// Result label text used to find this population's weight
    pub fn overall_result(&self) -> &str {
        &self.key.overall_result
    }

    pub fn get(&self, field: &str) -> f64 {
        self.values.get(field).copied().unwrap_or(0.0)
    }

    pub fn values(&self) -> &BTreeMap<String, f64> {
        &self.values
    }
}

/// Unit totals by result for one segment of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentTotals {
    pub batch: String,
    pub segment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
    pub inspected: u64,
    pub good: u64,
    pub fail_general: u64,
    pub fail_od: u64,
    pub fail_backward: u64,
    pub n_a: u64,
    #[serde(default)]
    pub gate_homes: u64,
    #[serde(default)]
    pub lost_homing: u64,
}

impl SegmentTotals {
    /// Zeroed totals for a segment
    pub fn new(batch: &str, segment: Option<&str>) -> Self {
        Self {
            batch: batch.to_string(),
            segment: segment.map(str::to_string),
            date: None,
            time: None,
            inspected: 0,
            good: 0,
            fail_general: 0,
            fail_od: 0,
            fail_backward: 0,
            n_a: 0,
            gate_homes: 0,
            lost_homing: 0,
        }
    }

    /// Add another segment's counts into this one
    pub fn accumulate(&mut self, other: &SegmentTotals) {
        self.inspected += other.inspected;
        self.good += other.good;
        self.fail_general += other.fail_general;
        self.fail_od += other.fail_od;
        self.fail_backward += other.fail_backward;
        self.n_a += other.n_a;
        self.gate_homes += other.gate_homes;
        self.lost_homing += other.lost_homing;
    }

    /// Batch-level totals summed over the given segments
    pub fn sum<'a>(batch: &str, segments: impl IntoIterator<Item = &'a SegmentTotals>) -> Self {
        let mut total = SegmentTotals::new(batch, None);
        for s in segments {
            total.accumulate(s);
        }
        total
    }
}
