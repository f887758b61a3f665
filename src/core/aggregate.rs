//! Weighted aggregation of inspection records
//!
//! Turns the count, mean and pass-rate records matching a
//! (batch, segment, category) query into population-level statistics:
//!
//! - `counts[f]`: occurrences of mean field `f`, summed over count records
//! - `means[f]`: sum over mean records of `m[f] * c[f] / counts[f]`, where
//!   `c` is the count record with the same key
//! - `tests[f]`: sum over pass-rate records of `r[f] * w / total_weight`,
//!   where `w` is the population of the record's result label in its
//!   segment totals
//!
//! A zero denominator contributes zero. Records are sorted by key before
//! accumulating, so the same record set always produces bit-identical
//! output whatever order the store returns it in.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::core::catalog::FieldCatalog;
use crate::core::category::{Category, CategoryTable, ResultLabel, WeightTable};
use crate::core::error::AggregateError;
use crate::core::records::{
    CountRecord, MeanRecord, PassRateRecord, RecordKey, RecordKind, SegmentTotals,
};
use crate::core::store::RecordStore;

/// What to do with a mean record that has no paired count record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingWeightPolicy {
    /// Abort the aggregation with `MissingWeightRecord`
    #[default]
    Fail,
    /// Leave the record out of `means` and log a warning
    Skip,
}

/// Immutable lookup tables and policies owned by an `Aggregator`
#[derive(Debug, Clone, Default)]
pub struct AggregatorConfig {
    pub catalog: FieldCatalog,
    pub categories: CategoryTable,
    pub weights: WeightTable,
    pub missing_weight: MissingWeightPolicy,
}

/// Records retrieved for one aggregation
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub counts: Vec<CountRecord>,
    pub means: Vec<MeanRecord>,
    pub pass_rates: Vec<PassRateRecord>,
    /// Weight source for pass-rate records
    pub segments: Vec<SegmentTotals>,
}

/// Output of one aggregation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub counts: BTreeMap<String, u64>,
    pub means: BTreeMap<String, f64>,
    pub tests: BTreeMap<String, f64>,
    pub total_weight: u64,
}

impl AggregateResult {
    /// All-zero result over the catalog's fields
    pub fn zeroed(catalog: &FieldCatalog) -> Self {
        let mean_fields = catalog.mean_fields();
        Self {
            counts: mean_fields.iter().map(|f| (f.to_string(), 0)).collect(),
            means: mean_fields.iter().map(|f| (f.to_string(), 0.0)).collect(),
            tests: catalog
                .test_fields()
                .iter()
                .map(|f| (f.to_string(), 0.0))
                .collect(),
            total_weight: 0,
        }
    }
}

/// `value * weight / total`, or zero when nothing was observed
fn weighted(value: f64, weight: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else if weight == total {
        value
    } else {
        value * weight as f64 / total as f64
    }
}

/// Aggregates records fetched from a `RecordStore`
///
/// Holds no mutable state; concurrent calls are independent as long as
/// the store supports concurrent reads.
pub struct Aggregator<S> {
    store: S,
    config: AggregatorConfig,
}

impl<S: RecordStore> Aggregator<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, AggregatorConfig::default())
    }

    pub fn with_config(store: S, config: AggregatorConfig) -> Self {
        Self { store, config }
    }

    /// Aggregate a batch (or one of its segments) for a category given by name
    pub fn aggregate_named(
        &self,
        batch: &str,
        segment: Option<&str>,
        category: &str,
    ) -> Result<AggregateResult, AggregateError> {
        self.aggregate(batch, segment, category.parse()?)
    }

    /// Aggregate a batch (or one of its segments) for a category
    pub fn aggregate(
        &self,
        batch: &str,
        segment: Option<&str>,
        category: Category,
    ) -> Result<AggregateResult, AggregateError> {
        let set = self.fetch(batch, segment, category)?;
        log::debug!(
            "aggregating {} {}/{}: {} count, {} mean, {} pass-rate record(s)",
            category,
            batch,
            segment.unwrap_or("*"),
            set.counts.len(),
            set.means.len(),
            set.pass_rates.len()
        );
        aggregate_records(&self.config, set)
    }

    /// Retrieve the records a (batch, segment, category) query covers
    pub fn fetch(
        &self,
        batch: &str,
        segment: Option<&str>,
        category: Category,
    ) -> Result<RecordSet, AggregateError> {
        if batch.trim().is_empty() {
            return Err(AggregateError::EmptyBatch);
        }
        let label = self.config.categories.filter_for(category);
        Ok(RecordSet {
            counts: self.store.query_counts(batch, segment, label)?,
            means: self.store.query_means(batch, segment, label)?,
            pass_rates: self.store.query_pass_rates(batch, segment, label)?,
            segments: self.store.query_segment_totals(batch, segment)?,
        })
    }
}

fn sorted_by_key<T>(mut records: Vec<T>, key: impl Fn(&T) -> &RecordKey) -> Vec<T> {
    records.sort_by(|a, b| key(a).cmp(key(b)));
    records
}

/// Aggregate an already-retrieved record set
pub fn aggregate_records(
    config: &AggregatorConfig,
    set: RecordSet,
) -> Result<AggregateResult, AggregateError> {
    let count_records = sorted_by_key(set.counts, CountRecord::key);
    let mean_records = sorted_by_key(set.means, MeanRecord::key);
    let pass_rate_records = sorted_by_key(set.pass_rates, PassRateRecord::key);

    let mut result = AggregateResult::zeroed(&config.catalog);

    // Count totals, indexing each count record by key for the mean pass
    let mut weights_by_key: HashMap<&RecordKey, &CountRecord> = HashMap::new();
    for record in &count_records {
        if weights_by_key.insert(record.key(), record).is_some() {
            return Err(AggregateError::DuplicateRecord {
                kind: RecordKind::Count,
                key: record.key().clone(),
            });
        }
        for (field, total) in result.counts.iter_mut() {
            *total += record.get(field);
        }
    }

    // Means, each record weighted by its paired count record
    let mut paired_means = 0usize;
    let mut seen = HashSet::new();
    for record in &mean_records {
        if !seen.insert(record.key()) {
            return Err(AggregateError::DuplicateRecord {
                kind: RecordKind::Mean,
                key: record.key().clone(),
            });
        }
        let Some(paired) = weights_by_key.get(record.key()) else {
            match config.missing_weight {
                MissingWeightPolicy::Fail => {
                    return Err(AggregateError::MissingWeightRecord {
                        key: record.key().clone(),
                    })
                }
                MissingWeightPolicy::Skip => {
                    log::warn!("skipping mean record {} with no count record", record.key());
                    continue;
                }
            }
        };
        for (field, mean) in result.means.iter_mut() {
            let total = result.counts.get(field).copied().unwrap_or(0);
            *mean += weighted(record.get(field), paired.get(field), total);
        }
        paired_means += 1;
    }

    // Pass rates, each record weighted by its label's population
    let totals = SegmentIndex::new(&set.segments);
    let mut record_weights = Vec::with_capacity(pass_rate_records.len());
    let mut seen = HashSet::new();
    for record in &pass_rate_records {
        if !seen.insert(record.key()) {
            return Err(AggregateError::DuplicateRecord {
                kind: RecordKind::PassRate,
                key: record.key().clone(),
            });
        }
        let label = ResultLabel::parse(record.overall_result()).ok_or_else(|| {
            AggregateError::UnknownResultLabel {
                label: record.overall_result().to_string(),
                key: record.key().clone(),
            }
        })?;
        let segment_totals = totals.lookup(record.key())?;
        let weight = config.weights.weight(label, &segment_totals);
        result.total_weight += weight;
        record_weights.push(weight);
    }

    for (record, weight) in pass_rate_records.iter().zip(record_weights) {
        for (field, rate) in result.tests.iter_mut() {
            *rate += weighted(record.get(field), weight, result.total_weight);
        }
    }

    log::debug!(
        "aggregated {} mean record(s), {} pass-rate record(s), total weight {}",
        paired_means,
        pass_rate_records.len(),
        result.total_weight
    );
    Ok(result)
}

/// Segment totals indexed by (batch, segment)
struct SegmentIndex<'a> {
    segments: &'a [SegmentTotals],
    by_key: HashMap<(&'a str, Option<&'a str>), &'a SegmentTotals>,
}

impl<'a> SegmentIndex<'a> {
    fn new(segments: &'a [SegmentTotals]) -> Self {
        let by_key = segments
            .iter()
            .map(|s| ((s.batch.as_str(), s.segment.as_deref()), s))
            .collect();
        Self { segments, by_key }
    }

    /// Totals a record draws its weight from
    ///
    /// A record tied to a segment uses that segment's totals; a record
    /// without a segment uses the whole batch.
    fn lookup(&self, key: &RecordKey) -> Result<SegmentTotals, AggregateError> {
        if let Some(totals) = self
            .by_key
            .get(&(key.batch.as_str(), key.segment.as_deref()))
        {
            return Ok((*totals).clone());
        }
        if key.segment.is_none() {
            let batch: Vec<&SegmentTotals> = self
                .segments
                .iter()
                .filter(|s| s.batch == key.batch)
                .collect();
            if !batch.is_empty() {
                return Ok(SegmentTotals::sum(&key.batch, batch));
            }
        }
        Err(AggregateError::MissingSegmentTotals {
            batch: key.batch.clone(),
            segment: key.segment.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryStore;

    fn key(segment: &str, result: &str) -> RecordKey {
        RecordKey::new("B1", Some(segment), result)
    }

    #[test]
    fn test_weighted_zero_total_is_zero() {
        assert_eq!(weighted(42.0, 0, 0), 0.0);
        assert_eq!(weighted(42.0, 5, 0), 0.0);
    }

    #[test]
    fn test_weighted_full_weight_is_exact() {
        assert_eq!(weighted(0.1, 3, 3), 0.1);
        assert_eq!(weighted(2.0, 1, 4), 0.5);
    }

    #[test]
    fn test_zeroed_result_covers_catalog() {
        let result = AggregateResult::zeroed(&FieldCatalog::standard());
        assert_eq!(result.counts.len(), 19);
        assert_eq!(result.means.len(), 19);
        assert_eq!(result.tests.len(), 30);
        assert_eq!(result.total_weight, 0);
    }

    #[test]
    fn test_empty_batch_rejected() {
        let aggregator = Aggregator::new(MemoryStore::new());
        let result = aggregator.aggregate("  ", None, Category::Inspected);
        assert!(matches!(result, Err(AggregateError::EmptyBatch)));
    }

    #[test]
    fn test_duplicate_count_record_rejected() {
        let set = RecordSet {
            counts: vec![
                CountRecord::new(key("1", "Good"), [("flat_chip_area", 1)]).unwrap(),
                CountRecord::new(key("1", "Good"), [("flat_chip_area", 2)]).unwrap(),
            ],
            ..RecordSet::default()
        };
        let result = aggregate_records(&AggregatorConfig::default(), set);
        assert!(matches!(
            result,
            Err(AggregateError::DuplicateRecord {
                kind: RecordKind::Count,
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_mean_record_rejected() {
        let set = RecordSet {
            counts: vec![CountRecord::new(key("1", "Good"), [("flat_chip_area", 4)]).unwrap()],
            means: vec![
                MeanRecord::new(key("1", "Good"), [("flat_chip_area", 2.5)]).unwrap(),
                MeanRecord::new(key("1", "Good"), [("flat_chip_area", 3.5)]).unwrap(),
            ],
            ..RecordSet::default()
        };
        let result = aggregate_records(&AggregatorConfig::default(), set);
        assert!(matches!(
            result,
            Err(AggregateError::DuplicateRecord {
                kind: RecordKind::Mean,
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_pass_rate_record_rejected() {
        let set = RecordSet {
            pass_rates: vec![
                PassRateRecord::new(key("1", "Good"), [("flat_valid", 80.0)]).unwrap(),
                PassRateRecord::new(key("1", "Good"), [("flat_valid", 90.0)]).unwrap(),
            ],
            segments: vec![SegmentTotals {
                good: 5,
                ..SegmentTotals::new("B1", Some("1"))
            }],
            ..RecordSet::default()
        };
        let result = aggregate_records(&AggregatorConfig::default(), set);
        assert!(matches!(
            result,
            Err(AggregateError::DuplicateRecord {
                kind: RecordKind::PassRate,
                ..
            })
        ));
    }

    #[test]
    fn test_skip_policy_leaves_counts_untouched() {
        let config = AggregatorConfig {
            missing_weight: MissingWeightPolicy::Skip,
            ..AggregatorConfig::default()
        };
        let set = RecordSet {
            counts: vec![CountRecord::new(key("1", "Good"), [("flat_chip_area", 4)]).unwrap()],
            means: vec![
                MeanRecord::new(key("1", "Good"), [("flat_chip_area", 2.5)]).unwrap(),
                MeanRecord::new(key("2", "Good"), [("flat_chip_area", 99.0)]).unwrap(),
            ],
            ..RecordSet::default()
        };
        let result = aggregate_records(&config, set).unwrap();
        assert_eq!(result.counts["flat_chip_area"], 4);
        assert_eq!(result.means["flat_chip_area"], 2.5);
    }

    #[test]
    fn test_batch_level_pass_rate_uses_summed_totals() {
        let set = RecordSet {
            pass_rates: vec![PassRateRecord::new(
                RecordKey::new("B1", None, "Fail"),
                [("flat_valid", 80.0)],
            )
            .unwrap()],
            segments: vec![
                SegmentTotals {
                    fail_general: 3,
                    ..SegmentTotals::new("B1", Some("1"))
                },
                SegmentTotals {
                    fail_general: 7,
                    ..SegmentTotals::new("B1", Some("2"))
                },
            ],
            ..RecordSet::default()
        };
        let result = aggregate_records(&AggregatorConfig::default(), set).unwrap();
        assert_eq!(result.total_weight, 10);
        assert_eq!(result.tests["flat_valid"], 80.0);
    }

    #[test]
    fn test_missing_segment_totals_is_an_error() {
        let set = RecordSet {
            pass_rates: vec![
                PassRateRecord::new(key("9", "Good"), [("flat_valid", 80.0)]).unwrap(),
            ],
            ..RecordSet::default()
        };
        let result = aggregate_records(&AggregatorConfig::default(), set);
        assert!(matches!(
            result,
            Err(AggregateError::MissingSegmentTotals { ref segment, .. }) if segment.as_deref() == Some("9")
        ));
    }
}
