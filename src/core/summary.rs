//! Batch summaries and listings built from segment totals

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::core::error::AggregateError;
use crate::core::records::SegmentTotals;
use crate::core::store::RecordStore;

/// Share of inspected units per result, in percent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ResultPercentages {
    pub good: f64,
    pub fail_general: f64,
    pub fail_od: f64,
    pub fail_backward: f64,
    pub n_a: f64,
}

/// Totals for a whole batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub batch: String,
    pub totals: SegmentTotals,
    pub percent: ResultPercentages,
    pub segments: Vec<SegmentTotals>,
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

impl ResultPercentages {
    pub fn of(totals: &SegmentTotals) -> Self {
        Self {
            good: percent(totals.good, totals.inspected),
            fail_general: percent(totals.fail_general, totals.inspected),
            fail_od: percent(totals.fail_od, totals.inspected),
            fail_backward: percent(totals.fail_backward, totals.inspected),
            n_a: percent(totals.n_a, totals.inspected),
        }
    }
}

/// Sum every segment of `batch`
pub fn summarize_batch<S: RecordStore>(store: &S, batch: &str) -> Result<BatchSummary, AggregateError> {
    if batch.trim().is_empty() {
        return Err(AggregateError::EmptyBatch);
    }
    let segments = store.query_segment_totals(batch, None)?;
    let totals = SegmentTotals::sum(batch, &segments);
    Ok(BatchSummary {
        batch: batch.to_string(),
        percent: ResultPercentages::of(&totals),
        totals,
        segments,
    })
}

/// One line of a batch listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchListing {
    pub batch: String,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub segments: usize,
    pub inspected: u64,
}

/// Batches with at least one segment in the given year (and month)
///
/// Without a year every batch is listed, including segments with no date.
pub fn list_batches<S: RecordStore>(
    store: &S,
    year: Option<i32>,
    month: Option<u32>,
) -> Result<Vec<BatchListing>, AggregateError> {
    let in_period = |s: &SegmentTotals| match (year, s.date) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(y), Some(d)) => d.year() == y && month.map_or(true, |m| d.month() == m),
    };

    let mut batches: BTreeMap<String, BatchListing> = BTreeMap::new();
    for segment in store.all_segments()?.into_iter().filter(in_period) {
        let entry = batches
            .entry(segment.batch.clone())
            .or_insert_with(|| BatchListing {
                batch: segment.batch.clone(),
                first_date: None,
                last_date: None,
                segments: 0,
                inspected: 0,
            });
        entry.segments += 1;
        entry.inspected += segment.inspected;
        if let Some(date) = segment.date {
            entry.first_date = Some(entry.first_date.map_or(date, |d| d.min(date)));
            entry.last_date = Some(entry.last_date.map_or(date, |d| d.max(date)));
        }
    }
    Ok(batches.into_values().collect())
}

/// Distinct years with dated segments, ascending
pub fn list_years<S: RecordStore>(store: &S) -> Result<Vec<i32>, AggregateError> {
    let mut years: Vec<i32> = store
        .all_segments()?
        .iter()
        .filter_map(|s| s.date.map(|d| d.year()))
        .collect();
    years.sort_unstable();
    years.dedup();
    Ok(years)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryStore;

    fn segment(batch: &str, id: &str, date: &str, inspected: u64, good: u64) -> SegmentTotals {
        SegmentTotals {
            date: Some(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()),
            inspected,
            good,
            fail_general: inspected - good,
            ..SegmentTotals::new(batch, Some(id))
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_segment(segment("A100", "1", "2024-03-04", 100, 90))
            .with_segment(segment("A100", "2", "2024-03-05", 100, 70))
            .with_segment(segment("B200", "3", "2024-04-01", 50, 50))
            .with_segment(segment("C300", "4", "2023-12-30", 10, 5))
    }

    #[test]
    fn test_summarize_batch_percentages() {
        let summary = summarize_batch(&store(), "A100").unwrap();
        assert_eq!(summary.segments.len(), 2);
        assert_eq!(summary.totals.inspected, 200);
        assert_eq!(summary.totals.good, 160);
        assert_eq!(summary.percent.good, 80.0);
        assert_eq!(summary.percent.fail_general, 20.0);
    }

    #[test]
    fn test_summarize_unknown_batch_is_all_zero() {
        let summary = summarize_batch(&store(), "Z999").unwrap();
        assert!(summary.segments.is_empty());
        assert_eq!(summary.totals.inspected, 0);
        assert_eq!(summary.percent, ResultPercentages::default());
    }

    #[test]
    fn test_list_batches_by_month() {
        let march = list_batches(&store(), Some(2024), Some(3)).unwrap();
        assert_eq!(march.len(), 1);
        assert_eq!(march[0].batch, "A100");
        assert_eq!(march[0].segments, 2);
        assert_eq!(march[0].inspected, 200);
        assert_eq!(
            march[0].last_date,
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );

        let all = list_batches(&store(), None, None).unwrap();
        let names: Vec<&str> = all.iter().map(|b| b.batch.as_str()).collect();
        assert_eq!(names, ["A100", "B200", "C300"]);
    }

    #[test]
    fn test_list_years() {
        assert_eq!(list_years(&store()).unwrap(), vec![2023, 2024]);
    }
}
