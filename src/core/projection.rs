//! Domain projection - display-ready views of an aggregate result
//!
//! Splits a flat `AggregateResult` into per-station tables using the field
//! catalog's ordering and labels. Projection never computes anything; it
//! only selects, orders and labels.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::aggregate::AggregateResult;
use crate::core::catalog::{Domain, DomainFields, FieldCatalog};
use crate::core::category::Category;
use crate::core::error::AggregateError;
use crate::core::records::{RecordKind, SegmentTotals};

/// One mean field on a station table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeanRow {
    pub field: String,
    pub label: String,
    pub value: f64,
    pub count: u64,
    /// Whether `value` lies within the configured standard, when one exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub within_limits: Option<bool>,
}

/// One pass-rate field on a station table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestRow {
    pub field: String,
    pub label: String,
    pub value: f64,
}

/// Mean and pass-rate tables for one station
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainReport {
    pub domain: Domain,
    pub means: Vec<MeanRow>,
    pub tests: Vec<TestRow>,
}

/// Project `result` onto the fields of one domain
///
/// Fails with `UnknownField` if the result lacks a field the catalog
/// lists, which means the result was built against a different catalog.
pub fn project(fields: &DomainFields, result: &AggregateResult) -> Result<DomainReport, AggregateError> {
    let missing = |field: &str, kind: RecordKind| AggregateError::UnknownField {
        field: field.to_string(),
        kind,
    };

    let mut means = Vec::new();
    for field in fields.mean_fields() {
        let value = *result
            .means
            .get(field)
            .ok_or_else(|| missing(field, RecordKind::Mean))?;
        let count = *result
            .counts
            .get(field)
            .ok_or_else(|| missing(field, RecordKind::Count))?;
        means.push(MeanRow {
            field: field.to_string(),
            label: fields.label(field).unwrap_or(field).to_string(),
            value,
            count,
            within_limits: None,
        });
    }

    let mut tests = Vec::new();
    for field in fields.test_fields() {
        let value = *result
            .tests
            .get(field)
            .ok_or_else(|| missing(field, RecordKind::PassRate))?;
        tests.push(TestRow {
            field: field.to_string(),
            label: fields.label(field).unwrap_or(field).to_string(),
            value,
        });
    }

    Ok(DomainReport {
        domain: fields.domain,
        means,
        tests,
    })
}

/// Acceptance limits for a mean field
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementStandard {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub nominal: Option<f64>,
}

impl MeasurementStandard {
    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// Mark each mean row against its standard
///
/// Rows with no observations stay unmarked; a zero mean there is the
/// no-data default, not a measurement.
pub fn apply_standards(report: &mut DomainReport, standards: &BTreeMap<String, MeasurementStandard>) {
    for row in &mut report.means {
        row.within_limits = match standards.get(&row.field) {
            Some(standard) if row.count > 0 => Some(standard.contains(row.value)),
            _ => None,
        };
    }
}

/// Full statistics report for one (batch, segment, category) query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub batch: String,
    /// Segment id, or "Job Total" for a whole-batch report
    pub segment: String,
    /// When the segment was inspected; unset for a whole-batch report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
    pub category: Category,
    pub category_name: String,
    pub total_weight: u64,
    pub domains: Vec<DomainReport>,
}

impl StatsReport {
    pub const JOB_TOTAL: &'static str = "Job Total";

    /// Project `result` onto each requested domain
    pub fn build(
        catalog: &FieldCatalog,
        batch: &str,
        segment: Option<&str>,
        category: Category,
        result: &AggregateResult,
        domains: &[Domain],
    ) -> Result<Self, AggregateError> {
        let domains = domains
            .iter()
            .map(|d| project(&catalog.fields_for(*d), result))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            batch: batch.to_string(),
            segment: segment.unwrap_or(Self::JOB_TOTAL).to_string(),
            date: None,
            time: None,
            category,
            category_name: category.display_name().to_string(),
            total_weight: result.total_weight,
            domains,
        })
    }

    /// Take the inspection date and time from the segment's totals
    pub fn describe_segment(&mut self, totals: &SegmentTotals) {
        self.date = totals.date;
        self.time = totals.time;
    }

    /// Segment id followed by its date and time when known
    pub fn segment_heading(&self) -> String {
        let mut heading = self.segment.clone();
        if let Some(date) = self.date {
            heading.push_str(&format!(" {}", date));
        }
        if let Some(time) = self.time {
            heading.push_str(&format!(" {}", time.format("%H:%M")));
        }
        heading
    }

    pub fn apply_standards(&mut self, standards: &BTreeMap<String, MeasurementStandard>) {
        if standards.is_empty() {
            return;
        }
        for domain in &mut self.domains {
            apply_standards(domain, standards);
        }
    }
}
