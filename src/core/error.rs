//! Error taxonomy for catalog lookups and aggregation

use miette::Diagnostic;
use thiserror::Error;

use crate::core::records::{RecordKey, RecordKind};
use crate::core::store::StoreError;

/// Errors raised while resolving fields or aggregating inspection records
///
/// The zero-weight arithmetic policy is not an error: a zero denominator
/// yields a zero contribution and never reaches this type.
#[derive(Debug, Error, Diagnostic)]
pub enum AggregateError {
    #[error("Unknown domain: '{0}'")]
    #[diagnostic(
        code(insp::unknown_domain),
        help("valid domains are: round, flat, dimension, cosmetic")
    )]
    UnknownDomain(String),

    #[error("Batch identifier must not be empty")]
    #[diagnostic(code(insp::empty_batch))]
    EmptyBatch,

    #[error("Unknown category: '{0}'")]
    #[diagnostic(
        code(insp::unknown_category),
        help("valid categories are: inspected, good, fail, fail_od, fail_backward, fail_na")
    )]
    UnknownCategory(String),

    #[error("Unknown result label '{label}' on {key}")]
    #[diagnostic(
        code(insp::unknown_result_label),
        help("recognized labels are: Good, Fail, Fail - OD Envelope, Backwards, N/A")
    )]
    UnknownResultLabel { label: String, key: RecordKey },

    #[error("No count record found for mean record {key}")]
    #[diagnostic(
        code(insp::missing_weight_record),
        help("every mean record needs a count record with the same batch, segment and result; set `missing_weight: skip` to ignore such records")
    )]
    MissingWeightRecord { key: RecordKey },

    #[error("Unknown field '{field}' for {kind} values")]
    #[diagnostic(code(insp::unknown_field))]
    UnknownField { field: String, kind: RecordKind },

    #[error("Duplicate {kind} record for {key}")]
    #[diagnostic(code(insp::duplicate_record))]
    DuplicateRecord { kind: RecordKind, key: RecordKey },

    #[error("No segment totals found for batch '{batch}', segment '{}'", .segment.as_deref().unwrap_or("-"))]
    #[diagnostic(
        code(insp::missing_segment_totals),
        help("pass-rate weights are read from the segment totals; import the segment summary first")
    )]
    MissingSegmentTotals {
        batch: String,
        segment: Option<String>,
    },

    #[error(transparent)]
    #[diagnostic(code(insp::store))]
    Store(#[from] StoreError),
}
