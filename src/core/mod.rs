//! Core module - record types, storage, and the aggregation engine

pub mod aggregate;
pub mod catalog;
pub mod category;
pub mod config;
pub mod error;
pub mod projection;
pub mod records;
pub mod store;
pub mod summary;

pub use aggregate::{
    aggregate_records, AggregateResult, Aggregator, AggregatorConfig, MissingWeightPolicy,
    RecordSet,
};
pub use catalog::{Domain, DomainFields, FieldCatalog, FieldDescriptor, FieldKind, CATALOG_VERSION};
pub use category::{Category, CategoryTable, ResultLabel, WeightField, WeightTable};
pub use config::{Config, ConfigError};
pub use error::AggregateError;
pub use projection::{
    apply_standards, project, DomainReport, MeanRow, MeasurementStandard, StatsReport, TestRow,
};
pub use records::{CountRecord, MeanRecord, PassRateRecord, RecordKey, RecordKind, SegmentTotals};
pub use store::{
    import_dir, import_file, ImportStats, ImportTarget, MemoryStore, RecordSink, RecordStore,
    SqliteStore, StoreError,
};
pub use summary::{list_batches, list_years, summarize_batch, BatchListing, BatchSummary, ResultPercentages};
