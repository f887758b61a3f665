//! CSV import into a record store
//!
//! A directory is walked for `*.csv` files and each file is routed by its
//! name: `segments*` (or `summary*`) files hold segment totals, `counts*`,
//! `means*` and `pass_rates*` hold records. Record files carry `batch`,
//! `segment` and `overall_result` columns followed by one column per
//! catalog field.

use serde::Serialize;
use std::path::Path;
use walkdir::WalkDir;

use crate::core::catalog::FieldCatalog;
use crate::core::error::AggregateError;
use crate::core::records::{
    CountRecord, MeanRecord, PassRateRecord, RecordKey, RecordKind, SegmentTotals,
};

use super::{MemoryStore, RecordSink, StoreError};

/// A sink that can group an import into one unit of work
pub trait ImportTarget: RecordSink {
    fn begin(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

impl ImportTarget for MemoryStore {
    fn begin(&mut self) -> Result<(), StoreError> {
        let snapshot = MemoryStore {
            saved: None,
            ..self.clone()
        };
        self.saved = Some(Box::new(snapshot));
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.saved = None;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        if let Some(saved) = self.saved.take() {
            *self = *saved;
        }
        Ok(())
    }
}

/// Roll back after a failed import, keeping the import error
fn abort<T: ImportTarget>(target: &mut T, err: AggregateError) -> AggregateError {
    if let Err(rollback) = target.rollback() {
        log::warn!("rollback after failed import also failed: {}", rollback);
    }
    err
}

/// What an import loaded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub files: usize,
    pub skipped_files: usize,
    pub segments: usize,
    pub counts: usize,
    pub means: usize,
    pub pass_rates: usize,
}

impl ImportStats {
    pub fn records(&self) -> usize {
        self.counts + self.means + self.pass_rates
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Segments,
    Records(RecordKind),
}

fn classify(path: &Path) -> Option<FileKind> {
    if !path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
    {
        return None;
    }
    let stem = path.file_stem()?.to_string_lossy().to_lowercase();
    if stem.starts_with("segment") || stem.starts_with("summar") {
        Some(FileKind::Segments)
    } else if stem.starts_with("count") {
        Some(FileKind::Records(RecordKind::Count))
    } else if stem.starts_with("mean") {
        Some(FileKind::Records(RecordKind::Mean))
    } else if stem.starts_with("pass_rate") || stem.starts_with("pass-rate") {
        Some(FileKind::Records(RecordKind::PassRate))
    } else {
        None
    }
}

/// Import every recognized CSV file under `dir` in a single transaction
pub fn import_dir<T: ImportTarget>(target: &mut T, dir: &Path) -> Result<ImportStats, AggregateError> {
    let mut files = Vec::new();
    let mut stats = ImportStats::default();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| StoreError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        match classify(entry.path()) {
            Some(kind) => files.push((entry.path().to_path_buf(), kind)),
            None => {
                log::debug!("skipping {}", entry.path().display());
                stats.skipped_files += 1;
            }
        }
    }

    // Segment totals first so a partially failed import never leaves
    // records without their weight source.
    files.sort_by_key(|(_, kind)| *kind != FileKind::Segments);

    target.begin()?;
    for (path, kind) in &files {
        if let Err(e) = import_one(target, path, *kind, &mut stats) {
            return Err(abort(target, e));
        }
    }
    target.commit()?;

    log::info!(
        "imported {} segment(s) and {} record(s) from {} file(s)",
        stats.segments,
        stats.records(),
        stats.files
    );
    Ok(stats)
}

/// Import one CSV file, routed by its name
pub fn import_file<T: ImportTarget>(target: &mut T, path: &Path) -> Result<ImportStats, AggregateError> {
    let mut stats = ImportStats::default();
    let Some(kind) = classify(path) else {
        stats.skipped_files += 1;
        return Ok(stats);
    };

    target.begin()?;
    if let Err(e) = import_one(target, path, kind, &mut stats) {
        return Err(abort(target, e));
    }
    target.commit()?;
    Ok(stats)
}

fn import_one<T: RecordSink>(
    target: &mut T,
    path: &Path,
    kind: FileKind,
    stats: &mut ImportStats,
) -> Result<(), AggregateError> {
    log::debug!("importing {}", path.display());
    match kind {
        FileKind::Segments => import_segments(target, path, stats)?,
        FileKind::Records(record_kind) => import_records(target, path, record_kind, stats)?,
    }
    stats.files += 1;
    Ok(())
}

fn import_segments<T: RecordSink>(
    target: &mut T,
    path: &Path,
    stats: &mut ImportStats,
) -> Result<(), AggregateError> {
    let mut rdr = csv::Reader::from_path(path).map_err(StoreError::from)?;
    for row in rdr.deserialize::<SegmentTotals>() {
        let totals = row.map_err(StoreError::from)?;
        target.put_segment(totals)?;
        stats.segments += 1;
    }
    Ok(())
}

fn bad_cell(path: &Path, line: u64, message: impl std::fmt::Display) -> StoreError {
    StoreError::InvalidRow {
        key: format!("{}:{}", path.display(), line),
        message: message.to_string(),
    }
}

fn import_records<T: RecordSink>(
    target: &mut T,
    path: &Path,
    kind: RecordKind,
    stats: &mut ImportStats,
) -> Result<(), AggregateError> {
    let catalog = FieldCatalog::standard();
    let mut rdr = csv::Reader::from_path(path).map_err(StoreError::from)?;
    let headers = rdr.headers().map_err(StoreError::from)?.clone();

    let column = |name: &str| headers.iter().position(|h| h.trim() == name);
    let batch_idx = column("batch").ok_or_else(|| bad_cell(path, 1, "missing 'batch' column"))?;
    let result_idx = column("overall_result")
        .ok_or_else(|| bad_cell(path, 1, "missing 'overall_result' column"))?;
    let segment_idx = column("segment");

    let mut fields = Vec::new();
    for (idx, header) in headers.iter().enumerate() {
        let header = header.trim();
        if matches!(header, "batch" | "segment" | "overall_result" | "id") {
            continue;
        }
        catalog.check_field(header, kind)?;
        fields.push((idx, header.to_string()));
    }

    for row in rdr.records() {
        let row = row.map_err(StoreError::from)?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let segment = segment_idx
            .and_then(|i| row.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let key = RecordKey::new(
            row.get(batch_idx).unwrap_or("").trim(),
            segment,
            row.get(result_idx).unwrap_or("").trim(),
        );
        if key.batch.is_empty() {
            return Err(bad_cell(path, line, "empty batch").into());
        }

        let cells = fields
            .iter()
            .filter_map(|(idx, field)| {
                let cell = row.get(*idx)?.trim();
                (!cell.is_empty()).then_some((field.as_str(), cell))
            });

        match kind {
            RecordKind::Count => {
                let mut values = Vec::new();
                for (field, cell) in cells {
                    let value: u64 = cell
                        .parse()
                        .map_err(|e| bad_cell(path, line, format!("{}: {}", field, e)))?;
                    values.push((field.to_string(), value));
                }
                target.put_count(CountRecord::new(key, values)?)?;
                stats.counts += 1;
            }
            RecordKind::Mean | RecordKind::PassRate => {
                let mut values = Vec::new();
                for (field, cell) in cells {
                    let value: f64 = cell
                        .parse()
                        .map_err(|e| bad_cell(path, line, format!("{}: {}", field, e)))?;
                    values.push((field.to_string(), value));
                }
                if kind == RecordKind::Mean {
                    target.put_mean(MeanRecord::new(key, values)?)?;
                    stats.means += 1;
                } else {
                    target.put_pass_rate(PassRateRecord::new(key, values)?)?;
                    stats.pass_rates += 1;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_file_names() {
        assert_eq!(
            classify(Path::new("b1/segments.csv")),
            Some(FileKind::Segments)
        );
        assert_eq!(
            classify(Path::new("summary_2024.CSV")),
            Some(FileKind::Segments)
        );
        assert_eq!(
            classify(Path::new("counts-b1.csv")),
            Some(FileKind::Records(RecordKind::Count))
        );
        assert_eq!(
            classify(Path::new("pass_rates.csv")),
            Some(FileKind::Records(RecordKind::PassRate))
        );
        assert_eq!(classify(Path::new("means.txt")), None);
        assert_eq!(classify(Path::new("notes.csv")), None);
    }
}
