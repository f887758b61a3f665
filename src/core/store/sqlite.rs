//! SQLite-backed record store
//!
//! Record values live in one narrow table keyed by
//! (batch, segment, overall_result, kind, field) so the catalog can grow
//! without schema migrations. Segment totals get their own table.

use chrono::{NaiveDate, NaiveTime};
use rusqlite::types::{FromSql, Type};
use rusqlite::{params, Connection, Row};
use rust_embed::Embed;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::catalog::CATALOG_VERSION;
use crate::core::category::ResultLabel;
use crate::core::records::{
    CountRecord, MeanRecord, PassRateRecord, RecordKey, RecordKind, SegmentTotals,
};

use super::import::ImportTarget;
use super::{key_matches, RecordSink, RecordStore, StoreError};

#[derive(Embed)]
#[folder = "schemas/"]
struct EmbeddedSchemas;

const SCHEMA_FILE: &str = "store.sql";

/// Record store persisted in a SQLite database file
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.ensure_schema()?;
        log::debug!("opened record store at {}", path.display());
        Ok(store)
    }

    /// Open a database that must already exist
    pub fn open_existing(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!(
                    "record store {} does not exist (run `insp init`)",
                    path.display()
                ),
            )));
        }
        Self::open(path)
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Catalog version the database was created with
    pub fn catalog_version(&self) -> Result<Option<u32>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM meta WHERE key = 'catalog_version'")?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => {
                let value: String = row.get(0)?;
                Ok(value.parse().ok())
            }
            None => Ok(None),
        }
    }

    fn ensure_schema(&self) -> Result<(), StoreError> {
        let file = EmbeddedSchemas::get(SCHEMA_FILE)
            .ok_or_else(|| StoreError::MissingSchema(SCHEMA_FILE.to_string()))?;
        let sql = String::from_utf8_lossy(&file.data);
        self.conn.execute_batch(&sql)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES ('catalog_version', ?1)",
            [CATALOG_VERSION.to_string()],
        )?;
        Ok(())
    }

    fn load_grouped<V: FromSql>(
        &self,
        kind: RecordKind,
        batch: &str,
        segment: Option<&str>,
        label: Option<ResultLabel>,
    ) -> Result<BTreeMap<RecordKey, Vec<(String, V)>>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT segment, overall_result, field, value FROM record_values
             WHERE kind = ?1 AND batch = ?2 AND (?3 IS NULL OR segment = ?3)
             ORDER BY segment, overall_result, field",
        )?;
        let rows = stmt.query_map(params![kind, batch, segment], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, V>(3)?,
            ))
        })?;

        let mut grouped: BTreeMap<RecordKey, Vec<(String, V)>> = BTreeMap::new();
        for row in rows {
            let (seg, overall_result, field, value) = row?;
            let key = RecordKey {
                batch: batch.to_string(),
                segment: segment_from_sql(seg),
                overall_result,
            };
            if !key_matches(&key, batch, segment, label) {
                continue;
            }
            grouped.entry(key).or_default().push((field, value));
        }
        Ok(grouped)
    }

    fn replace_values<V: rusqlite::ToSql>(
        &mut self,
        kind: RecordKind,
        key: &RecordKey,
        values: impl Iterator<Item = (String, V)>,
    ) -> Result<(), StoreError> {
        let segment = segment_to_sql(key.segment.as_deref());
        self.conn.execute(
            "DELETE FROM record_values
             WHERE batch = ?1 AND segment = ?2 AND overall_result = ?3 AND kind = ?4",
            params![key.batch, segment, key.overall_result, kind],
        )?;
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO record_values (batch, segment, overall_result, kind, field, value)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for (field, value) in values {
            stmt.execute(params![key.batch, segment, key.overall_result, kind, field, value])?;
        }
        Ok(())
    }

    fn query_segments(
        &self,
        batch: Option<&str>,
        segment: Option<&str>,
    ) -> Result<Vec<SegmentTotals>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT batch, segment, date, time, inspected, good, fail_general, fail_od,
                    fail_backward, n_a, gate_homes, lost_homing
             FROM segments
             WHERE (?1 IS NULL OR batch = ?1) AND (?2 IS NULL OR segment = ?2)
             ORDER BY batch, date, time, segment",
        )?;
        let rows = stmt.query_map(params![batch, segment], read_segment)?;
        let mut totals = Vec::new();
        for row in rows {
            totals.push(row?);
        }
        Ok(totals)
    }
}

fn segment_to_sql(segment: Option<&str>) -> &str {
    segment.unwrap_or("")
}

fn segment_from_sql(segment: String) -> Option<String> {
    if segment.is_empty() {
        None
    } else {
        Some(segment)
    }
}

fn invalid_row(key: &RecordKey, message: impl std::fmt::Display) -> StoreError {
    StoreError::InvalidRow {
        key: key.to_string(),
        message: message.to_string(),
    }
}

fn sql_count(value: u64) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|e| StoreError::InvalidRow {
        key: value.to_string(),
        message: e.to_string(),
    })
}

fn get_count(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let value: i64 = row.get(idx)?;
    u64::try_from(value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

fn read_segment(row: &Row<'_>) -> rusqlite::Result<SegmentTotals> {
    let date = row
        .get::<_, Option<String>>(2)?
        .map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d"))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
    let time = row
        .get::<_, Option<String>>(3)?
        .map(|s| NaiveTime::parse_from_str(&s, "%H:%M:%S%.f"))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(SegmentTotals {
        batch: row.get(0)?,
        segment: segment_from_sql(row.get(1)?),
        date,
        time,
        inspected: get_count(row, 4)?,
        good: get_count(row, 5)?,
        fail_general: get_count(row, 6)?,
        fail_od: get_count(row, 7)?,
        fail_backward: get_count(row, 8)?,
        n_a: get_count(row, 9)?,
        gate_homes: get_count(row, 10)?,
        lost_homing: get_count(row, 11)?,
    })
}

impl RecordStore for SqliteStore {
    fn query_counts(
        &self,
        batch: &str,
        segment: Option<&str>,
        label: Option<ResultLabel>,
    ) -> Result<Vec<CountRecord>, StoreError> {
        let grouped = self.load_grouped::<i64>(RecordKind::Count, batch, segment, label)?;
        let mut records = Vec::with_capacity(grouped.len());
        for (key, values) in grouped {
            let mut counts = Vec::with_capacity(values.len());
            for (field, value) in values {
                let value = u64::try_from(value).map_err(|e| invalid_row(&key, e))?;
                counts.push((field, value));
            }
            records.push(CountRecord::new(key.clone(), counts).map_err(|e| invalid_row(&key, e))?);
        }
        Ok(records)
    }

    fn query_means(
        &self,
        batch: &str,
        segment: Option<&str>,
        label: Option<ResultLabel>,
    ) -> Result<Vec<MeanRecord>, StoreError> {
        self.load_grouped::<f64>(RecordKind::Mean, batch, segment, label)?
            .into_iter()
            .map(|(key, values)| {
                MeanRecord::new(key.clone(), values).map_err(|e| invalid_row(&key, e))
            })
            .collect()
    }

    fn query_pass_rates(
        &self,
        batch: &str,
        segment: Option<&str>,
        label: Option<ResultLabel>,
    ) -> Result<Vec<PassRateRecord>, StoreError> {
        self.load_grouped::<f64>(RecordKind::PassRate, batch, segment, label)?
            .into_iter()
            .map(|(key, values)| {
                PassRateRecord::new(key.clone(), values).map_err(|e| invalid_row(&key, e))
            })
            .collect()
    }

    fn query_segment_totals(
        &self,
        batch: &str,
        segment: Option<&str>,
    ) -> Result<Vec<SegmentTotals>, StoreError> {
        self.query_segments(Some(batch), segment)
    }

    fn all_segments(&self) -> Result<Vec<SegmentTotals>, StoreError> {
        self.query_segments(None, None)
    }
}

impl RecordSink for SqliteStore {
    fn put_segment(&mut self, totals: SegmentTotals) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO segments
             (batch, segment, date, time, inspected, good, fail_general, fail_od,
              fail_backward, n_a, gate_homes, lost_homing)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                totals.batch,
                segment_to_sql(totals.segment.as_deref()),
                totals.date.map(|d| d.format("%Y-%m-%d").to_string()),
                totals.time.map(|t| t.format("%H:%M:%S%.f").to_string()),
                sql_count(totals.inspected)?,
                sql_count(totals.good)?,
                sql_count(totals.fail_general)?,
                sql_count(totals.fail_od)?,
                sql_count(totals.fail_backward)?,
                sql_count(totals.n_a)?,
                sql_count(totals.gate_homes)?,
                sql_count(totals.lost_homing)?,
            ],
        )?;
        Ok(())
    }

    fn put_count(&mut self, record: CountRecord) -> Result<(), StoreError> {
        let mut values = Vec::with_capacity(record.values().len());
        for (field, value) in record.values() {
            values.push((field.clone(), sql_count(*value)?));
        }
        self.replace_values(RecordKind::Count, record.key(), values.into_iter())
    }

    fn put_mean(&mut self, record: MeanRecord) -> Result<(), StoreError> {
        let values = record.values().iter().map(|(f, v)| (f.clone(), *v));
        self.replace_values(RecordKind::Mean, record.key(), values)
    }

    fn put_pass_rate(&mut self, record: PassRateRecord) -> Result<(), StoreError> {
        let values = record.values().iter().map(|(f, v)| (f.clone(), *v));
        self.replace_values(RecordKind::PassRate, record.key(), values)
    }
}

impl ImportTarget for SqliteStore {
    fn begin(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}
