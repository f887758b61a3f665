//! Shared test helpers for integration tests
//!
//! This module provides common utilities used across all test files.

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use insp::core::{CountRecord, MeanRecord, PassRateRecord, RecordKey, SegmentTotals};

pub const SEGMENTS_CSV: &str = "\
batch,segment,date,time,inspected,good,fail_general,fail_od,fail_backward,n_a,gate_homes,lost_homing
B1,1,2024-03-04,06:00:00,60,50,10,0,0,0,1,0
B1,2,2024-03-04,14:00:00,25,20,0,5,0,0,0,2
B2,1,2023-11-20,06:00:00,10,10,0,0,0,0,0,0
";

pub const COUNTS_CSV: &str = "\
batch,segment,overall_result,flat_chip_area
B1,1,Good,10
B1,2,Good,20
B1,1,Fail,4
";

pub const MEANS_CSV: &str = "\
batch,segment,overall_result,flat_chip_area
B1,1,Good,5.0
B1,2,Good,8.0
B1,1,Fail,2.5
";

pub const PASS_RATES_CSV: &str = "\
batch,segment,overall_result,round_valid
B1,1,Good,95.0
";

/// Helper to get an insp command isolated from the caller's environment
pub fn insp() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("insp"));
    cmd.env_remove("INSP_DATABASE").env_remove("RUST_LOG");
    cmd
}

/// Database path used inside a test directory
pub fn db_path(tmp: &TempDir) -> PathBuf {
    tmp.path().join("data/inspection.db")
}

/// Write the standard fixture exports under `dir`
pub fn write_fixtures(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("segments.csv"), SEGMENTS_CSV).unwrap();
    fs::write(dir.join("counts.csv"), COUNTS_CSV).unwrap();
    fs::write(dir.join("means.csv"), MEANS_CSV).unwrap();
    fs::write(dir.join("pass_rates.csv"), PASS_RATES_CSV).unwrap();
}

/// Run `insp` in `tmp` against the test database
pub fn insp_in(tmp: &TempDir) -> Command {
    let mut cmd = insp();
    cmd.current_dir(tmp.path()).arg("--db").arg(db_path(tmp));
    cmd
}

/// Create a temp directory with an initialized store holding the fixtures
pub fn setup_loaded_store() -> TempDir {
    let tmp = TempDir::new().unwrap();
    insp_in(&tmp).arg("init").assert().success();

    let exports = tmp.path().join("exports");
    write_fixtures(&exports);
    insp_in(&tmp).arg("import").arg(&exports).assert().success();
    tmp
}

pub fn key(batch: &str, segment: Option<&str>, result: &str) -> RecordKey {
    RecordKey::new(batch, segment, result)
}

pub fn count(key: RecordKey, values: &[(&str, u64)]) -> CountRecord {
    CountRecord::new(key, values.iter().copied()).unwrap()
}

pub fn mean(key: RecordKey, values: &[(&str, f64)]) -> MeanRecord {
    MeanRecord::new(key, values.iter().copied()).unwrap()
}

pub fn pass_rate(key: RecordKey, values: &[(&str, f64)]) -> PassRateRecord {
    PassRateRecord::new(key, values.iter().copied()).unwrap()
}

/// Segment totals with only the good population set
pub fn good_segment(batch: &str, segment: &str, good: u64) -> SegmentTotals {
    SegmentTotals {
        inspected: good,
        good,
        ..SegmentTotals::new(batch, Some(segment))
    }
}
