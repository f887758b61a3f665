//! CLI integration tests

mod common;

use common::{db_path, insp, insp_in, setup_loaded_store, write_fixtures};
use predicates::prelude::*;
use tempfile::TempDir;

// ============================================================================
// Basic CLI
// ============================================================================

#[test]
fn test_help_displays() {
    insp()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("stats"))
        .stdout(predicate::str::contains("import"));
}

#[test]
fn test_version_displays() {
    insp()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("insp"));
}

#[test]
fn test_completions_bash() {
    insp()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("insp"));
}

// ============================================================================
// Init and import
// ============================================================================

#[test]
fn test_init_creates_store_and_config() {
    let tmp = TempDir::new().unwrap();
    insp_in(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created record store"));

    assert!(db_path(&tmp).exists());
    assert!(tmp.path().join(".insp/config.yaml").exists());

    insp_in(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_commands_require_init() {
    let tmp = TempDir::new().unwrap();
    insp_in(&tmp)
        .args(["summary", "B1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("init"));
}

#[test]
fn test_import_reports_counts() {
    let tmp = TempDir::new().unwrap();
    insp_in(&tmp).arg("init").assert().success();
    let exports = tmp.path().join("exports");
    write_fixtures(&exports);

    insp_in(&tmp)
        .args(["--output", "json", "import"])
        .arg(&exports)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"segments\": 3"))
        .stdout(predicate::str::contains("\"counts\": 3"))
        .stdout(predicate::str::contains("\"pass_rates\": 1"));
}

#[test]
fn test_import_rejects_unknown_column() {
    let tmp = TempDir::new().unwrap();
    insp_in(&tmp).arg("init").assert().success();
    let exports = tmp.path().join("exports");
    std::fs::create_dir_all(&exports).unwrap();
    std::fs::write(
        exports.join("counts.csv"),
        "batch,segment,overall_result,paint_gloss\nB1,1,Good,3\n",
    )
    .unwrap();

    insp_in(&tmp)
        .arg("import")
        .arg(&exports)
        .assert()
        .failure()
        .stderr(predicate::str::contains("paint_gloss"));
}

// ============================================================================
// Stats
// ============================================================================

#[test]
fn test_stats_good_job_total() {
    let tmp = setup_loaded_store();
    insp_in(&tmp)
        .args(["stats", "good", "B1", "--domain", "flat"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Job Total"))
        .stdout(predicate::str::contains("Chip Area"))
        .stdout(predicate::str::contains("7.00"))
        .stdout(predicate::str::contains("30"));
}

#[test]
fn test_stats_json_pass_rate() {
    let tmp = setup_loaded_store();
    insp_in(&tmp)
        .args(["--output", "json", "stats", "good", "B1", "--domain", "round"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_weight\": 50"))
        .stdout(predicate::str::contains("\"field\": \"round_valid\""))
        .stdout(predicate::str::contains("95.0"));
}

#[test]
fn test_stats_segment_csv() {
    let tmp = setup_loaded_store();
    insp_in(&tmp)
        .args(["-o", "csv", "stats", "good", "B1", "--segment", "2", "--domain", "flat"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "domain,kind,field,label,value,count,within_limits",
        ))
        .stdout(predicate::str::contains("flat,mean,flat_chip_area,Chip Area,8.0,20,"));
}

#[test]
fn test_stats_segment_shows_inspection_date() {
    let tmp = setup_loaded_store();
    insp_in(&tmp)
        .args(["stats", "good", "B1", "--segment", "2", "--domain", "flat"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-03-04 14:00"));

    insp_in(&tmp)
        .args(["--output", "json", "stats", "good", "B1", "--segment", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"date\": \"2024-03-04\""));
}

#[test]
fn test_stats_fail_na_is_all_zero() {
    let tmp = setup_loaded_store();
    insp_in(&tmp)
        .args(["--output", "json", "stats", "fail-na", "B1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_weight\": 0"))
        .stdout(predicate::str::contains("Sensors Not Found/Not Valid"));
}

#[test]
fn test_stats_unknown_category_fails() {
    let tmp = setup_loaded_store();
    insp_in(&tmp)
        .args(["stats", "scrap", "B1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("scrap"));
}

#[test]
fn test_stats_unknown_domain_fails() {
    let tmp = setup_loaded_store();
    insp_in(&tmp)
        .args(["stats", "good", "B1", "--domain", "paint"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("paint"));
}

#[test]
fn test_stats_standards_from_config() {
    let tmp = setup_loaded_store();
    std::fs::write(
        tmp.path().join(".insp/config.yaml"),
        "standards:\n  flat_chip_area:\n    max: 6.0\n",
    )
    .unwrap();

    insp_in(&tmp)
        .args(["--output", "json", "stats", "good", "B1", "--domain", "flat"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"within_limits\": false"));
}

// ============================================================================
// Summary and listings
// ============================================================================

#[test]
fn test_summary_totals() {
    let tmp = setup_loaded_store();
    insp_in(&tmp)
        .args(["summary", "B1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Job Total"))
        .stdout(predicate::str::contains("85"))
        .stdout(predicate::str::contains("Lost homing 2"));
}

#[test]
fn test_summary_yaml() {
    let tmp = setup_loaded_store();
    insp_in(&tmp)
        .args(["--output", "yaml", "summary", "B2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("batch: B2"))
        .stdout(predicate::str::contains("good: 100.0"));
}

#[test]
fn test_batches_by_year() {
    let tmp = setup_loaded_store();
    insp_in(&tmp)
        .args(["batches", "--year", "2024"])
        .assert()
        .success()
        .stdout(predicate::str::contains("B1"))
        .stdout(predicate::str::contains("B2").not());
}

#[test]
fn test_batches_month_requires_year() {
    let tmp = setup_loaded_store();
    insp_in(&tmp)
        .args(["batches", "--month", "3"])
        .assert()
        .failure();
}

#[test]
fn test_years() {
    let tmp = setup_loaded_store();
    insp_in(&tmp)
        .arg("years")
        .assert()
        .success()
        .stdout("2023\n2024\n");
}

#[test]
fn test_catalog_domain() {
    insp()
        .args(["catalog", "flat"])
        .assert()
        .success()
        .stdout(predicate::str::contains("flat_chip_area"))
        .stdout(predicate::str::contains("round_valid").not());
}

#[test]
fn test_catalog_unknown_domain() {
    insp()
        .args(["catalog", "paint"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("paint"));
}
