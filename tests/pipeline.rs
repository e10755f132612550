use std::fs;
use std::path::Path;

use vdrt2d::io::write_cohort;
use vdrt2d::pipeline::{analyze_command, simulate_command};
use vdrt2d::simulate::{SimulateConfig, simulate_cohort};

#[test]
fn simulate_command_writes_cohort_files_and_log() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out_dir = dir.path().join("simulated");

    let summary =
        simulate_command(&SimulateConfig::new(60, 3), &out_dir).expect("simulate command");
    assert_eq!(summary.total_samples, 60);

    for name in [
        "simulated_clinical_data.csv",
        "genotypes.txt",
        "phenotypes.txt",
        "data_summary.csv",
        "simulate.log",
    ] {
        assert!(out_dir.join(name).is_file(), "missing {name}");
    }
    let log = fs::read_to_string(out_dir.join("simulate.log")).expect("read log");
    assert!(log.contains("Total samples: 60"));
}

#[test]
fn failed_simulate_leaves_no_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out_dir = dir.path().join("simulated");

    simulate_command(&SimulateConfig::new(0, 42), &out_dir).expect_err("zero samples must fail");
    assert!(!out_dir.exists());
}

#[test]
fn analyze_command_writes_result_tables() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = dir.path().join("cohort.csv");
    let out_dir = dir.path().join("results");

    let cohort = simulate_cohort(&SimulateConfig::new(300, 9)).expect("simulate");
    write_cohort(&cohort, &data).expect("write cohort");

    let output = analyze_command(&data, "rs2228570", &out_dir).expect("analyze command");
    assert_eq!(output.snp_t2d.len(), 4);

    for name in [
        "allele_frequencies.csv",
        "hardy_weinberg_test.csv",
        "snp_t2d_association.csv",
        "snp_vitd_association.csv",
        "mediation_analysis.csv",
        "stratified_analysis.csv",
        "analyze.log",
    ] {
        assert!(out_dir.join(name).is_file(), "missing {name}");
    }
}

#[test]
fn failed_analyze_leaves_no_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out_dir = dir.path().join("results");

    analyze_command(Path::new("/no/such/cohort.csv"), "rs2228570", &out_dir)
        .expect_err("missing input must fail");
    assert!(!out_dir.exists());
}

#[test]
fn analyze_logs_a_warning_when_no_stratum_qualifies() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = dir.path().join("cohort.csv");
    let out_dir = dir.path().join("results");

    // 40 subjects: every vitamin D stratum is under the size cutoff.
    let cohort = simulate_cohort(&SimulateConfig::new(40, 13)).expect("simulate");
    write_cohort(&cohort, &data).expect("write cohort");

    let output = analyze_command(&data, "rs2228570", &out_dir).expect("analyze command");
    assert!(output.stratified.is_empty());

    let log = fs::read_to_string(out_dir.join("analyze.log")).expect("read log");
    assert!(log.contains("stratified table is empty"));
}
