use std::fs;

use vdrt2d::io::{load_cohort, read_table, write_cohort, write_genotypes, write_phenotypes};
use vdrt2d::simulate::{SimulateConfig, simulate_cohort};

#[test]
fn cohort_round_trip_is_lossless() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cohort.csv");

    let cohort = simulate_cohort(&SimulateConfig::new(80, 11)).expect("simulate");
    write_cohort(&cohort, &path).expect("write cohort");
    let loaded = load_cohort(&path).expect("load cohort");

    assert_eq!(loaded.n(), cohort.n());
    assert_eq!(loaded.variant_ids, cohort.variant_ids);
    for (a, b) in cohort.subjects.iter().zip(&loaded.subjects) {
        assert_eq!(a.sample_id, b.sample_id);
        assert_eq!(a.genotypes, b.genotypes);
        assert_eq!(a.age, b.age);
        assert_eq!(a.t2d, b.t2d);
        assert_eq!(a.vit_d_status, b.vit_d_status);
        assert_eq!(a.ancestry, b.ancestry);
        assert_eq!(a.sex, b.sex);
        assert!((a.bmi - b.bmi).abs() < 1e-9);
        assert!((a.vitamin_d - b.vitamin_d).abs() < 1e-9);
        assert!((a.hba1c - b.hba1c).abs() < 1e-9);
    }
}

#[test]
fn missing_input_file_names_the_path() {
    let err = load_cohort(std::path::Path::new("/no/such/cohort.csv"))
        .expect_err("missing file must fail");
    assert!(err.to_string().contains("/no/such/cohort.csv"));
}

#[test]
fn unreadable_input_surfaces_the_io_error() {
    // A directory passes the existence check but cannot be read as a table.
    let dir = tempfile::tempdir().expect("tempdir");
    let err = read_table(dir.path()).expect_err("directory is not a table");
    assert!(err.to_string().contains("io error"));
}

#[test]
fn missing_required_column_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bad.csv");
    fs::write(
        &path,
        "sample_id,rs1,age,bmi,vitamin_d_ng_ml,t2d_status,hba1c_percent\n\
         S_0001,1,50,27.0,22.0,0,5.4\n",
    )
    .expect("write file");
    let err = load_cohort(&path).expect_err("missing vit_d_status column");
    assert!(err.to_string().contains("missing column"));
}

#[test]
fn out_of_range_genotype_is_a_parse_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bad_genotype.csv");
    fs::write(
        &path,
        "sample_id,rs1,age,bmi,vitamin_d_ng_ml,t2d_status,hba1c_percent,vit_d_status,ancestry,sex\n\
         S_0001,3,50,27.0,22.0,0,5.4,Insufficient,African,Male\n",
    )
    .expect("write file");
    let err = load_cohort(&path).expect_err("genotype 3 must be rejected");
    assert!(err.to_string().contains("expected 0/1/2"));
}

#[test]
fn extracts_carry_the_documented_columns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cohort = simulate_cohort(&SimulateConfig::new(40, 5)).expect("simulate");

    let genotypes_path = dir.path().join("genotypes.txt");
    write_genotypes(&cohort, &genotypes_path).expect("write genotypes");
    let genotypes = read_table(&genotypes_path).expect("read genotypes");
    assert_eq!(genotypes.height(), 40);
    assert_eq!(genotypes.width(), 1 + cohort.variant_ids.len());
    assert!(genotypes.column("rs2228570").is_ok());

    let phenotypes_path = dir.path().join("phenotypes.txt");
    write_phenotypes(&cohort, &phenotypes_path).expect("write phenotypes");
    let phenotypes = read_table(&phenotypes_path).expect("read phenotypes");
    assert_eq!(phenotypes.height(), 40);
    assert_eq!(phenotypes.width(), 6);
    assert!(phenotypes.column("vitamin_d_ng_ml").is_ok());
    assert!(phenotypes.column("vit_d_status").is_err());
}
