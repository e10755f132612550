use vdrt2d::assoc::{
    allele_frequencies, association_test, hardy_weinberg, run_analysis, stratified_association,
    vitamin_d_association,
};
use vdrt2d::mediation::{mediation_analysis, proportion_mediated};
use vdrt2d::simulate::{SimulateConfig, simulate_cohort};
use vdrt2d::types::{Cohort, HweStatus, Significance, Subject, VitDStatus};

fn subject(i: usize, genotype: u8, vitamin_d: f64, t2d: bool) -> Subject {
    Subject {
        sample_id: format!("S_{i:04}"),
        genotypes: vec![genotype],
        age: 50 + (i % 20) as u32,
        bmi: 26.0 + (i % 7) as f64,
        vitamin_d,
        t2d,
        hba1c: if t2d { 7.6 } else { 5.3 },
        vit_d_status: VitDStatus::from_level(vitamin_d),
        ancestry: "African".to_string(),
        sex: "Male".to_string(),
    }
}

fn single_variant_cohort(variant: &str, subjects: Vec<Subject>) -> Cohort {
    Cohort {
        variant_ids: vec![variant.to_string()],
        subjects,
    }
}

#[test]
fn allele_frequencies_exact_counts() {
    let subjects = vec![
        subject(0, 0, 25.0, false),
        subject(1, 1, 25.0, false),
        subject(2, 1, 25.0, true),
        subject(3, 2, 25.0, true),
    ];
    let cohort = single_variant_cohort("rs1", subjects);
    let freq = allele_frequencies(&cohort, "rs1").expect("allele frequencies");
    assert!((freq.maf - 0.5).abs() < 1e-12);
    assert!((freq.genotype_freqs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    assert!((freq.genotype_freqs[0] - 0.25).abs() < 1e-12);
    assert!((freq.genotype_freqs[1] - 0.5).abs() < 1e-12);
    assert!(freq.maf >= 0.0 && freq.maf <= 1.0);
}

#[test]
fn missing_variant_column_is_an_error() {
    let cohort = single_variant_cohort("rs1", vec![subject(0, 0, 25.0, false)]);
    let err = allele_frequencies(&cohort, "rs_absent").expect_err("missing column");
    assert!(err.to_string().contains("missing column"));
    assert!(hardy_weinberg(&cohort, "rs_absent").is_err());
    assert!(vitamin_d_association(&cohort, "rs_absent").is_err());
    assert!(stratified_association(&cohort, "rs_absent").is_err());
}

#[test]
fn monomorphic_variant_does_not_divide_by_zero() {
    let subjects: Vec<Subject> = (0..10)
        .map(|i| subject(i, 0, 25.0, i % 2 == 0))
        .collect();
    let cohort = single_variant_cohort("rs_mono", subjects);

    let hwe = hardy_weinberg(&cohort, "rs_mono").expect("hwe");
    assert_eq!(hwe.chi2, 0.0);
    assert!((hwe.p_value - 1.0).abs() < 1e-12);
    assert_eq!(hwe.status, HweStatus::Pass);

    let assoc = association_test(&cohort, "rs_mono").expect("association");
    assert_eq!(assoc.t_statistic, 0.0);
    assert_eq!(assoc.p_value, 1.0);
    assert_eq!(assoc.cohens_d, 0.0);
    assert!(assoc.odds_ratio.is_nan());
    assert_eq!(assoc.significance, Significance::NotSignificant);

    let vitd = vitamin_d_association(&cohort, "rs_mono").expect("vitd association");
    assert_eq!(vitd.f_statistic, 0.0);
    assert_eq!(vitd.p_value, 1.0);
    assert!(vitd.genotype_means[1].is_nan());
    assert!(vitd.genotype_means[2].is_nan());
}

#[test]
fn hwe_holds_on_balanced_counts() {
    // 250/500/250 is exactly the HWE expectation for maf 0.5.
    let mut subjects = Vec::new();
    let mut i = 0;
    for (genotype, count) in [(0u8, 250), (1, 500), (2, 250)] {
        for _ in 0..count {
            subjects.push(subject(i, genotype, 25.0, i % 3 == 0));
            i += 1;
        }
    }
    let cohort = single_variant_cohort("rs_hwe", subjects);
    let hwe = hardy_weinberg(&cohort, "rs_hwe").expect("hwe");
    assert!(hwe.chi2.abs() < 1e-9);
    assert_eq!(hwe.status, HweStatus::Pass);
}

#[test]
fn association_requires_both_outcome_groups() {
    let subjects: Vec<Subject> = (0..10).map(|i| subject(i, (i % 3) as u8, 25.0, false)).collect();
    let cohort = single_variant_cohort("rs1", subjects);
    assert!(association_test(&cohort, "rs1").is_err());
}

#[test]
fn small_or_one_sided_strata_are_excluded() {
    let mut subjects = Vec::new();
    let mut i = 0;
    // Deficient stratum: 60 subjects, both outcome groups present.
    for _ in 0..60 {
        subjects.push(subject(i, (i % 3) as u8, 12.0, i % 4 == 0));
        i += 1;
    }
    // Insufficient stratum: 55 subjects but controls only.
    for _ in 0..55 {
        subjects.push(subject(i, (i % 3) as u8, 25.0, false));
        i += 1;
    }
    // Sufficient stratum: only 40 subjects.
    for _ in 0..40 {
        subjects.push(subject(i, (i % 3) as u8, 40.0, i % 4 == 0));
        i += 1;
    }
    let cohort = single_variant_cohort("rs1", subjects);
    let rows = stratified_association(&cohort, "rs1").expect("stratified");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].stratum, VitDStatus::Deficient);
    assert_eq!(rows[0].n, 60);
    assert_eq!(rows[0].n_cases, 15);
    assert!(rows[0].p_value >= 0.0 && rows[0].p_value <= 1.0);
}

#[test]
fn constant_covariates_are_tolerated() {
    // Every subject shares one age and BMI, so those columns carry no
    // information and must be dropped rather than made singular.
    let subjects: Vec<Subject> = (0..40)
        .map(|i| {
            let mut s = subject(i, (i % 3) as u8, 15.0 + (i % 10) as f64, i % 2 == 0);
            s.age = 55;
            s.bmi = 27.0;
            s
        })
        .collect();
    let cohort = single_variant_cohort("rs1", subjects);

    let assoc = association_test(&cohort, "rs1").expect("association");
    assert!(assoc.odds_ratio.is_finite() && assoc.odds_ratio > 0.0);

    let mediation = mediation_analysis(&cohort, "rs1").expect("mediation");
    assert!(mediation.path_a.is_finite());
    assert!(mediation.path_b.is_finite());
    assert!(mediation.path_c.is_finite());
    assert!(mediation.path_c_prime.is_finite());
}

#[test]
fn significance_tiers() {
    assert_eq!(Significance::from_p(0.0005), Significance::Strong);
    assert_eq!(Significance::from_p(0.005), Significance::Moderate);
    assert_eq!(Significance::from_p(0.03), Significance::Nominal);
    assert_eq!(Significance::from_p(0.2), Significance::NotSignificant);
    assert_eq!(Significance::Strong.as_str(), "***");
    assert_eq!(Significance::NotSignificant.as_str(), "ns");
}

#[test]
fn zero_total_effect_yields_zero_proportion() {
    assert_eq!(proportion_mediated(0.5, 0.0), 0.0);
    assert!((proportion_mediated(0.25, 0.5) - 0.5).abs() < 1e-12);
}

#[test]
fn full_battery_over_simulated_cohort() {
    let cohort = simulate_cohort(&SimulateConfig::new(600, 7)).expect("simulate");
    let output = run_analysis(&cohort, "rs2228570").expect("analysis");

    assert_eq!(output.allele_frequencies.len(), 4);
    assert_eq!(output.hardy_weinberg.len(), 4);
    assert_eq!(output.snp_t2d.len(), 4);
    assert_eq!(output.snp_vitd.len(), 4);

    for freq in &output.allele_frequencies {
        assert!(freq.maf >= 0.0 && freq.maf <= 1.0);
        assert!((freq.genotype_freqs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
    for hwe in &output.hardy_weinberg {
        assert!(hwe.p_value >= 0.0 && hwe.p_value <= 1.0);
    }
    for assoc in &output.snp_t2d {
        assert!(assoc.odds_ratio.is_finite() && assoc.odds_ratio > 0.0);
        assert!(assoc.p_value >= 0.0 && assoc.p_value <= 1.0);
    }
    // Sorted ascending by p-value.
    for pair in output.snp_t2d.windows(2) {
        assert!(pair[0].p_value <= pair[1].p_value);
    }

    assert_eq!(output.mediation.variant_id, "rs2228570");
    assert!(output.mediation.path_a.is_finite());
    assert!(output.mediation.path_b.is_finite());
    assert!(output.mediation.path_c.is_finite());
    assert!(output.mediation.proportion_mediated.is_finite());
    assert!(
        (output.mediation.indirect_effect
            - output.mediation.path_a * output.mediation.path_b)
            .abs()
            < 1e-12
    );
}

#[test]
fn mediation_on_missing_variant_is_an_error() {
    let cohort = simulate_cohort(&SimulateConfig::new(100, 7)).expect("simulate");
    assert!(run_analysis(&cohort, "rs_absent").is_err());
}
