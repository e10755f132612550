use vdrt2d::simulate::{SimulateConfig, cohort_summary, simulate_cohort};
use vdrt2d::types::{Variant, VitDStatus};

#[test]
fn zero_sample_count_fails_fast() {
    let config = SimulateConfig::new(0, 42);
    let err = simulate_cohort(&config).expect_err("zero samples must be rejected");
    assert!(err.to_string().contains("Sample count"));
}

#[test]
fn invalid_variant_spec_fails_fast() {
    let mut config = SimulateConfig::new(100, 42);
    config.variants = vec![Variant::new("rs_bad", 1.4, 1.2)];
    assert!(simulate_cohort(&config).is_err());

    config.variants = vec![Variant::new("rs_bad", 0.3, 0.0)];
    assert!(simulate_cohort(&config).is_err());

    config.variants.clear();
    assert!(simulate_cohort(&config).is_err());
}

#[test]
fn reference_scenario_n1000_seed42() {
    let config = SimulateConfig::new(1000, 42);
    let cohort = simulate_cohort(&config).expect("simulate");
    assert_eq!(cohort.n(), 1000);
    assert_eq!(cohort.variant_ids[0], "rs2228570");
    assert_eq!(cohort.subjects[0].sample_id, "AAM_0000");

    // rs2228570 genotype distribution near the HWE expectation for
    // maf 0.37: {0.3969, 0.4662, 0.1369}, within sampling noise.
    let mut counts = [0usize; 3];
    for subject in &cohort.subjects {
        counts[usize::from(subject.genotypes[0])] += 1;
    }
    let freqs: Vec<f64> = counts.iter().map(|c| *c as f64 / 1000.0).collect();
    assert!((freqs[0] - 0.3969).abs() < 0.05);
    assert!((freqs[1] - 0.4662).abs() < 0.05);
    assert!((freqs[2] - 0.1369).abs() < 0.05);

    let summary = cohort_summary(&cohort);
    assert!(summary.mean_vitamin_d > 15.0 && summary.mean_vitamin_d < 30.0);
    // The uncentered age/BMI/vitamin-D risk terms push realized
    // prevalence well above the 15% logistic anchor.
    assert!(summary.prevalence > 0.20 && summary.prevalence < 0.70);
    assert_eq!(summary.t2d_cases + summary.t2d_controls, 1000);
}

#[test]
fn subject_fields_within_physical_bounds() {
    let cohort = simulate_cohort(&SimulateConfig::new(500, 7)).expect("simulate");
    for subject in &cohort.subjects {
        assert!(subject.vitamin_d >= 5.0 && subject.vitamin_d <= 60.0);
        assert!(subject.age >= 45 && subject.age < 76);
        assert_eq!(subject.vit_d_status, VitDStatus::from_level(subject.vitamin_d));
        assert_eq!(subject.genotypes.len(), cohort.variant_ids.len());
        assert!(subject.genotypes.iter().all(|g| *g <= 2));
    }
}

#[test]
fn hba1c_separates_cases_from_controls() {
    let cohort = simulate_cohort(&SimulateConfig::new(800, 3)).expect("simulate");
    let case_mean: f64 = {
        let vals: Vec<f64> = cohort
            .subjects
            .iter()
            .filter(|s| s.t2d)
            .map(|s| s.hba1c)
            .collect();
        vals.iter().sum::<f64>() / vals.len() as f64
    };
    let control_mean: f64 = {
        let vals: Vec<f64> = cohort
            .subjects
            .iter()
            .filter(|s| !s.t2d)
            .map(|s| s.hba1c)
            .collect();
        vals.iter().sum::<f64>() / vals.len() as f64
    };
    assert!(case_mean > control_mean + 1.0);
}

#[test]
fn fixed_seed_is_deterministic() {
    let a = simulate_cohort(&SimulateConfig::new(200, 99)).expect("simulate");
    let b = simulate_cohort(&SimulateConfig::new(200, 99)).expect("simulate");
    for (sa, sb) in a.subjects.iter().zip(&b.subjects) {
        assert_eq!(sa.genotypes, sb.genotypes);
        assert_eq!(sa.age, sb.age);
        assert_eq!(sa.t2d, sb.t2d);
        assert_eq!(sa.vitamin_d.to_bits(), sb.vitamin_d.to_bits());
    }

    let c = simulate_cohort(&SimulateConfig::new(200, 100)).expect("simulate");
    let identical = a
        .subjects
        .iter()
        .zip(&c.subjects)
        .all(|(sa, sc)| sa.genotypes == sc.genotypes && sa.t2d == sc.t2d);
    assert!(!identical);
}
