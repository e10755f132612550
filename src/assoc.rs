use std::cmp::Ordering;

use anyhow::{Context, Result};
use ndarray::Array1;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing::info;

use crate::error::VdrT2dError;
use crate::mediation::mediation_analysis;
use crate::stats::{
    cohens_d, design_with_intercept, drop_constant_columns, logistic_irls, mean, one_way_anova,
    pooled_t_test, simple_linreg, standardize_columns,
};
use crate::types::{
    AlleleFrequencyResult, AssociationResult, Cohort, HweResult, HweStatus, MediationResult,
    Significance, StratifiedResult, VitDAssociationResult, VitDStatus,
};

/// Strata at or below this size are excluded from stratified output.
pub const MIN_STRATUM_SIZE: usize = 50;

/// Expected genotype counts below this are skipped in the HWE chi-square;
/// such classes necessarily have an observed count of zero as well.
const HWE_EXPECTED_EPS: f64 = 1e-12;

const HWE_PASS_THRESHOLD: f64 = 0.001;

fn genotype_counts(cohort: &Cohort, variant_id: &str) -> Result<[usize; 3], VdrT2dError> {
    let column = cohort.genotype_column(variant_id)?;
    let mut counts = [0usize; 3];
    for g in column {
        counts[usize::from(g)] += 1;
    }
    Ok(counts)
}

/// Minor allele frequency `(n1 + 2*n2) / 2N` plus the three genotype
/// frequencies.
pub fn allele_frequencies(cohort: &Cohort, variant_id: &str) -> Result<AlleleFrequencyResult> {
    let counts = genotype_counts(cohort, variant_id)?;
    let n = cohort.n() as f64;
    let maf = (counts[1] as f64 + 2.0 * counts[2] as f64) / (2.0 * n);
    Ok(AlleleFrequencyResult {
        variant_id: variant_id.to_string(),
        maf,
        genotype_freqs: [
            counts[0] as f64 / n,
            counts[1] as f64 / n,
            counts[2] as f64 / n,
        ],
    })
}

/// Pearson goodness-of-fit of observed genotype counts against the
/// Hardy-Weinberg expectation, one degree of freedom.
pub fn hardy_weinberg(cohort: &Cohort, variant_id: &str) -> Result<HweResult> {
    let counts = genotype_counts(cohort, variant_id)?;
    let n = cohort.n() as f64;
    let p = (2.0 * counts[0] as f64 + counts[1] as f64) / (2.0 * n);
    let q = 1.0 - p;
    let expected = [n * p * p, n * 2.0 * p * q, n * q * q];

    let mut chi2 = 0.0;
    for (obs, exp) in counts.iter().zip(expected) {
        if exp < HWE_EXPECTED_EPS {
            continue;
        }
        chi2 += (*obs as f64 - exp).powi(2) / exp;
    }

    let dist = ChiSquared::new(1.0).context("chi-square")?;
    let p_value = 1.0 - dist.cdf(chi2);
    let status = if p_value > HWE_PASS_THRESHOLD {
        HweStatus::Pass
    } else {
        HweStatus::Fail
    };
    Ok(HweResult {
        variant_id: variant_id.to_string(),
        chi2,
        p_value,
        status,
    })
}

fn split_doses_by_status(doses: &[f64], status: &[bool]) -> (Vec<f64>, Vec<f64>) {
    let mut cases = Vec::new();
    let mut controls = Vec::new();
    for (&d, &s) in doses.iter().zip(status) {
        if s {
            cases.push(d);
        } else {
            controls.push(d);
        }
    }
    (cases, controls)
}

/// SNP vs T2D: case/control genotype means and pooled t-test, odds ratio
/// from a logistic regression of status on standardized
/// {genotype, age, bmi}, and Cohen's d.
pub fn association_test(cohort: &Cohort, variant_id: &str) -> Result<AssociationResult> {
    let doses: Vec<f64> = cohort
        .genotype_column(variant_id)?
        .into_iter()
        .map(f64::from)
        .collect();
    let status: Vec<bool> = cohort.subjects.iter().map(|s| s.t2d).collect();
    let (cases, controls) = split_doses_by_status(&doses, &status);
    if cases.is_empty() || controls.is_empty() {
        return Err(VdrT2dError::InvalidArgument(format!(
            "association test for {variant_id} needs both cases and controls"
        ))
        .into());
    }

    let ttest = pooled_t_test(&cases, &controls)?;
    let d = cohens_d(&cases, &controls);
    let odds_ratio = logistic_odds_ratio(cohort, &doses)?;

    Ok(AssociationResult {
        variant_id: variant_id.to_string(),
        cases_mean: mean(&cases),
        controls_mean: mean(&controls),
        odds_ratio,
        t_statistic: ttest.t,
        p_value: ttest.p_value,
        cohens_d: d,
        significance: Significance::from_p(ttest.p_value),
    })
}

/// Odds ratio per standard deviation of genotype dose, adjusted for age
/// and BMI. A monomorphic variant carries no signal and yields NaN
/// rather than a singular model fit; constant covariates are dropped.
fn logistic_odds_ratio(cohort: &Cohort, doses: &[f64]) -> Result<f64> {
    if crate::stats::sample_variance(doses) == 0.0 {
        return Ok(f64::NAN);
    }
    let covariates = drop_constant_columns(vec![
        cohort.subjects.iter().map(|s| f64::from(s.age)).collect(),
        cohort.subjects.iter().map(|s| s.bmi).collect(),
    ]);
    let mut columns = vec![doses.to_vec()];
    columns.extend(covariates);
    standardize_columns(&mut columns);
    let refs: Vec<&[f64]> = columns.iter().map(Vec::as_slice).collect();
    let design = design_with_intercept(&refs)?;
    let y = Array1::from_iter(
        cohort
            .subjects
            .iter()
            .map(|s| if s.t2d { 1.0 } else { 0.0 }),
    );
    let beta = logistic_irls(&design, &y)?;
    Ok(beta[1].exp())
}

/// SNP vs vitamin D: one-way ANOVA over genotype groups plus a simple
/// dose-response regression.
pub fn vitamin_d_association(cohort: &Cohort, variant_id: &str) -> Result<VitDAssociationResult> {
    let column = cohort.genotype_column(variant_id)?;
    let mut groups: [Vec<f64>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for (g, subject) in column.iter().zip(&cohort.subjects) {
        groups[usize::from(*g)].push(subject.vitamin_d);
    }

    let refs: Vec<&[f64]> = groups.iter().map(Vec::as_slice).collect();
    let anova = one_way_anova(&refs)?;

    let doses: Vec<f64> = column.iter().map(|&g| f64::from(g)).collect();
    let vitd: Vec<f64> = cohort.subjects.iter().map(|s| s.vitamin_d).collect();
    let reg = simple_linreg(&doses, &vitd)?;

    Ok(VitDAssociationResult {
        variant_id: variant_id.to_string(),
        genotype_means: [mean(&groups[0]), mean(&groups[1]), mean(&groups[2])],
        beta: reg.slope,
        r_squared: reg.r_squared,
        f_statistic: anova.f,
        p_value: anova.p_value,
        significance: Significance::from_p(anova.p_value),
    })
}

/// Repeats the case/control t-test within each vitamin D stratum.
/// Strata without more than `MIN_STRATUM_SIZE` subjects, or with an
/// empty case or control side, are excluded from the output entirely.
pub fn stratified_association(cohort: &Cohort, variant_id: &str) -> Result<Vec<StratifiedResult>> {
    let idx = cohort.variant_index(variant_id)?;
    let mut results = Vec::new();
    for stratum in VitDStatus::ALL {
        let subset: Vec<_> = cohort
            .subjects
            .iter()
            .filter(|s| s.vit_d_status == stratum)
            .collect();
        if subset.len() <= MIN_STRATUM_SIZE {
            continue;
        }
        let cases: Vec<f64> = subset
            .iter()
            .filter(|s| s.t2d)
            .map(|s| f64::from(s.genotypes[idx]))
            .collect();
        let controls: Vec<f64> = subset
            .iter()
            .filter(|s| !s.t2d)
            .map(|s| f64::from(s.genotypes[idx]))
            .collect();
        if cases.is_empty() || controls.is_empty() {
            continue;
        }
        let ttest = pooled_t_test(&cases, &controls)?;
        results.push(StratifiedResult {
            variant_id: variant_id.to_string(),
            stratum,
            n: subset.len(),
            n_cases: cases.len(),
            cases_mean: mean(&cases),
            controls_mean: mean(&controls),
            t_statistic: ttest.t,
            p_value: ttest.p_value,
            significance: Significance::from_p(ttest.p_value),
        });
    }
    Ok(results)
}

/// All per-variant tables plus the single-variant mediation record.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub allele_frequencies: Vec<AlleleFrequencyResult>,
    pub hardy_weinberg: Vec<HweResult>,
    pub snp_t2d: Vec<AssociationResult>,
    pub snp_vitd: Vec<VitDAssociationResult>,
    pub mediation: MediationResult,
    pub stratified: Vec<StratifiedResult>,
}

fn by_p_value<T>(p: impl Fn(&T) -> f64) -> impl Fn(&T, &T) -> Ordering {
    move |a, b| p(a).partial_cmp(&p(b)).unwrap_or(Ordering::Equal)
}

/// Runs the full association battery over the cohort's variant panel.
pub fn run_analysis(cohort: &Cohort, mediation_variant: &str) -> Result<AnalysisOutput> {
    if cohort.n() == 0 {
        return Err(VdrT2dError::InvalidArgument("cohort is empty".to_string()).into());
    }
    let variant_ids = cohort.variant_ids.clone();

    let mut allele_freqs = Vec::with_capacity(variant_ids.len());
    let mut hwe = Vec::with_capacity(variant_ids.len());
    let mut snp_t2d = Vec::with_capacity(variant_ids.len());
    let mut snp_vitd = Vec::with_capacity(variant_ids.len());
    let mut stratified = Vec::new();
    for id in &variant_ids {
        allele_freqs.push(allele_frequencies(cohort, id)?);
        hwe.push(hardy_weinberg(cohort, id)?);
        snp_t2d.push(association_test(cohort, id)?);
        snp_vitd.push(vitamin_d_association(cohort, id)?);
        stratified.extend(stratified_association(cohort, id)?);
    }

    snp_t2d.sort_by(by_p_value(|r: &AssociationResult| r.p_value));
    snp_vitd.sort_by(by_p_value(|r: &VitDAssociationResult| r.p_value));

    let mediation = mediation_analysis(cohort, mediation_variant)?;
    info!(
        "Analysis complete: {} variants, {} stratified rows",
        variant_ids.len(),
        stratified.len()
    );

    Ok(AnalysisOutput {
        allele_frequencies: allele_freqs,
        hardy_weinberg: hwe,
        snp_t2d,
        snp_vitd,
        mediation,
        stratified,
    })
}
