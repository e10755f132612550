use anyhow::Result;
use ndarray::Array1;

use crate::stats::{
    design_with_intercept, drop_constant_columns, logistic_irls, ols, standardize_columns,
};
use crate::types::{Cohort, MediationResult};

/// Indirect effect over total effect; 0 when the total effect is 0.
pub fn proportion_mediated(indirect: f64, total: f64) -> f64 {
    if total == 0.0 { 0.0 } else { indirect / total }
}

/// Decomposes the variant's effect on T2D into a direct path and an
/// indirect path through vitamin D, adjusted for age and BMI.
///
/// Three models: (a) linear regression of vitamin D on the variant gives
/// path a; (b) logistic regression of T2D on {vitamin D, variant} gives
/// path b and the direct effect c'; (c) logistic regression of T2D on
/// the variant alone gives the total effect c. The decomposition
/// c = c' + a*b is only approximate across the mixed linear/logistic
/// links and is reported, not enforced.
pub fn mediation_analysis(cohort: &Cohort, variant_id: &str) -> Result<MediationResult> {
    let doses: Vec<f64> = cohort
        .genotype_column(variant_id)?
        .into_iter()
        .map(f64::from)
        .collect();
    let ages: Vec<f64> = cohort.subjects.iter().map(|s| f64::from(s.age)).collect();
    let bmis: Vec<f64> = cohort.subjects.iter().map(|s| s.bmi).collect();
    let vitd: Vec<f64> = cohort.subjects.iter().map(|s| s.vitamin_d).collect();
    let status = Array1::from_iter(
        cohort
            .subjects
            .iter()
            .map(|s| if s.t2d { 1.0 } else { 0.0 }),
    );

    // Constant covariates would make every model matrix singular.
    let covariates = drop_constant_columns(vec![ages, bmis]);

    // Path a: variant -> vitamin D, unstandardized so the coefficient is
    // in ng/mL per minor-allele copy.
    let mut cols_a = vec![doses.clone()];
    cols_a.extend(covariates.iter().cloned());
    let refs_a: Vec<&[f64]> = cols_a.iter().map(Vec::as_slice).collect();
    let coef_a = ols(
        &design_with_intercept(&refs_a)?,
        &Array1::from_vec(vitd.clone()),
    )?;
    let path_a = coef_a[1];

    // Path b and direct effect c': T2D on {vitamin D, variant, age, bmi}.
    let mut cols_b = vec![vitd, doses.clone()];
    cols_b.extend(covariates.iter().cloned());
    standardize_columns(&mut cols_b);
    let refs_b: Vec<&[f64]> = cols_b.iter().map(Vec::as_slice).collect();
    let coef_b = logistic_irls(&design_with_intercept(&refs_b)?, &status)?;
    let path_b = coef_b[1];
    let path_c_prime = coef_b[2];

    // Total effect c: T2D on the variant without the mediator.
    let mut cols_c = vec![doses];
    cols_c.extend(covariates);
    standardize_columns(&mut cols_c);
    let refs_c: Vec<&[f64]> = cols_c.iter().map(Vec::as_slice).collect();
    let coef_c = logistic_irls(&design_with_intercept(&refs_c)?, &status)?;
    let path_c = coef_c[1];

    let indirect_effect = path_a * path_b;
    Ok(MediationResult {
        variant_id: variant_id.to_string(),
        path_a,
        path_b,
        path_c,
        path_c_prime,
        indirect_effect,
        proportion_mediated: proportion_mediated(indirect_effect, path_c),
    })
}
