//! Command pipelines behind the `vdrt2d` binary: simulate a cohort or
//! analyze one, then write the result tables and a run log.
//!
//! Generation and analysis run before any output directory is created,
//! so a failing run leaves no partial output behind.

use std::path::Path;

use anyhow::Result;

use crate::assoc::{AnalysisOutput, run_analysis};
use crate::io::{
    load_cohort, summary_dataframe, write_analysis_output, write_cohort, write_dataframe,
    write_genotypes, write_phenotypes,
};
use crate::logging::{create_run_log, log_line, warn_line};
use crate::simulate::{SimulateConfig, cohort_summary, simulate_cohort};
use crate::types::CohortSummary;

/// Generates a cohort and writes the clinical table, genotype and
/// phenotype files, and a summary under `out_dir`.
pub fn simulate_command(config: &SimulateConfig, out_dir: &Path) -> Result<CohortSummary> {
    let cohort = simulate_cohort(config)?;
    let summary = cohort_summary(&cohort);

    let (mut log, _) = create_run_log(out_dir, "simulate")?;
    write_cohort(&cohort, &out_dir.join("simulated_clinical_data.csv"))?;
    write_genotypes(&cohort, &out_dir.join("genotypes.txt"))?;
    write_phenotypes(&cohort, &out_dir.join("phenotypes.txt"))?;
    write_dataframe(
        &summary_dataframe(&summary)?,
        &out_dir.join("data_summary.csv"),
        b',',
    )?;

    log_line(&mut log, &format!("Total samples: {}", summary.total_samples))?;
    log_line(
        &mut log,
        &format!(
            "T2D cases/controls: {}/{} (prevalence {:.1}%)",
            summary.t2d_cases,
            summary.t2d_controls,
            summary.prevalence * 100.0
        ),
    )?;
    log_line(
        &mut log,
        &format!(
            "Mean vitamin D: {:.1} ng/mL ({:.1}% deficient)",
            summary.mean_vitamin_d, summary.pct_deficient
        ),
    )?;
    log_line(
        &mut log,
        &format!(
            "Mean age: {:.1}, mean BMI: {:.1}, mean HbA1c: {:.2}",
            summary.mean_age, summary.mean_bmi, summary.mean_hba1c
        ),
    )?;
    log_line(
        &mut log,
        &format!("Files written to {}", out_dir.display()),
    )?;

    Ok(summary)
}

/// Loads a cohort table, runs the association and mediation battery,
/// and writes the result tables under `out_dir`.
pub fn analyze_command(
    data: &Path,
    mediation_variant: &str,
    out_dir: &Path,
) -> Result<AnalysisOutput> {
    let cohort = load_cohort(data)?;
    let output = run_analysis(&cohort, mediation_variant)?;

    let (mut log, _) = create_run_log(out_dir, "analyze")?;
    write_analysis_output(&output, out_dir)?;

    log_line(
        &mut log,
        &format!(
            "Loaded {} subjects, {} variants from {}",
            cohort.n(),
            cohort.variant_ids.len(),
            data.display()
        ),
    )?;
    for result in &output.snp_t2d {
        log_line(
            &mut log,
            &format!(
                "{}: OR={:.3}, p={:.4} {}",
                result.variant_id,
                result.odds_ratio,
                result.p_value,
                result.significance.as_str()
            ),
        )?;
    }
    if output.stratified.is_empty() {
        warn_line(
            &mut log,
            "No vitamin D stratum had more than 50 subjects with both outcomes; stratified table is empty",
        )?;
    }
    log_line(
        &mut log,
        &format!(
            "Mediation ({}): proportion mediated {:.1}%",
            output.mediation.variant_id,
            output.mediation.proportion_mediated * 100.0
        ),
    )?;
    log_line(
        &mut log,
        &format!("Results written to {}", out_dir.display()),
    )?;

    Ok(output)
}
