use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;

use crate::assoc::AnalysisOutput;
use crate::error::VdrT2dError;
use crate::qc::check_file_exists;
use crate::types::{
    AlleleFrequencyResult, AssociationResult, Cohort, CohortSummary, HweResult, MediationResult,
    StratifiedResult, Subject, VitDAssociationResult, VitDStatus,
};

/// Fixed phenotype columns of the cohort table; every other column is a
/// genotype column.
pub const PHENOTYPE_COLUMNS: [&str; 9] = [
    "sample_id",
    "age",
    "bmi",
    "vitamin_d_ng_ml",
    "t2d_status",
    "hba1c_percent",
    "vit_d_status",
    "ancestry",
    "sex",
];

pub fn read_table(path: &Path) -> Result<DataFrame> {
    check_file_exists(path, "read_table")?;
    let delimiter = detect_delimiter(path)?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(delimiter)
                .with_null_values(Some(NullValues::AllColumns(vec![
                    "".into(),
                    "NA".into(),
                    "NaN".into(),
                    ".".into(),
                ])))
                .with_missing_is_null(true),
        )
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .with_context(|| format!("read {}", path.display()))?;
    Ok(df)
}

fn detect_delimiter(path: &Path) -> Result<u8, VdrT2dError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut first = String::new();
    reader.read_line(&mut first)?;
    if first.contains('\t') {
        return Ok(b'\t');
    }
    Ok(b',')
}

pub fn write_dataframe(df: &DataFrame, path: &Path, separator: u8) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut csv = CsvWriter::new(&mut file).with_separator(separator);
    let mut df = df.clone();
    csv.finish(&mut df)?;
    Ok(())
}

fn series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    let column = df
        .column(name)
        .map_err(|_| VdrT2dError::MissingColumn(name.to_string()))?;
    column
        .as_series()
        .with_context(|| format!("column {name} is not a series"))
}

fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let casted = series(df, name)?
        .cast(&DataType::Float64)
        .map_err(|_| VdrT2dError::Parse(format!("column {name} is not numeric")))?;
    casted
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(i, v)| v.ok_or_else(|| anyhow::anyhow!("null value in column {name}, row {i}")))
        .collect()
}

fn i64_column(df: &DataFrame, name: &str) -> Result<Vec<i64>> {
    let casted = series(df, name)?
        .cast(&DataType::Int64)
        .map_err(|_| VdrT2dError::Parse(format!("column {name} is not an integer column")))?;
    casted
        .i64()?
        .into_iter()
        .enumerate()
        .map(|(i, v)| v.ok_or_else(|| anyhow::anyhow!("null value in column {name}, row {i}")))
        .collect()
}

fn str_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let casted = series(df, name)?.cast(&DataType::String)?;
    casted
        .str()?
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("null value in column {name}, row {i}"))
        })
        .collect()
}

/// Loads a cohort table written by `write_cohort` (or any delimited file
/// with the documented columns). Genotype columns are every column
/// outside the fixed phenotype set, in file order; values must be 0/1/2.
pub fn load_cohort(path: &Path) -> Result<Cohort> {
    let df = read_table(path)?;

    for required in PHENOTYPE_COLUMNS {
        if df.column(required).is_err() {
            return Err(VdrT2dError::MissingColumn(required.to_string()).into());
        }
    }
    let variant_ids: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .filter(|name| !PHENOTYPE_COLUMNS.contains(&name.as_str()))
        .collect();

    let mut genotype_columns = Vec::with_capacity(variant_ids.len());
    for id in &variant_ids {
        let raw = i64_column(&df, id)?;
        let mut column = Vec::with_capacity(raw.len());
        for (i, value) in raw.into_iter().enumerate() {
            if !(0..=2).contains(&value) {
                return Err(VdrT2dError::Parse(format!(
                    "genotype column {id}, row {i}: expected 0/1/2, got {value}"
                ))
                .into());
            }
            column.push(value as u8);
        }
        genotype_columns.push(column);
    }

    let sample_ids = str_column(&df, "sample_id")?;
    let ages = i64_column(&df, "age")?;
    let bmis = f64_column(&df, "bmi")?;
    let vitd = f64_column(&df, "vitamin_d_ng_ml")?;
    let t2d = i64_column(&df, "t2d_status")?;
    let hba1c = f64_column(&df, "hba1c_percent")?;
    let vitd_status = str_column(&df, "vit_d_status")?;
    let ancestry = str_column(&df, "ancestry")?;
    let sex = str_column(&df, "sex")?;

    let mut subjects = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let age = u32::try_from(ages[i])
            .map_err(|_| VdrT2dError::Parse(format!("age row {i}: negative value {}", ages[i])))?;
        let t2d = match t2d[i] {
            0 => false,
            1 => true,
            other => {
                return Err(VdrT2dError::Parse(format!(
                    "t2d_status row {i}: expected 0/1, got {other}"
                ))
                .into());
            }
        };
        subjects.push(Subject {
            sample_id: sample_ids[i].clone(),
            genotypes: genotype_columns.iter().map(|col| col[i]).collect(),
            age,
            bmi: bmis[i],
            vitamin_d: vitd[i],
            t2d,
            hba1c: hba1c[i],
            vit_d_status: VitDStatus::parse(&vitd_status[i])?,
            ancestry: ancestry[i].clone(),
            sex: sex[i].clone(),
        });
    }

    Ok(Cohort {
        variant_ids,
        subjects,
    })
}

fn cohort_dataframe(cohort: &Cohort) -> Result<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(cohort.variant_ids.len() + 9);
    columns.push(Column::new(
        "sample_id".into(),
        cohort
            .subjects
            .iter()
            .map(|s| s.sample_id.clone())
            .collect::<Vec<_>>(),
    ));
    for (idx, id) in cohort.variant_ids.iter().enumerate() {
        columns.push(Column::new(
            id.as_str().into(),
            cohort
                .subjects
                .iter()
                .map(|s| i64::from(s.genotypes[idx]))
                .collect::<Vec<_>>(),
        ));
    }
    columns.push(Column::new(
        "age".into(),
        cohort
            .subjects
            .iter()
            .map(|s| i64::from(s.age))
            .collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        "bmi".into(),
        cohort.subjects.iter().map(|s| s.bmi).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        "vitamin_d_ng_ml".into(),
        cohort
            .subjects
            .iter()
            .map(|s| s.vitamin_d)
            .collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        "t2d_status".into(),
        cohort
            .subjects
            .iter()
            .map(|s| i64::from(s.t2d))
            .collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        "hba1c_percent".into(),
        cohort.subjects.iter().map(|s| s.hba1c).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        "vit_d_status".into(),
        cohort
            .subjects
            .iter()
            .map(|s| s.vit_d_status.as_str().to_string())
            .collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        "ancestry".into(),
        cohort
            .subjects
            .iter()
            .map(|s| s.ancestry.clone())
            .collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        "sex".into(),
        cohort
            .subjects
            .iter()
            .map(|s| s.sex.clone())
            .collect::<Vec<_>>(),
    ));
    Ok(DataFrame::new(columns)?)
}

/// Full cohort table, comma-delimited.
pub fn write_cohort(cohort: &Cohort, path: &Path) -> Result<()> {
    write_dataframe(&cohort_dataframe(cohort)?, path, b',')
}

/// Genotype-only extract (sample_id + variant columns), tab-delimited.
pub fn write_genotypes(cohort: &Cohort, path: &Path) -> Result<()> {
    let df = cohort_dataframe(cohort)?;
    let mut keep = vec!["sample_id".to_string()];
    keep.extend(cohort.variant_ids.iter().cloned());
    let subset = df.select(keep.iter().map(|s| s.as_str().into()).collect::<Vec<PlSmallStr>>())?;
    write_dataframe(&subset, path, b'\t')
}

/// Phenotype-only extract, tab-delimited.
pub fn write_phenotypes(cohort: &Cohort, path: &Path) -> Result<()> {
    let df = cohort_dataframe(cohort)?;
    let keep = [
        "sample_id",
        "age",
        "bmi",
        "vitamin_d_ng_ml",
        "t2d_status",
        "hba1c_percent",
    ];
    let subset = df.select(keep.iter().map(|s| (*s).into()).collect::<Vec<PlSmallStr>>())?;
    write_dataframe(&subset, path, b'\t')
}

pub fn summary_dataframe(summary: &CohortSummary) -> Result<DataFrame> {
    let columns = vec![
        Column::new("Total_Samples".into(), [summary.total_samples as i64]),
        Column::new("T2D_Cases".into(), [summary.t2d_cases as i64]),
        Column::new("T2D_Controls".into(), [summary.t2d_controls as i64]),
        Column::new("T2D_Prevalence_pct".into(), [summary.prevalence * 100.0]),
        Column::new("Mean_Age".into(), [summary.mean_age]),
        Column::new("Mean_BMI".into(), [summary.mean_bmi]),
        Column::new("Mean_VitaminD_ng_ml".into(), [summary.mean_vitamin_d]),
        Column::new("VitD_Deficient_pct".into(), [summary.pct_deficient]),
        Column::new("Mean_HbA1c_pct".into(), [summary.mean_hba1c]),
    ];
    Ok(DataFrame::new(columns)?)
}

fn allele_frequency_dataframe(rows: &[AlleleFrequencyResult]) -> Result<DataFrame> {
    let columns = vec![
        Column::new(
            "SNP".into(),
            rows.iter().map(|r| r.variant_id.clone()).collect::<Vec<_>>(),
        ),
        Column::new("MAF".into(), rows.iter().map(|r| r.maf).collect::<Vec<_>>()),
        Column::new(
            "Genotype_0_freq".into(),
            rows.iter().map(|r| r.genotype_freqs[0]).collect::<Vec<_>>(),
        ),
        Column::new(
            "Genotype_1_freq".into(),
            rows.iter().map(|r| r.genotype_freqs[1]).collect::<Vec<_>>(),
        ),
        Column::new(
            "Genotype_2_freq".into(),
            rows.iter().map(|r| r.genotype_freqs[2]).collect::<Vec<_>>(),
        ),
    ];
    Ok(DataFrame::new(columns)?)
}

fn hwe_dataframe(rows: &[HweResult]) -> Result<DataFrame> {
    let columns = vec![
        Column::new(
            "SNP".into(),
            rows.iter().map(|r| r.variant_id.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "Chi2".into(),
            rows.iter().map(|r| r.chi2).collect::<Vec<_>>(),
        ),
        Column::new(
            "P_value".into(),
            rows.iter().map(|r| r.p_value).collect::<Vec<_>>(),
        ),
        Column::new(
            "HWE_status".into(),
            rows.iter()
                .map(|r| r.status.as_str().to_string())
                .collect::<Vec<_>>(),
        ),
    ];
    Ok(DataFrame::new(columns)?)
}

fn association_dataframe(rows: &[AssociationResult]) -> Result<DataFrame> {
    let columns = vec![
        Column::new(
            "SNP".into(),
            rows.iter().map(|r| r.variant_id.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "Cases_mean".into(),
            rows.iter().map(|r| r.cases_mean).collect::<Vec<_>>(),
        ),
        Column::new(
            "Controls_mean".into(),
            rows.iter().map(|r| r.controls_mean).collect::<Vec<_>>(),
        ),
        Column::new(
            "Odds_Ratio".into(),
            rows.iter().map(|r| r.odds_ratio).collect::<Vec<_>>(),
        ),
        Column::new(
            "T_statistic".into(),
            rows.iter().map(|r| r.t_statistic).collect::<Vec<_>>(),
        ),
        Column::new(
            "P_value".into(),
            rows.iter().map(|r| r.p_value).collect::<Vec<_>>(),
        ),
        Column::new(
            "Cohens_d".into(),
            rows.iter().map(|r| r.cohens_d).collect::<Vec<_>>(),
        ),
        Column::new(
            "Significance".into(),
            rows.iter()
                .map(|r| r.significance.as_str().to_string())
                .collect::<Vec<_>>(),
        ),
    ];
    Ok(DataFrame::new(columns)?)
}

fn vitd_association_dataframe(rows: &[VitDAssociationResult]) -> Result<DataFrame> {
    let columns = vec![
        Column::new(
            "SNP".into(),
            rows.iter().map(|r| r.variant_id.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "Genotype_0_mean".into(),
            rows.iter().map(|r| r.genotype_means[0]).collect::<Vec<_>>(),
        ),
        Column::new(
            "Genotype_1_mean".into(),
            rows.iter().map(|r| r.genotype_means[1]).collect::<Vec<_>>(),
        ),
        Column::new(
            "Genotype_2_mean".into(),
            rows.iter().map(|r| r.genotype_means[2]).collect::<Vec<_>>(),
        ),
        Column::new(
            "Beta".into(),
            rows.iter().map(|r| r.beta).collect::<Vec<_>>(),
        ),
        Column::new(
            "R_squared".into(),
            rows.iter().map(|r| r.r_squared).collect::<Vec<_>>(),
        ),
        Column::new(
            "F_statistic".into(),
            rows.iter().map(|r| r.f_statistic).collect::<Vec<_>>(),
        ),
        Column::new(
            "P_value".into(),
            rows.iter().map(|r| r.p_value).collect::<Vec<_>>(),
        ),
        Column::new(
            "Significance".into(),
            rows.iter()
                .map(|r| r.significance.as_str().to_string())
                .collect::<Vec<_>>(),
        ),
    ];
    Ok(DataFrame::new(columns)?)
}

fn mediation_dataframe(result: &MediationResult) -> Result<DataFrame> {
    let columns = vec![
        Column::new("SNP".into(), [result.variant_id.clone()]),
        Column::new("Path_a_SNP_to_VitD".into(), [result.path_a]),
        Column::new("Path_b_VitD_to_T2D".into(), [result.path_b]),
        Column::new("Path_c_Total_effect".into(), [result.path_c]),
        Column::new("Path_c_prime_Direct_effect".into(), [result.path_c_prime]),
        Column::new("Indirect_effect".into(), [result.indirect_effect]),
        Column::new("Proportion_mediated".into(), [result.proportion_mediated]),
    ];
    Ok(DataFrame::new(columns)?)
}

fn stratified_dataframe(rows: &[StratifiedResult]) -> Result<DataFrame> {
    let columns = vec![
        Column::new(
            "SNP".into(),
            rows.iter().map(|r| r.variant_id.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "VitD_Status".into(),
            rows.iter()
                .map(|r| r.stratum.as_str().to_string())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "N".into(),
            rows.iter().map(|r| r.n as i64).collect::<Vec<_>>(),
        ),
        Column::new(
            "N_cases".into(),
            rows.iter().map(|r| r.n_cases as i64).collect::<Vec<_>>(),
        ),
        Column::new(
            "Cases_mean".into(),
            rows.iter().map(|r| r.cases_mean).collect::<Vec<_>>(),
        ),
        Column::new(
            "Controls_mean".into(),
            rows.iter().map(|r| r.controls_mean).collect::<Vec<_>>(),
        ),
        Column::new(
            "T_statistic".into(),
            rows.iter().map(|r| r.t_statistic).collect::<Vec<_>>(),
        ),
        Column::new(
            "P_value".into(),
            rows.iter().map(|r| r.p_value).collect::<Vec<_>>(),
        ),
        Column::new(
            "Significance".into(),
            rows.iter()
                .map(|r| r.significance.as_str().to_string())
                .collect::<Vec<_>>(),
        ),
    ];
    Ok(DataFrame::new(columns)?)
}

/// Writes one comma-delimited result table per analysis into `out_dir`.
pub fn write_analysis_output(output: &AnalysisOutput, out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("create output directory {}", out_dir.display()))?;
    write_dataframe(
        &allele_frequency_dataframe(&output.allele_frequencies)?,
        &out_dir.join("allele_frequencies.csv"),
        b',',
    )?;
    write_dataframe(
        &hwe_dataframe(&output.hardy_weinberg)?,
        &out_dir.join("hardy_weinberg_test.csv"),
        b',',
    )?;
    write_dataframe(
        &association_dataframe(&output.snp_t2d)?,
        &out_dir.join("snp_t2d_association.csv"),
        b',',
    )?;
    write_dataframe(
        &vitd_association_dataframe(&output.snp_vitd)?,
        &out_dir.join("snp_vitd_association.csv"),
        b',',
    )?;
    write_dataframe(
        &mediation_dataframe(&output.mediation)?,
        &out_dir.join("mediation_analysis.csv"),
        b',',
    )?;
    write_dataframe(
        &stratified_dataframe(&output.stratified)?,
        &out_dir.join("stratified_analysis.csv"),
        b',',
    )?;
    Ok(())
}
