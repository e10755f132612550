use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::info;

use crate::qc::{check_positive, check_range_f64, check_sample_count};
use crate::stats::mean;
use crate::types::{Cohort, CohortSummary, Subject, Variant, VitDStatus};

/// Physical bounds for serum 25(OH)D in ng/mL.
const VITD_MIN: f64 = 5.0;
const VITD_MAX: f64 = 60.0;
/// Season / sun-exposure noise on vitamin D.
const SEASONAL_SD: f64 = 3.0;

const AGE_MIN: u32 = 45;
const AGE_MAX_EXCLUSIVE: u32 = 76;
const BMI_MEAN: f64 = 28.0;
const BMI_SD: f64 = 5.0;
const HBA1C_CASE: (f64, f64) = (7.5, 1.2);
const HBA1C_CONTROL: (f64, f64) = (5.4, 0.4);

#[derive(Debug, Clone)]
pub struct SimulateConfig {
    pub n_samples: usize,
    pub variants: Vec<Variant>,
    pub seed: u64,
    pub base_prevalence: f64,
    pub vitd_mean: f64,
    pub vitd_sd: f64,
}

impl SimulateConfig {
    pub fn new(n_samples: usize, seed: u64) -> Self {
        Self {
            n_samples,
            variants: default_panel(),
            seed,
            base_prevalence: 0.15,
            vitd_mean: 20.0,
            vitd_sd: 8.0,
        }
    }
}

/// The four VDR variants of the original study, with minor allele
/// frequencies typical of African-ancestry populations.
pub fn default_panel() -> Vec<Variant> {
    vec![
        Variant::new("rs2228570", 0.37, 1.3),
        Variant::new("rs1544410", 0.28, 1.15),
        Variant::new("rs7975232", 0.35, 1.12),
        Variant::new("rs731236", 0.42, 1.08),
    ]
}

/// Generates a simulated cohort: HWE genotypes per variant, vitamin D as
/// a log-additive genotype effect plus noise, T2D status from a logistic
/// risk model over vitamin D, genotype, age, and BMI.
pub fn simulate_cohort(config: &SimulateConfig) -> Result<Cohort> {
    check_sample_count(config.n_samples)?;
    if config.variants.is_empty() {
        return Err(anyhow::anyhow!("variant panel must not be empty"));
    }
    for variant in &config.variants {
        check_range_f64(variant.maf, 0.0, 1.0, false, &format!("MAF of {}", variant.id))?;
        check_positive(variant.effect, &format!("effect of {}", variant.id))?;
    }
    check_range_f64(config.base_prevalence, 0.0, 1.0, true, "base_prevalence")?;
    check_positive(config.vitd_sd, "vitd_sd")?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let vitd_baseline =
        Normal::new(config.vitd_mean, config.vitd_sd).context("vitamin D distribution")?;
    let seasonal = Normal::new(0.0, SEASONAL_SD).context("seasonal distribution")?;
    let bmi_dist = Normal::new(BMI_MEAN, BMI_SD).context("BMI distribution")?;
    let hba1c_case = Normal::new(HBA1C_CASE.0, HBA1C_CASE.1).context("HbA1c distribution")?;
    let hba1c_control =
        Normal::new(HBA1C_CONTROL.0, HBA1C_CONTROL.1).context("HbA1c distribution")?;

    let base_logit = (config.base_prevalence / (1.0 - config.base_prevalence)).ln();

    let mut subjects = Vec::with_capacity(config.n_samples);
    for i in 0..config.n_samples {
        let genotypes: Vec<u8> = config
            .variants
            .iter()
            .map(|v| draw_genotype(&mut rng, v.maf))
            .collect();

        let mut vitamin_d = vitd_baseline.sample(&mut rng);
        for (variant, &g) in config.variants.iter().zip(&genotypes) {
            vitamin_d += f64::from(g) * variant.effect.ln() * 2.0;
        }
        vitamin_d += seasonal.sample(&mut rng);
        vitamin_d = vitamin_d.clamp(VITD_MIN, VITD_MAX);

        let age = rng.random_range(AGE_MIN..AGE_MAX_EXCLUSIVE);
        let bmi = bmi_dist.sample(&mut rng);

        // Vitamin D is protective with an optimum around 30 ng/mL.
        let mut risk = -0.05 * (vitamin_d - 30.0);
        for (variant, &g) in config.variants.iter().zip(&genotypes) {
            risk += f64::from(g) * variant.effect.ln() * 0.5;
        }
        risk += f64::from(age - AGE_MIN) * 0.03;
        risk += (bmi - 25.0) * 0.15;

        let prob = 1.0 / (1.0 + (-(base_logit + risk)).exp());
        let t2d = rng.random_bool(prob);
        let hba1c = if t2d {
            hba1c_case.sample(&mut rng)
        } else {
            hba1c_control.sample(&mut rng)
        };

        subjects.push(Subject {
            sample_id: format!("AAM_{i:04}"),
            genotypes,
            age,
            bmi,
            vitamin_d,
            t2d,
            hba1c,
            vit_d_status: VitDStatus::from_level(vitamin_d),
            ancestry: "African".to_string(),
            sex: "Male".to_string(),
        });
    }

    info!(
        "Simulated {} subjects across {} variants (seed {})",
        subjects.len(),
        config.variants.len(),
        config.seed
    );
    Ok(Cohort {
        variant_ids: config.variants.iter().map(|v| v.id.clone()).collect(),
        subjects,
    })
}

/// Hardy-Weinberg categorical draw over {0, 1, 2} minor-allele copies.
fn draw_genotype<R: Rng + ?Sized>(rng: &mut R, maf: f64) -> u8 {
    let p_aa = (1.0 - maf) * (1.0 - maf);
    let p_ab = 2.0 * maf * (1.0 - maf);
    let u = rng.random::<f64>();
    if u < p_aa {
        0
    } else if u < p_aa + p_ab {
        1
    } else {
        2
    }
}

pub fn cohort_summary(cohort: &Cohort) -> CohortSummary {
    let n = cohort.n();
    let cases = cohort.subjects.iter().filter(|s| s.t2d).count();
    let deficient = cohort
        .subjects
        .iter()
        .filter(|s| s.vit_d_status == VitDStatus::Deficient)
        .count();
    let ages: Vec<f64> = cohort.subjects.iter().map(|s| f64::from(s.age)).collect();
    let bmis: Vec<f64> = cohort.subjects.iter().map(|s| s.bmi).collect();
    let vitd: Vec<f64> = cohort.subjects.iter().map(|s| s.vitamin_d).collect();
    let hba1c: Vec<f64> = cohort.subjects.iter().map(|s| s.hba1c).collect();

    CohortSummary {
        total_samples: n,
        t2d_cases: cases,
        t2d_controls: n - cases,
        prevalence: if n > 0 { cases as f64 / n as f64 } else { 0.0 },
        mean_age: mean(&ages),
        mean_bmi: mean(&bmis),
        mean_vitamin_d: mean(&vitd),
        mean_hba1c: mean(&hba1c),
        pct_deficient: if n > 0 {
            100.0 * deficient as f64 / n as f64
        } else {
            0.0
        },
    }
}
