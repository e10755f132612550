use crate::error::{Result, VdrT2dError};

/// Serum 25(OH)D cut points in ng/mL.
pub const VITD_DEFICIENT_MAX: f64 = 20.0;
pub const VITD_INSUFFICIENT_MAX: f64 = 30.0;

/// One SNP in the simulated panel: identifier, minor allele frequency,
/// and a log-additive effect multiplier.
#[derive(Debug, Clone)]
pub struct Variant {
    pub id: String,
    pub maf: f64,
    pub effect: f64,
}

impl Variant {
    pub fn new(id: &str, maf: f64, effect: f64) -> Self {
        Self {
            id: id.to_string(),
            maf,
            effect,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VitDStatus {
    Deficient,
    Insufficient,
    Sufficient,
}

impl VitDStatus {
    pub const ALL: [VitDStatus; 3] = [
        VitDStatus::Deficient,
        VitDStatus::Insufficient,
        VitDStatus::Sufficient,
    ];

    pub fn from_level(ng_ml: f64) -> Self {
        if ng_ml <= VITD_DEFICIENT_MAX {
            VitDStatus::Deficient
        } else if ng_ml <= VITD_INSUFFICIENT_MAX {
            VitDStatus::Insufficient
        } else {
            VitDStatus::Sufficient
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VitDStatus::Deficient => "Deficient",
            VitDStatus::Insufficient => "Insufficient",
            VitDStatus::Sufficient => "Sufficient",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "Deficient" => Ok(VitDStatus::Deficient),
            "Insufficient" => Ok(VitDStatus::Insufficient),
            "Sufficient" => Ok(VitDStatus::Sufficient),
            other => Err(VdrT2dError::Parse(format!(
                "unknown vitamin D status {other:?}"
            ))),
        }
    }
}

/// One simulated or loaded individual. Genotypes run parallel to the
/// cohort's variant-id list. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct Subject {
    pub sample_id: String,
    pub genotypes: Vec<u8>,
    pub age: u32,
    pub bmi: f64,
    pub vitamin_d: f64,
    pub t2d: bool,
    pub hba1c: f64,
    pub vit_d_status: VitDStatus,
    pub ancestry: String,
    pub sex: String,
}

/// Ordered collection of subjects plus the variant ids their genotype
/// vectors are indexed by.
#[derive(Debug, Clone)]
pub struct Cohort {
    pub variant_ids: Vec<String>,
    pub subjects: Vec<Subject>,
}

impl Cohort {
    pub fn n(&self) -> usize {
        self.subjects.len()
    }

    pub fn variant_index(&self, variant_id: &str) -> Result<usize> {
        self.variant_ids
            .iter()
            .position(|id| id == variant_id)
            .ok_or_else(|| VdrT2dError::MissingColumn(variant_id.to_string()))
    }

    /// Genotype dose column for one variant, in subject order.
    pub fn genotype_column(&self, variant_id: &str) -> Result<Vec<u8>> {
        let idx = self.variant_index(variant_id)?;
        Ok(self.subjects.iter().map(|s| s.genotypes[idx]).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Significance {
    Strong,
    Moderate,
    Nominal,
    NotSignificant,
}

impl Significance {
    pub fn from_p(p: f64) -> Self {
        if p < 0.001 {
            Significance::Strong
        } else if p < 0.01 {
            Significance::Moderate
        } else if p < 0.05 {
            Significance::Nominal
        } else {
            Significance::NotSignificant
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Significance::Strong => "***",
            Significance::Moderate => "**",
            Significance::Nominal => "*",
            Significance::NotSignificant => "ns",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlleleFrequencyResult {
    pub variant_id: String,
    pub maf: f64,
    /// Frequencies of genotype classes 0, 1, 2; sum to 1.
    pub genotype_freqs: [f64; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HweStatus {
    Pass,
    Fail,
}

impl HweStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HweStatus::Pass => "Pass",
            HweStatus::Fail => "Fail",
        }
    }
}

#[derive(Debug, Clone)]
pub struct HweResult {
    pub variant_id: String,
    pub chi2: f64,
    pub p_value: f64,
    pub status: HweStatus,
}

#[derive(Debug, Clone)]
pub struct AssociationResult {
    pub variant_id: String,
    pub cases_mean: f64,
    pub controls_mean: f64,
    pub odds_ratio: f64,
    pub t_statistic: f64,
    pub p_value: f64,
    pub cohens_d: f64,
    pub significance: Significance,
}

#[derive(Debug, Clone)]
pub struct VitDAssociationResult {
    pub variant_id: String,
    /// Mean vitamin D per genotype class; NaN for an absent class.
    pub genotype_means: [f64; 3],
    pub beta: f64,
    pub r_squared: f64,
    pub f_statistic: f64,
    pub p_value: f64,
    pub significance: Significance,
}

#[derive(Debug, Clone)]
pub struct MediationResult {
    pub variant_id: String,
    pub path_a: f64,
    pub path_b: f64,
    pub path_c: f64,
    pub path_c_prime: f64,
    pub indirect_effect: f64,
    /// indirect / total, as a fraction; 0 when the total effect is 0.
    pub proportion_mediated: f64,
}

#[derive(Debug, Clone)]
pub struct StratifiedResult {
    pub variant_id: String,
    pub stratum: VitDStatus,
    pub n: usize,
    pub n_cases: usize,
    pub cases_mean: f64,
    pub controls_mean: f64,
    pub t_statistic: f64,
    pub p_value: f64,
    pub significance: Significance,
}

#[derive(Debug, Clone)]
pub struct CohortSummary {
    pub total_samples: usize,
    pub t2d_cases: usize,
    pub t2d_controls: usize,
    pub prevalence: f64,
    pub mean_age: f64,
    pub mean_bmi: f64,
    pub mean_vitamin_d: f64,
    pub mean_hba1c: f64,
    pub pct_deficient: f64,
}
