use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use vdrt2d::logging::init_tracing;
use vdrt2d::pipeline::{analyze_command, simulate_command};
use vdrt2d::simulate::SimulateConfig;
use vdrt2d::types::Variant;

#[derive(Parser)]
#[command(name = "vdrt2d")]
#[command(about = "VDR variants, vitamin D, and type 2 diabetes analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a simulated clinical cohort.
    Simulate {
        #[arg(long, default_value_t = 1000)]
        n_samples: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 0.15)]
        prevalence: f64,
        /// Panel entries as id:maf:effect; defaults to the four VDR SNPs.
        #[arg(long)]
        variant: Vec<String>,
        #[arg(long, default_value = "data/simulated")]
        out_dir: PathBuf,
    },
    /// Run the association and mediation battery over a cohort table.
    Analyze {
        #[arg(long, required = true)]
        data: PathBuf,
        #[arg(long, default_value = "rs2228570")]
        mediation_variant: String,
        #[arg(long, default_value = "results")]
        out_dir: PathBuf,
    },
}

fn parse_variant(spec: &str) -> Result<Variant> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 3 {
        return Err(anyhow::anyhow!(
            "variant spec {spec:?} should be id:maf:effect"
        ));
    }
    let maf: f64 = parts[1]
        .parse()
        .with_context(|| format!("MAF in variant spec {spec:?}"))?;
    let effect: f64 = parts[2]
        .parse()
        .with_context(|| format!("effect in variant spec {spec:?}"))?;
    Ok(Variant::new(parts[0], maf, effect))
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Simulate {
            n_samples,
            seed,
            prevalence,
            variant,
            out_dir,
        } => {
            let mut config = SimulateConfig::new(n_samples, seed);
            config.base_prevalence = prevalence;
            if !variant.is_empty() {
                config.variants = variant
                    .iter()
                    .map(|s| parse_variant(s))
                    .collect::<Result<Vec<_>>>()?;
            }
            simulate_command(&config, &out_dir)?;
        }
        Command::Analyze {
            data,
            mediation_variant,
            out_dir,
        } => {
            analyze_command(&data, &mediation_variant, &out_dir)?;
        }
    }

    Ok(())
}
