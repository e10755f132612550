use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Creates `<out_dir>/<name>.log`, creating the directory if needed.
pub fn create_run_log(out_dir: &Path, name: &str) -> Result<(File, PathBuf)> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("create output directory {}", out_dir.display()))?;
    let path = out_dir.join(format!("{name}.log"));
    let file = File::create(&path).with_context(|| format!("create {}", path.display()))?;
    Ok((file, path))
}

pub fn log_line(log: &mut File, message: &str) -> Result<()> {
    info!("{message}");
    writeln!(log, "{message}")?;
    Ok(())
}

pub fn warn_line(log: &mut File, message: &str) -> Result<()> {
    warn!("{message}");
    writeln!(log, "{message}")?;
    Ok(())
}
