use std::path::Path;

use crate::error::{Result, VdrT2dError};

pub fn check_sample_count(n: usize) -> Result<()> {
    if n == 0 {
        return Err(VdrT2dError::InvalidArgument(
            "Sample count must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Checks `value` against `[min, max]`; `exclusive` rejects the endpoints.
pub fn check_range_f64(value: f64, min: f64, max: f64, exclusive: bool, name: &str) -> Result<()> {
    if !value.is_finite() {
        return Err(VdrT2dError::InvalidArgument(format!(
            "Value of {name} should be finite"
        )));
    }
    if exclusive {
        if value <= min {
            return Err(VdrT2dError::InvalidArgument(format!(
                "Value of {name} should be above {min}"
            )));
        }
        if value >= max {
            return Err(VdrT2dError::InvalidArgument(format!(
                "Value of {name} should be below {max}"
            )));
        }
    } else {
        if value < min {
            return Err(VdrT2dError::InvalidArgument(format!(
                "Value of {name} should be at least {min}"
            )));
        }
        if value > max {
            return Err(VdrT2dError::InvalidArgument(format!(
                "Value of {name} should be at most {max}"
            )));
        }
    }
    Ok(())
}

pub fn check_positive(value: f64, name: &str) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(VdrT2dError::InvalidArgument(format!(
            "Value of {name} should be a positive finite number"
        )));
    }
    Ok(())
}

pub fn check_file_exists(path: &Path, name: &str) -> Result<()> {
    if !path.exists() {
        return Err(VdrT2dError::InvalidArgument(format!(
            "File {path:?} passed to {name} does not exist"
        )));
    }
    Ok(())
}
