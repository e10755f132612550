use anyhow::{Context, Result};
use ndarray::{Array1, Array2};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

#[derive(Debug, Clone, Copy)]
pub struct TwoSampleTTest {
    pub t: f64,
    pub df: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct OneWayAnova {
    pub f: f64,
    pub df_between: f64,
    pub df_within: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct SimpleRegression {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n-1 denominator); 0 for fewer than two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64
}

/// Pooled-variance two-sample t-test (equal-variance Student's t,
/// df = n1 + n2 - 2), two-sided p-value. A zero standard error yields
/// the t=0, p=1 sentinel instead of dividing by zero.
pub fn pooled_t_test(a: &[f64], b: &[f64]) -> Result<TwoSampleTTest> {
    let (n1, n2) = (a.len(), b.len());
    if n1 == 0 || n2 == 0 || n1 + n2 < 3 {
        return Err(anyhow::anyhow!(
            "t-test requires non-empty groups with at least one residual degree of freedom (got {n1} and {n2})"
        ));
    }
    let df = (n1 + n2 - 2) as f64;
    let pooled_var = ((n1 - 1) as f64 * sample_variance(a) + (n2 - 1) as f64 * sample_variance(b))
        / df;
    let se = (pooled_var * (1.0 / n1 as f64 + 1.0 / n2 as f64)).sqrt();
    if se == 0.0 {
        return Ok(TwoSampleTTest {
            t: 0.0,
            df,
            p_value: 1.0,
        });
    }
    let t = (mean(a) - mean(b)) / se;
    let dist = StudentsT::new(0.0, 1.0, df).context("t distribution")?;
    let p_value = 2.0 * (1.0 - dist.cdf(t.abs()));
    Ok(TwoSampleTTest { t, df, p_value })
}

/// Cohen's d with pooled standard deviation; 0 when the pooled SD is 0.
pub fn cohens_d(a: &[f64], b: &[f64]) -> f64 {
    let (n1, n2) = (a.len(), b.len());
    if n1 < 2 || n2 < 2 {
        return 0.0;
    }
    let pooled_var = ((n1 - 1) as f64 * sample_variance(a) + (n2 - 1) as f64 * sample_variance(b))
        / (n1 + n2 - 2) as f64;
    let pooled_sd = pooled_var.sqrt();
    if pooled_sd > 0.0 {
        (mean(a) - mean(b)) / pooled_sd
    } else {
        0.0
    }
}

/// One-way ANOVA over the non-empty groups. Degenerate inputs (fewer
/// than two non-empty groups, no residual degrees of freedom, or zero
/// within-group variance) yield the F=0, p=1 sentinel.
pub fn one_way_anova(groups: &[&[f64]]) -> Result<OneWayAnova> {
    let groups: Vec<&[f64]> = groups.iter().copied().filter(|g| !g.is_empty()).collect();
    let k = groups.len();
    let n_total: usize = groups.iter().map(|g| g.len()).sum();
    if k < 2 || n_total <= k {
        return Ok(OneWayAnova {
            f: 0.0,
            df_between: 0.0,
            df_within: 0.0,
            p_value: 1.0,
        });
    }

    let all: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let grand_mean = mean(&all);
    let ss_between: f64 = groups
        .iter()
        .map(|g| g.len() as f64 * (mean(g) - grand_mean).powi(2))
        .sum();
    let ss_within: f64 = groups
        .iter()
        .map(|g| {
            let m = mean(g);
            g.iter().map(|v| (v - m).powi(2)).sum::<f64>()
        })
        .sum();

    let df_between = (k - 1) as f64;
    let df_within = (n_total - k) as f64;
    if ss_within == 0.0 {
        return Ok(OneWayAnova {
            f: 0.0,
            df_between,
            df_within,
            p_value: 1.0,
        });
    }

    let f = (ss_between / df_between) / (ss_within / df_within);
    let dist = FisherSnedecor::new(df_between, df_within).context("F distribution")?;
    let p_value = 1.0 - dist.cdf(f);
    Ok(OneWayAnova {
        f,
        df_between,
        df_within,
        p_value,
    })
}

/// Simple linear regression of y on x. Zero variance in x yields a
/// zero slope and R².
pub fn simple_linreg(x: &[f64], y: &[f64]) -> Result<SimpleRegression> {
    if x.len() != y.len() || x.len() < 2 {
        return Err(anyhow::anyhow!(
            "regression requires matching x/y of length >= 2 (got {} and {})",
            x.len(),
            y.len()
        ));
    }
    let mx = mean(x);
    let my = mean(y);
    let sxx: f64 = x.iter().map(|v| (v - mx).powi(2)).sum();
    let syy: f64 = y.iter().map(|v| (v - my).powi(2)).sum();
    let sxy: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    if sxx == 0.0 {
        return Ok(SimpleRegression {
            slope: 0.0,
            intercept: my,
            r_squared: 0.0,
        });
    }
    let slope = sxy / sxx;
    let intercept = my - slope * mx;
    let r_squared = if syy > 0.0 { sxy * sxy / (sxx * syy) } else { 0.0 };
    Ok(SimpleRegression {
        slope,
        intercept,
        r_squared,
    })
}

/// Builds an n x (k+1) design matrix: a leading intercept column of
/// ones followed by the predictor columns.
pub fn design_with_intercept(columns: &[&[f64]]) -> Result<Array2<f64>> {
    let n = columns
        .first()
        .map(|c| c.len())
        .ok_or_else(|| anyhow::anyhow!("design matrix needs at least one predictor"))?;
    for col in columns {
        if col.len() != n {
            return Err(anyhow::anyhow!("predictor columns have unequal lengths"));
        }
    }
    let mut design = Array2::ones((n, columns.len() + 1));
    for (j, col) in columns.iter().enumerate() {
        for (i, v) in col.iter().enumerate() {
            design[[i, j + 1]] = *v;
        }
    }
    Ok(design)
}

/// Drops columns with zero sample variance; constant covariates carry no
/// information and would make a model matrix singular.
pub fn drop_constant_columns(columns: Vec<Vec<f64>>) -> Vec<Vec<f64>> {
    columns
        .into_iter()
        .filter(|col| sample_variance(col) > 0.0)
        .collect()
}

/// Z-standardizes each column in place; a zero-SD column is centered only.
pub fn standardize_columns(columns: &mut [Vec<f64>]) {
    for col in columns {
        let m = mean(col);
        let sd = sample_variance(col).sqrt();
        let scale = if sd > 0.0 { sd } else { 1.0 };
        for v in col.iter_mut() {
            *v = (*v - m) / scale;
        }
    }
}

/// Ordinary least squares: coefficients (intercept first when the design
/// carries an intercept column) via the normal equations.
pub fn ols(design: &Array2<f64>, y: &Array1<f64>) -> Result<Array1<f64>> {
    if design.nrows() != y.len() {
        return Err(anyhow::anyhow!(
            "design has {} rows but y has {} values",
            design.nrows(),
            y.len()
        ));
    }
    let xtx = design.t().dot(design);
    let xty = design.t().dot(y);
    solve(&xtx, &xty).context("normal equations are singular")
}

/// Unpenalized logistic regression fit by iteratively reweighted least
/// squares (Newton-Raphson). `y` holds 0/1 outcomes; the design must
/// already carry its intercept column.
pub fn logistic_irls(design: &Array2<f64>, y: &Array1<f64>) -> Result<Array1<f64>> {
    const MAX_ITER: usize = 25;
    const TOL: f64 = 1e-8;
    const P_CLAMP: f64 = 1e-10;

    let (n, k) = (design.nrows(), design.ncols());
    if n != y.len() {
        return Err(anyhow::anyhow!(
            "design has {n} rows but y has {} values",
            y.len()
        ));
    }
    let mut beta = Array1::zeros(k);
    for _ in 0..MAX_ITER {
        let eta = design.dot(&beta);
        let p = eta.mapv(|e| (1.0 / (1.0 + (-e).exp())).clamp(P_CLAMP, 1.0 - P_CLAMP));
        let w = p.mapv(|pi| pi * (1.0 - pi));

        // X^T W X and X^T (y - p)
        let mut xtwx = Array2::zeros((k, k));
        let mut grad = Array1::zeros(k);
        for i in 0..n {
            let wi = w[i];
            let ri = y[i] - p[i];
            for a in 0..k {
                grad[a] += design[[i, a]] * ri;
                for b in 0..k {
                    xtwx[[a, b]] += design[[i, a]] * wi * design[[i, b]];
                }
            }
        }

        let step = solve(&xtwx, &grad).context("logistic information matrix is singular")?;
        beta = &beta + &step;
        if !beta.iter().all(|v| v.is_finite()) {
            return Err(anyhow::anyhow!("logistic regression diverged"));
        }
        if step.iter().map(|v| v.abs()).fold(0.0, f64::max) < TOL {
            break;
        }
    }
    Ok(beta)
}

/// Solves a small dense symmetric system by Gaussian elimination with
/// partial pivoting.
pub fn solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    if a.ncols() != n || b.len() != n {
        return Err(anyhow::anyhow!("solve requires a square system"));
    }
    let mut m = a.clone();
    let mut rhs = b.clone();
    for col in 0..n {
        let mut pivot = col;
        for row in (col + 1)..n {
            if m[[row, col]].abs() > m[[pivot, col]].abs() {
                pivot = row;
            }
        }
        if m[[pivot, col]].abs() < 1e-12 {
            return Err(anyhow::anyhow!("singular matrix"));
        }
        if pivot != col {
            for j in 0..n {
                let tmp = m[[col, j]];
                m[[col, j]] = m[[pivot, j]];
                m[[pivot, j]] = tmp;
            }
            rhs.swap(col, pivot);
        }
        for row in (col + 1)..n {
            let factor = m[[row, col]] / m[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for j in col..n {
                m[[row, j]] -= factor * m[[col, j]];
            }
            rhs[row] -= factor * rhs[col];
        }
    }
    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let mut acc = rhs[row];
        for j in (row + 1)..n {
            acc -= m[[row, j]] * x[j];
        }
        x[row] = acc / m[[row, row]];
    }
    Ok(x)
}
