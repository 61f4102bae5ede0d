use gazecal_core::Real;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LineFitError {
    #[error("sample counts differ: {xs} abscissae vs {ys} ordinates")]
    MismatchedLengths { xs: usize, ys: usize },
    #[error("need at least 2 samples for a line fit, got {0}")]
    NotEnoughSamples(usize),
    #[error("abscissae are degenerate (all equal)")]
    DegenerateAbscissa,
}

/// A fitted line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineFit {
    pub slope: Real,
    pub intercept: Real,
}

impl LineFit {
    pub fn eval(&self, x: Real) -> Real {
        self.slope * x + self.intercept
    }
}

/// Ordinary least-squares line fit.
pub fn fit_line(xs: &[Real], ys: &[Real]) -> Result<LineFit, LineFitError> {
    if xs.len() != ys.len() {
        return Err(LineFitError::MismatchedLengths {
            xs: xs.len(),
            ys: ys.len(),
        });
    }
    if xs.len() < 2 {
        return Err(LineFitError::NotEnoughSamples(xs.len()));
    }

    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xx = 0.0;
    let mut sum_xy = 0.0;
    for (&x, &y) in xs.iter().zip(ys.iter()) {
        sum_x += x;
        sum_y += y;
        sum_xx += x * x;
        sum_xy += x * y;
    }

    let n = xs.len() as Real;
    let denom = n * sum_xx - sum_x * sum_x;
    if denom.abs() < 1e-12 {
        return Err(LineFitError::DegenerateAbscissa);
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;
    Ok(LineFit { slope, intercept })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_line() {
        let xs: Vec<Real> = (0..10).map(|i| i as Real * 0.5).collect();
        let ys: Vec<Real> = xs.iter().map(|x| 2.0 * x + 1.0).collect();

        let fit = fit_line(&xs, &ys).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.eval(3.0) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn constant_series_fits_zero_slope() {
        let xs = [0.0, 10.0, 20.0];
        let ys = [0.04, 0.04, 0.04];
        let fit = fit_line(&xs, &ys).unwrap();
        assert!(fit.slope.abs() < 1e-12);
        assert!((fit.intercept - 0.04).abs() < 1e-12);
    }

    #[test]
    fn rejects_single_sample() {
        assert!(matches!(
            fit_line(&[1.0], &[2.0]),
            Err(LineFitError::NotEnoughSamples(1))
        ));
    }

    #[test]
    fn rejects_equal_abscissae() {
        assert!(matches!(
            fit_line(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]),
            Err(LineFitError::DegenerateAbscissa)
        ));
    }
}
