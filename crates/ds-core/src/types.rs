//! Common data types for DecayStat

use serde::{Deserialize, Serialize};
use std::fmt;

/// Substring present in [`FitReport::status`] when the minimizer converged.
pub const CONVERGED_MARKER: &str = "CONVERGED";

/// Returns true when a fit status string signals convergence.
///
/// Convergence is a substring match so that status strings may carry extra
/// termination detail after the marker.
pub fn fit_succeeded(status: &str) -> bool {
    status.contains(CONVERGED_MARKER)
}

/// Result of a least-squares curve fit.
///
/// Covers the full parameter vector of the model, including parameters that
/// were held fixed during the fit. Fixed parameters report an uncertainty of
/// zero and zeroed covariance rows/columns; their display errors, if any,
/// live with the owning model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitReport {
    /// Best-fit parameter values (fixed parameters keep their held value).
    pub parameters: Vec<f64>,

    /// Parameter uncertainties (sqrt of covariance diagonal; 0 for fixed).
    pub uncertainties: Vec<f64>,

    /// Parameter names.
    pub names: Vec<String>,

    /// Fixed/floating flag per parameter.
    pub fixed: Vec<bool>,

    /// Covariance matrix (row-major, N×N over the full parameter vector,
    /// zero at fixed rows/columns). `None` if Hessian inversion failed.
    pub covariance: Option<Vec<f64>>,

    /// Chi-square at the minimum.
    pub chi2: f64,

    /// Number of histogram bins that entered the fit.
    pub n_points: usize,

    /// Number of floating parameters.
    pub n_free: usize,

    /// Convergence status
    pub converged: bool,

    /// Termination status string; contains [`CONVERGED_MARKER`] on success.
    pub status: String,

    /// Number of objective evaluations
    pub n_evaluations: usize,
}

impl FitReport {
    /// Degrees of freedom: fit points minus floating parameters.
    pub fn dof(&self) -> i64 {
        self.n_points as i64 - self.n_free as i64
    }

    /// Chi-square per degree of freedom, or `None` when dof is not positive.
    pub fn chi2_per_dof(&self) -> Option<f64> {
        let dof = self.dof();
        (dof > 0).then(|| self.chi2 / dof as f64)
    }

    /// Covariance matrix element (i, j). `None` if covariance is unavailable
    /// or the indices are out of range.
    pub fn covariance_at(&self, i: usize, j: usize) -> Option<f64> {
        let cov = self.covariance.as_ref()?;
        let n = self.parameters.len();
        if i >= n || j >= n {
            return None;
        }
        Some(cov[i * n + j])
    }

    /// Correlation matrix element (i, j). `None` if covariance is unavailable
    /// or either uncertainty is not positive.
    pub fn correlation(&self, i: usize, j: usize) -> Option<f64> {
        let cov = self.covariance_at(i, j)?;
        let sigma_i = self.uncertainties[i];
        let sigma_j = self.uncertainties[j];
        if sigma_i <= 0.0 || sigma_j <= 0.0 {
            return None;
        }
        Some(cov / (sigma_i * sigma_j))
    }
}

impl fmt::Display for FitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FitReport(chi2={:.6E}, points={}, free={}, dof={}, converged={}, status={})",
            self.chi2,
            self.n_points,
            self.n_free,
            self.dof(),
            self.converged,
            self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_with_cov() -> FitReport {
        FitReport {
            parameters: vec![1.0, 2.0],
            uncertainties: vec![0.1, 0.2],
            names: vec!["a".into(), "b".into()],
            fixed: vec![false, false],
            covariance: Some(vec![0.01, 0.002, 0.002, 0.04]),
            chi2: 12.5,
            n_points: 20,
            n_free: 2,
            converged: true,
            status: "CONVERGED (gradient tolerance reached)".into(),
            n_evaluations: 40,
        }
    }

    #[test]
    fn dof_and_accessors() {
        let r = report_with_cov();
        assert_eq!(r.dof(), 18);
        assert_eq!(r.covariance_at(0, 1), Some(0.002));
        assert_eq!(r.covariance_at(2, 0), None);
        let rho = r.correlation(0, 1).unwrap();
        assert!((rho - 0.002 / (0.1 * 0.2)).abs() < 1e-12);
    }

    #[test]
    fn status_substring_contract() {
        let r = report_with_cov();
        assert!(fit_succeeded(&r.status));
        assert!(!fit_succeeded("FAILED (max iterations)"));
    }
}
