//! Chi-square curve fitting against histograms.
//!
//! Fixed parameters never enter the optimizer: the objective is built over
//! the floating subset and re-embedded into the model's full parameter
//! vector on every evaluation, so component decompositions downstream can
//! keep indexing the full layout.

use crate::histogram::Histogram;
use crate::optimizer::{LbfgsOptimizer, ObjectiveFunction, OptimizerConfig};
use ds_core::{CurveModel, Error, FitReport, Result};
use nalgebra::DMatrix;

/// Per-bin weighting of the chi-square sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Weighting {
    /// Counting statistics: σ² = max(content, 1) per bin.
    #[default]
    Poisson,
    /// Unit weights; the covariance is rescaled by chi²/dof after the fit.
    Unweighted,
}

/// Options for [`fit_curve`].
#[derive(Debug, Clone, Default)]
pub struct FitOptions {
    /// Minimizer configuration.
    pub optimizer: OptimizerConfig,
    /// Chi-square weighting scheme.
    pub weighting: Weighting,
}

struct ChiSquare<'a, M: CurveModel> {
    model: &'a M,
    xs: Vec<f64>,
    ys: Vec<f64>,
    ws: Vec<f64>,
    template: Vec<f64>,
    free: Vec<usize>,
}

impl<M: CurveModel> ChiSquare<'_, M> {
    fn embed(&self, free_params: &[f64]) -> Vec<f64> {
        let mut full = self.template.clone();
        for (slot, &idx) in self.free.iter().enumerate() {
            full[idx] = free_params[slot];
        }
        full
    }

    fn chi2(&self, full: &[f64]) -> f64 {
        let mut accum = 0.0;
        for ((&x, &y), &w) in self.xs.iter().zip(&self.ys).zip(&self.ws) {
            let r = y - self.model.eval(x, full);
            accum += w * r * r;
        }
        accum
    }
}

impl<M: CurveModel> ObjectiveFunction for ChiSquare<'_, M> {
    fn eval(&self, params: &[f64]) -> Result<f64> {
        Ok(self.chi2(&self.embed(params)))
    }
}

/// Forward-difference Hessian of the objective's gradient, symmetrized.
fn compute_hessian(objective: &dyn ObjectiveFunction, best: &[f64]) -> Result<DMatrix<f64>> {
    let n = best.len();
    let grad_center = objective.gradient(best)?;
    let mut hessian = DMatrix::zeros(n, n);
    for j in 0..n {
        let eps = 1e-4 * best[j].abs().max(1.0);
        let mut plus = best.to_vec();
        plus[j] += eps;
        let grad_plus = objective.gradient(&plus)?;
        for i in 0..n {
            hessian[(i, j)] = (grad_plus[i] - grad_center[i]) / eps;
        }
    }
    let ht = hessian.transpose();
    Ok((&hessian + &ht) * 0.5)
}

/// Invert the Hessian via damped Cholesky, falling back to LU.
///
/// The numerical Hessian can be slightly indefinite even at a valid
/// minimum; diagonal damping is increased geometrically until the Cholesky
/// factorization succeeds. Returns `None` when no acceptable inverse exists.
fn invert_hessian(hessian: &DMatrix<f64>, n: usize) -> Option<DMatrix<f64>> {
    let identity = DMatrix::identity(n, n);
    let diag_scale = (0..n).map(|i| hessian[(i, i)].abs()).fold(0.0_f64, f64::max).max(1.0);

    let mut damped = hessian.clone();
    let mut damping = 0.0_f64;
    let max_attempts = 10;
    for attempt in 0..max_attempts {
        if let Some(chol) = nalgebra::linalg::Cholesky::new(damped.clone()) {
            return Some(chol.solve(&identity));
        }
        if attempt + 1 == max_attempts {
            break;
        }
        let next = if damping == 0.0 { diag_scale * 1e-9 } else { damping * 10.0 };
        let add = next - damping;
        for i in 0..n {
            damped[(i, i)] += add;
        }
        damping = next;
    }

    let cov = damped.lu().try_inverse()?;
    for i in 0..n {
        let v = cov[(i, i)];
        if !(v.is_finite() && v > 0.0) {
            return None;
        }
    }
    Some(cov)
}

fn diagonal_uncertainties(hessian: &DMatrix<f64>, n: usize, scale: f64) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let denom = hessian[(i, i)].abs().max(1e-12);
            (scale / denom).sqrt()
        })
        .collect()
}

/// Fit `model` against the histogram bins whose centers fall in `range`.
///
/// Returns a [`FitReport`] over the full parameter vector; the status string
/// contains `CONVERGED` exactly when the minimizer converged. On covariance
/// failure the report degrades to diagonal uncertainties with a warning, as
/// the covariance is advisory while the parameter values are not.
///
/// # Errors
/// [`Error::InvalidArgument`] when no bin center lies in the fit range;
/// optimizer errors propagate untouched.
pub fn fit_curve<M: CurveModel>(
    model: &M,
    hist: &Histogram,
    range: (f64, f64),
    options: &FitOptions,
) -> Result<FitReport> {
    let (fit_low, fit_high) = range;
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    let mut ws = Vec::new();
    for bin in 0..hist.n_bins {
        let center = hist.bin_center(bin);
        if center < fit_low || center > fit_high {
            continue;
        }
        let y = hist.bin_content[bin];
        xs.push(center);
        ys.push(y);
        ws.push(match options.weighting {
            Weighting::Poisson => 1.0 / y.max(1.0),
            Weighting::Unweighted => 1.0,
        });
    }
    if xs.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "no histogram bins inside the fit range [{fit_low}, {fit_high}]"
        )));
    }

    let n = model.n_parameters();
    let names = model.parameter_names();
    let template = model.parameter_init();
    let fixed = model.parameter_fixed();
    let all_bounds = model.parameter_bounds();
    let free: Vec<usize> = (0..n).filter(|&i| !fixed[i]).collect();
    let n_points = xs.len();

    let objective = ChiSquare { model, xs, ys, ws, template: template.clone(), free: free.clone() };

    if free.is_empty() {
        let chi2 = objective.chi2(&template);
        return Ok(FitReport {
            parameters: template,
            uncertainties: vec![0.0; n],
            names,
            fixed,
            covariance: Some(vec![0.0; n * n]),
            chi2,
            n_points,
            n_free: 0,
            converged: true,
            status: "CONVERGED (all parameters fixed)".into(),
            n_evaluations: 1,
        });
    }

    let init: Vec<f64> = free.iter().map(|&i| template[i]).collect();
    let bounds: Vec<(f64, f64)> = free.iter().map(|&i| all_bounds[i]).collect();
    let optimizer = LbfgsOptimizer::new(options.optimizer.clone());
    let opt = optimizer.minimize(&objective, &init, &bounds)?;

    let parameters = objective.embed(&opt.parameters);
    let chi2 = opt.fval;
    let n_free = free.len();
    let dof = n_points as i64 - n_free as i64;

    // Covariance of a chi-square objective is 2·H⁻¹; with unit weights the
    // residual variance chi²/dof replaces the per-bin variances.
    let cov_scale = match options.weighting {
        Weighting::Poisson => 2.0,
        Weighting::Unweighted => {
            if dof > 0 {
                2.0 * chi2 / dof as f64
            } else {
                2.0
            }
        }
    };

    let hessian = compute_hessian(&objective, &opt.parameters)?;
    let mut uncertainties = vec![0.0; n];
    let covariance = match invert_hessian(&hessian, n_free) {
        Some(inv) => {
            let mut ok = true;
            for (slot, &idx) in free.iter().enumerate() {
                let var = cov_scale * inv[(slot, slot)];
                if var.is_finite() && var >= 0.0 {
                    uncertainties[idx] = var.sqrt();
                } else {
                    ok = false;
                }
            }
            if ok {
                let mut flat = vec![0.0; n * n];
                for (si, &i) in free.iter().enumerate() {
                    for (sj, &j) in free.iter().enumerate() {
                        flat[i * n + j] = cov_scale * inv[(si, sj)];
                    }
                }
                Some(flat)
            } else {
                log::warn!("invalid covariance diagonal; omitting covariance matrix");
                let diag = diagonal_uncertainties(&hessian, n_free, cov_scale);
                for (slot, &idx) in free.iter().enumerate() {
                    uncertainties[idx] = diag[slot];
                }
                None
            }
        }
        None => {
            log::warn!("Hessian inversion failed, using diagonal approximation");
            let diag = diagonal_uncertainties(&hessian, n_free, cov_scale);
            for (slot, &idx) in free.iter().enumerate() {
                uncertainties[idx] = diag[slot];
            }
            None
        }
    };

    let status = if opt.converged {
        format!("CONVERGED ({})", opt.message)
    } else {
        format!("FAILED ({})", opt.message)
    };

    Ok(FitReport {
        parameters,
        uncertainties,
        names,
        fixed,
        covariance,
        chi2,
        n_points,
        n_free,
        converged: opt.converged,
        status,
        n_evaluations: opt.n_fev + opt.n_gev,
    })
}
