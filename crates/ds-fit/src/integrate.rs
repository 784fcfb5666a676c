//! Numerical integration helpers.

use ds_core::CurveModel;

/// Integrate `f` over `[low, high]` with Simpson's 3/8 rule.
///
/// `step` is the outer panel width. With `hist_scale` the result is divided
/// by the step size, converting a function integral into histogram counts
/// when `step` equals the bin width of the fitted histogram.
pub fn simpson_integral(f: impl Fn(f64) -> f64, low: f64, high: f64, step: f64, hist_scale: bool) -> f64 {
    let h = step / 3.0;
    let mut accum = 0.0;
    let mut a = low;
    while a < high {
        accum += f(a) + 3.0 * f(a + h) + 3.0 * f(a + 2.0 * h) + f(a + step);
        a += step;
    }
    let mut result = accum * h * 3.0 / 8.0;
    if hist_scale {
        result /= step;
    }
    result
}

/// Uncertainty on a model integral, propagated through the fit covariance.
///
/// Computes `σ_I² = Σ_ij (∂I/∂p_i) C_ij (∂I/∂p_j)` with the integral
/// derivatives estimated by central differences. `covariance` is the
/// row-major full-rank matrix from a fit report; zeroed rows of fixed
/// parameters contribute nothing.
pub fn integral_error<M: CurveModel>(
    model: &M,
    params: &[f64],
    covariance: &[f64],
    low: f64,
    high: f64,
    step: f64,
    hist_scale: bool,
) -> f64 {
    let n = params.len();
    debug_assert_eq!(covariance.len(), n * n);

    let mut derivs = vec![0.0; n];
    for i in 0..n {
        // skip parameters with no variance; their derivative is never used
        if covariance[i * n + i] == 0.0 {
            continue;
        }
        let eps = 1e-6 * params[i].abs().max(1.0);
        let mut plus = params.to_vec();
        plus[i] += eps;
        let mut minus = params.to_vec();
        minus[i] -= eps;
        let i_plus = simpson_integral(|x| model.eval(x, &plus), low, high, step, hist_scale);
        let i_minus = simpson_integral(|x| model.eval(x, &minus), low, high, step, hist_scale);
        derivs[i] = (i_plus - i_minus) / (2.0 * eps);
    }

    let mut var = 0.0;
    for i in 0..n {
        for j in 0..n {
            var += derivs[i] * covariance[i * n + j] * derivs[j];
        }
    }
    var.max(0.0).sqrt()
}
