//! Small numeric helpers shared across the workspace.
//!
//! Half-life / decay-constant conversions, quadrature combination of
//! fractional uncertainties, and gaussian peak-shape arithmetic.

use crate::error::{Error, Result};

/// Unit scale: seconds.
pub const SECONDS: f64 = 1.0;
/// Unit scale: milliseconds, expressed in seconds.
pub const MILLISECONDS: f64 = 1e-3;
/// Unit scale: microseconds, expressed in seconds.
pub const MICROSECONDS: f64 = 1e-6;
/// Unit scale: nanoseconds, expressed in seconds.
pub const NANOSECONDS: f64 = 1e-9;

/// Convert a half-life to a decay constant.
///
/// `input_units` scales the half-life into seconds; `output_units` selects
/// the time division of the returned constant. Returns 0 when the half-life
/// or the input scale is zero — a numeric guard, not an error path: stable
/// nuclides (infinite half-life) and unset table entries both map to a zero
/// decay rate.
pub fn halflife_to_decay_constant(halflife: f64, input_units: f64, output_units: f64) -> f64 {
    if halflife == 0.0 || input_units == 0.0 {
        return 0.0;
    }
    output_units * std::f64::consts::LN_2 / (halflife * input_units)
}

/// Convert a decay constant back to a half-life. Same zero-guard convention
/// as [`halflife_to_decay_constant`].
pub fn decay_constant_to_halflife(decay_constant: f64, input_units: f64, output_units: f64) -> f64 {
    if decay_constant == 0.0 || input_units == 0.0 {
        return 0.0;
    }
    std::f64::consts::LN_2 * output_units / (decay_constant * input_units)
}

/// Combine the fractional errors of `(value, absolute_error)` pairs in
/// quadrature.
///
/// Returns `sqrt(Σ (error/value)²)` — a **fractional** error the caller
/// multiplies by the nominal combined value. Pairs with a zero value are
/// skipped: they contribute no finite relative error.
///
/// # Errors
/// [`Error::InvalidArgument`] when the input slice is empty.
pub fn add_errors_in_quadrature(pairs: &[(f64, f64)]) -> Result<f64> {
    if pairs.is_empty() {
        return Err(Error::InvalidArgument(
            "expected a non-empty slice of (value, error) pairs".into(),
        ));
    }
    let mut accum = 0.0;
    for &(value, error) in pairs {
        if value == 0.0 {
            continue;
        }
        let frac = error / value;
        accum += frac * frac;
    }
    Ok(accum.sqrt())
}

/// FWHM of a gaussian with standard deviation `sigma`.
pub fn sigma_to_fwhm(sigma: f64) -> f64 {
    2.0 * (2.0 * std::f64::consts::LN_2).sqrt() * sigma
}

/// Area of a gaussian peak from its amplitude and standard deviation.
pub fn gaussian_area(sigma: f64, amplitude: f64) -> f64 {
    amplitude * sigma * (2.0 * std::f64::consts::PI).sqrt()
}

/// Decimal exponent of `num`: the power `e` such that `|num| = d.ddd × 10^e`.
///
/// Returns `+inf` for infinite input and `-inf` for zero.
pub fn decimal_exponent(num: f64) -> f64 {
    if num.is_infinite() {
        return f64::INFINITY;
    }
    if num == 0.0 {
        return f64::NEG_INFINITY;
    }
    let mut n = num.abs();
    let mut ct = 0i32;
    if n >= 10.0 {
        while n >= 10.0 {
            n /= 10.0;
            ct += 1;
        }
    } else if n < 1.0 {
        while n < 1.0 {
            n *= 10.0;
            ct -= 1;
        }
    }
    f64::from(ct)
}

/// Truncate a value/uncertainty pair to the uncertainty's leading decimal.
///
/// Returns `(truncated_value, leading_uncertainty_digits, decimals)` where
/// `decimals` is the number of decimal places the value keeps. Degenerate
/// uncertainties (zero or infinite) pass the inputs through with one digit.
pub fn standard_uncertainty(num: f64, uncertainty: f64) -> (f64, f64, u32) {
    let exponent = decimal_exponent(uncertainty);
    if !exponent.is_finite() {
        return (num, uncertainty, 1);
    }
    let e = exponent as i32;
    if e >= 0 {
        (num.trunc(), uncertainty.trunc(), 0)
    } else {
        let scale = 10f64.powi(e);
        let value = (num / scale).trunc() * scale;
        let leading = (uncertainty / scale).trunc();
        (value, leading, e.unsigned_abs())
    }
}

/// Compact `value (uncertainty)` notation, e.g. `1234.56 (2)`.
pub fn standard_uncertainty_str(num: f64, uncertainty: f64) -> String {
    let (value, leading, decimals) = standard_uncertainty(num, uncertainty);
    let leading = if leading.is_finite() { leading } else { 1.0 };
    format!("{value:.prec$} ({leading:.0})", prec = decimals as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn conversion_round_trip() {
        for halflife in [1e-3, 0.09, 1.0, 3600.0] {
            let lambda = halflife_to_decay_constant(halflife, SECONDS, SECONDS);
            let back = decay_constant_to_halflife(lambda, SECONDS, SECONDS);
            assert_relative_eq!(back, halflife, max_relative = 1e-12);
        }
    }

    #[test]
    fn conversion_unit_scaling() {
        // 90 ms expressed in milliseconds, constant requested per second
        let lambda = halflife_to_decay_constant(90.0, MILLISECONDS, SECONDS);
        assert_relative_eq!(lambda, std::f64::consts::LN_2 / 0.090, max_relative = 1e-12);
    }

    #[test]
    fn conversion_zero_guards() {
        assert_eq!(halflife_to_decay_constant(0.0, SECONDS, SECONDS), 0.0);
        assert_eq!(halflife_to_decay_constant(1.0, 0.0, SECONDS), 0.0);
        assert_eq!(decay_constant_to_halflife(0.0, SECONDS, SECONDS), 0.0);
        // stable nuclide: infinite half-life decays at rate zero
        assert_eq!(halflife_to_decay_constant(f64::INFINITY, SECONDS, SECONDS), 0.0);
    }

    #[test]
    fn quadrature_empty_is_an_error() {
        assert!(add_errors_in_quadrature(&[]).is_err());
    }

    #[test]
    fn quadrature_skips_zero_values() {
        let frac = add_errors_in_quadrature(&[(5.0, 1.0), (10.0, 0.0)]).unwrap();
        assert_relative_eq!(frac, 0.2, max_relative = 1e-12);
        // a zero value contributes nothing even with a nonzero error
        let frac = add_errors_in_quadrature(&[(5.0, 1.0), (0.0, 7.0)]).unwrap();
        assert_relative_eq!(frac, 0.2, max_relative = 1e-12);
    }

    #[test]
    fn quadrature_permutation_symmetric_and_monotone() {
        let a = add_errors_in_quadrature(&[(2.0, 0.1), (4.0, 0.5), (8.0, 0.2)]).unwrap();
        let b = add_errors_in_quadrature(&[(8.0, 0.2), (2.0, 0.1), (4.0, 0.5)]).unwrap();
        assert_relative_eq!(a, b, max_relative = 1e-15);

        let bigger = add_errors_in_quadrature(&[(2.0, 0.1), (4.0, 0.9), (8.0, 0.2)]).unwrap();
        assert!(bigger > a);
    }

    #[test]
    fn fwhm_and_area() {
        assert_relative_eq!(sigma_to_fwhm(1.0), 2.354820045, max_relative = 1e-9);
        assert_relative_eq!(
            gaussian_area(2.0, 3.0),
            3.0 * 2.0 * (2.0 * std::f64::consts::PI).sqrt(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn standard_uncertainty_notation() {
        assert_eq!(standard_uncertainty_str(1234.567, 0.023), "1234.56 (2)");
        assert_eq!(standard_uncertainty_str(1234.567, 23.0), "1234 (23)");
        assert_eq!(decimal_exponent(0.023), -2.0);
        assert_eq!(decimal_exponent(23.0), 1.0);
        assert_eq!(decimal_exponent(0.0), f64::NEG_INFINITY);
    }
}
