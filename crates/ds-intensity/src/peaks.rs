//! Fixed-centroid peak fitting.
//!
//! The shape is a gaussian on a linear background. The centroid is held at
//! the nominal line energy (known from level schemes far more precisely
//! than one spectrum can determine it); a constant-background prefit seeds
//! the background level before the full shape is fit.

use crate::store::{
    FitEntry, FitStore, FitSummary, PeakShape, PEAK_PAR_AMPLITUDE, PEAK_PAR_CENTROID,
    PEAK_PAR_SIGMA,
};
use ds_core::math::{gaussian_area, standard_uncertainty_str};
use ds_core::{CurveModel, Result};
use ds_fit::{fit_curve, integral_error, simpson_integral, FitOptions, Histogram};
use std::fmt;

/// Where and how wide to fit one peak.
#[derive(Debug, Clone, Copy)]
pub struct PeakWindow {
    /// Nominal centroid (held fixed).
    pub center: f64,
    /// Centroid uncertainty from the level scheme, carried for display.
    pub center_error: f64,
    /// Half-width of the fit window around the centroid.
    pub half_window: f64,
    /// Starting value for the gaussian sigma.
    pub sigma_guess: f64,
}

struct ConstantModel {
    init: f64,
}

impl CurveModel for ConstantModel {
    fn n_parameters(&self) -> usize {
        1
    }
    fn parameter_names(&self) -> Vec<String> {
        vec!["Constant".into()]
    }
    fn parameter_init(&self) -> Vec<f64> {
        vec![self.init]
    }
    fn parameter_bounds(&self) -> Vec<(f64, f64)> {
        vec![(f64::NEG_INFINITY, f64::INFINITY)]
    }
    fn parameter_fixed(&self) -> Vec<bool> {
        vec![false]
    }
    fn eval(&self, _x: f64, params: &[f64]) -> f64 {
        params[0]
    }
}

struct PeakModel {
    init: [f64; 5],
    fixed: [bool; 5],
}

impl CurveModel for PeakModel {
    fn n_parameters(&self) -> usize {
        5
    }
    fn parameter_names(&self) -> Vec<String> {
        vec![
            "Constant".into(),
            "Slope".into(),
            "Amplitude".into(),
            "Centroid".into(),
            "Sigma".into(),
        ]
    }
    fn parameter_init(&self) -> Vec<f64> {
        self.init.to_vec()
    }
    fn parameter_bounds(&self) -> Vec<(f64, f64)> {
        vec![(f64::NEG_INFINITY, f64::INFINITY); 5]
    }
    fn parameter_fixed(&self) -> Vec<bool> {
        self.fixed.to_vec()
    }
    fn eval(&self, x: f64, params: &[f64]) -> f64 {
        let z = (x - params[3]) / params[4];
        params[0] + params[1] * x + params[2] * (-0.5 * z * z).exp()
    }
}

/// Fit one peak and insert the result into the store under `key`.
///
/// The entry is flagged `bad_fit` when the fitted |σ| exceeds the requested
/// half-window — a runaway fit that absorbed the window instead of the peak.
///
/// # Errors
/// Engine failures propagate (empty windows, optimizer errors).
pub fn fit_peak<K: PartialEq + Clone + fmt::Debug>(
    store: &mut FitStore<K>,
    key: K,
    hist: &Histogram,
    window: &PeakWindow,
    options: &FitOptions,
) -> Result<()> {
    let low = window.center - window.half_window;
    let high = window.center + window.half_window;

    // seed the background from a constant-only prefit
    let constant = ConstantModel { init: 0.0 };
    let background = fit_curve(&constant, hist, (low, high), options)?;

    let model = PeakModel {
        init: [background.parameters[0], 0.0, 5.0, window.center, window.sigma_guess],
        fixed: [false, false, false, true, false],
    };
    let report = fit_curve(&model, hist, (low, high), options)?;

    let mut errors = [0.0; 5];
    errors.copy_from_slice(&report.uncertainties);
    // the centroid is held fixed; carry its level-scheme uncertainty instead
    errors[PEAK_PAR_CENTROID] = window.center_error;
    let mut values = [0.0; 5];
    values.copy_from_slice(&report.parameters);
    let shape = PeakShape { values, errors };

    let counts = gaussian_area(values[PEAK_PAR_SIGMA], values[PEAK_PAR_AMPLITUDE]).abs();
    let step = hist.bin_width();
    let integral = simpson_integral(|x| shape.eval(x), low, high, step, true);
    let integral_err = match &report.covariance {
        Some(cov) => integral_error(&model, &report.parameters, cov, low, high, step, true),
        None => 0.0,
    };
    let bad_fit = values[PEAK_PAR_SIGMA].abs() > window.half_window;

    let entry = FitEntry {
        shape,
        label: format!(
            "{} keV",
            standard_uncertainty_str(window.center, window.center_error)
        ),
        summary: FitSummary {
            location: values[PEAK_PAR_CENTROID],
            width: values[PEAK_PAR_SIGMA].abs(),
            counts,
            fit_low: low,
            fit_high: high,
            integral,
            integral_error: integral_err,
        },
        covariance: report.covariance.clone(),
        report,
        bad_fit,
    };
    store.insert(key, entry);
    Ok(())
}
