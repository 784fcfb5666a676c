//! Gamma detection-efficiency curves.
//!
//! Every curve has the same parametric form: a power law times a polynomial
//! in log-energy, `ε(E) = E^p0 · Σ_{i=1..8} p_i · ln(E)^(i−1)`, with nine
//! fitted coefficients. Per-isotope curves come from simulated response fits
//! keyed by isotope and detector configuration, each carrying separate
//! addback and singles coefficient sets; two global fallback sets cover
//! isotopes without a simulation.

use ds_core::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Global addback-mode fallback coefficients.
const FALLBACK_ADDBACK: [f64; 9] = [
    8.96128866e-01,
    -7.87998001e+01,
    7.56353344e+01,
    -3.08630405e+01,
    6.95291975e+00,
    -9.35052693e-01,
    7.51237951e-02,
    -3.34040409e-03,
    6.34403866e-05,
];

/// Global singles-mode fallback coefficients.
const FALLBACK_SINGLES: [f64; 9] = [
    9.21812310e-01,
    -1.11413952e+02,
    1.10874105e+02,
    -4.69736304e+01,
    1.09975808e+01,
    -1.53803784e+00,
    1.28566216e-01,
    -5.95030769e-03,
    1.17662117e-04,
];

/// Quenching factor applied to per-isotope curves.
pub const DEFAULT_QUENCHING: f64 = 0.4;

/// Segment-summing mode of the efficiency curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountMode {
    /// Coincident segment hits summed into one value.
    #[default]
    Addback,
    /// Segments counted independently.
    Singles,
}

/// Detector geometry the curve was simulated for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DetectorConfig {
    /// Implantation-point configuration.
    #[default]
    Inside,
    /// Upstream (front) configuration.
    Front,
    /// A named custom configuration.
    Custom(String),
}

impl DetectorConfig {
    fn key(&self) -> &str {
        match self {
            DetectorConfig::Inside => "inside",
            DetectorConfig::Front => "front",
            DetectorConfig::Custom(name) => name,
        }
    }
}

/// Evaluate the nine-coefficient efficiency form at `energy` (keV).
///
/// # Errors
/// [`Error::NumericGuard`] for non-positive energies, where the log-energy
/// polynomial is undefined.
pub fn curve_efficiency(energy: f64, coeffs: &[f64; 9]) -> Result<f64> {
    if energy <= 0.0 {
        return Err(Error::NumericGuard(format!(
            "efficiency curve undefined at energy {energy} keV"
        )));
    }
    let log_e = energy.ln();
    let mut poly = 0.0;
    for (i, c) in coeffs.iter().skip(1).enumerate() {
        poly += c * log_e.powi(i as i32);
    }
    Ok(poly * energy.powf(coeffs[0]))
}

/// Global fallback efficiency in percent (or fractional).
///
/// Fallback values are not quenched; quenching belongs to the per-isotope
/// simulated curves.
pub fn fallback_efficiency(energy: f64, mode: CountMode, fractional: bool) -> Result<f64> {
    let coeffs = match mode {
        CountMode::Addback => &FALLBACK_ADDBACK,
        CountMode::Singles => &FALLBACK_SINGLES,
    };
    Ok(curve_efficiency(energy, coeffs)? * if fractional { 0.01 } else { 1.0 })
}

#[derive(Debug, Clone, Deserialize)]
struct RawCurve {
    fit_par_addback: Vec<f64>,
    fit_par_singles: Vec<f64>,
}

#[derive(Debug, Clone)]
struct CurvePair {
    addback: [f64; 9],
    singles: [f64; 9],
}

/// Per-isotope efficiency curves, loaded once and passed by reference into
/// every consumer.
#[derive(Debug, Clone)]
pub struct EfficiencyTable {
    curves: HashMap<String, HashMap<String, CurvePair>>,
    quenching: f64,
}

impl Default for EfficiencyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl EfficiencyTable {
    /// Create an empty table with the default quenching factor.
    pub fn new() -> Self {
        Self { curves: HashMap::new(), quenching: DEFAULT_QUENCHING }
    }

    /// Replace the quenching factor applied to per-isotope curves.
    pub fn with_quenching(mut self, quenching: f64) -> Self {
        self.quenching = quenching;
        self
    }

    /// Insert one isotope/configuration curve pair.
    pub fn insert_curve(
        &mut self,
        isotope: impl Into<String>,
        config: DetectorConfig,
        addback: [f64; 9],
        singles: [f64; 9],
    ) {
        self.curves
            .entry(isotope.into())
            .or_default()
            .insert(config.key().to_string(), CurvePair { addback, singles });
    }

    /// Load a table from the simulated-response JSON export:
    /// `{ isotope: { config: { fit_par_addback: [9], fit_par_singles: [9] } } }`.
    ///
    /// # Errors
    /// [`Error::Json`] for malformed JSON, [`Error::InvalidArgument`] when a
    /// coefficient list does not have exactly nine entries.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: HashMap<String, HashMap<String, RawCurve>> = serde_json::from_str(json)?;
        let mut table = Self::new();
        for (isotope, configs) in raw {
            for (config, curve) in configs {
                let addback = coeff_array(&isotope, &config, "addback", &curve.fit_par_addback)?;
                let singles = coeff_array(&isotope, &config, "singles", &curve.fit_par_singles)?;
                table
                    .curves
                    .entry(isotope.clone())
                    .or_default()
                    .insert(config, CurvePair { addback, singles });
            }
        }
        Ok(table)
    }

    /// Load a table from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Isotopes with at least one curve.
    pub fn isotopes(&self) -> impl Iterator<Item = &str> {
        self.curves.keys().map(String::as_str)
    }

    /// Quenched per-isotope efficiency in percent (or fractional).
    ///
    /// # Errors
    /// [`Error::KeyNotFound`] when the isotope or configuration has no
    /// simulated curve — the caller decides whether to use
    /// [`fallback_efficiency`]; [`Error::NumericGuard`] for non-positive
    /// energies.
    pub fn efficiency(
        &self,
        energy: f64,
        isotope: &str,
        config: &DetectorConfig,
        mode: CountMode,
        fractional: bool,
    ) -> Result<f64> {
        let configs = self.curves.get(isotope).ok_or_else(|| {
            Error::KeyNotFound(format!(
                "isotope {isotope} is not in the efficiency table; check that it has been simulated"
            ))
        })?;
        let pair = configs.get(config.key()).ok_or_else(|| {
            Error::KeyNotFound(format!(
                "isotope {isotope} has no '{}' configuration curve",
                config.key()
            ))
        })?;
        let coeffs = match mode {
            CountMode::Addback => &pair.addback,
            CountMode::Singles => &pair.singles,
        };
        Ok(curve_efficiency(energy, coeffs)?
            * self.quenching
            * if fractional { 0.01 } else { 1.0 })
    }
}

fn coeff_array(isotope: &str, config: &str, mode: &str, coeffs: &[f64]) -> Result<[f64; 9]> {
    coeffs.try_into().map_err(|_| {
        Error::InvalidArgument(format!(
            "{isotope}/{config} {mode} curve has {} coefficients, expected 9",
            coeffs.len()
        ))
    })
}
