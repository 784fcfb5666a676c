//! Peak-fit bookkeeping: summaries, entries, and the keyed store.

use ds_core::math::{add_errors_in_quadrature, sigma_to_fwhm};
use ds_core::{Error, FitReport, Result};
use std::fmt;

/// Peak-shape parameter index: constant background term.
pub const PEAK_PAR_CONSTANT: usize = 0;
/// Peak-shape parameter index: linear background slope.
pub const PEAK_PAR_SLOPE: usize = 1;
/// Peak-shape parameter index: gaussian amplitude.
pub const PEAK_PAR_AMPLITUDE: usize = 2;
/// Peak-shape parameter index: gaussian centroid.
pub const PEAK_PAR_CENTROID: usize = 3;
/// Peak-shape parameter index: gaussian sigma.
pub const PEAK_PAR_SIGMA: usize = 4;

/// The fitted function of one peak: a gaussian on a linear background.
#[derive(Debug, Clone, Copy)]
pub struct PeakShape {
    /// Parameter values in the [`PEAK_PAR_CONSTANT`]..[`PEAK_PAR_SIGMA`] layout.
    pub values: [f64; 5],
    /// Parameter errors in the same layout.
    pub errors: [f64; 5],
}

impl PeakShape {
    /// Evaluate the shape at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        let [constant, slope, amplitude, centroid, sigma] = self.values;
        let z = (x - centroid) / sigma;
        constant + slope * x + amplitude * (-0.5 * z * z).exp()
    }
}

/// Immutable summary of one peak fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitSummary {
    /// Fitted centroid.
    pub location: f64,
    /// Fitted gaussian width (|σ|).
    pub width: f64,
    /// Integrated peak area (gaussian counts).
    pub counts: f64,
    /// Lower edge of the fit window.
    pub fit_low: f64,
    /// Upper edge of the fit window.
    pub fit_high: f64,
    /// Function integral over the fit window, in histogram counts.
    pub integral: f64,
    /// Uncertainty on the function integral.
    pub integral_error: f64,
}

impl fmt::Display for FitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}, {}, {}, {})",
            self.location,
            self.width,
            self.counts,
            self.fit_low,
            self.fit_high,
            self.integral,
            self.integral_error
        )
    }
}

/// One stored peak fit.
///
/// Entries are created by the peak fitter and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct FitEntry {
    /// The fitted function.
    pub shape: PeakShape,
    /// Annotation label, e.g. `1460.82 (5) keV`.
    pub label: String,
    /// Summary values.
    pub summary: FitSummary,
    /// The raw engine report.
    pub report: FitReport,
    /// True when the fitted width exceeded the requested half-window — a
    /// runaway fit whose area is unreliable.
    pub bad_fit: bool,
    /// Covariance sub-matrix of the peak fit (row-major), if available.
    pub covariance: Option<Vec<f64>>,
}

impl FitEntry {
    fn warn_if_bad(&self, warn: bool) {
        if warn && self.bad_fit {
            log::warn!("fit result has bad_fit flag, consider not using it");
        }
    }

    /// Integrated peak counts. A bad fit still returns its stored value;
    /// `warn_if_bad` controls whether it is logged.
    pub fn count(&self, warn_if_bad: bool) -> f64 {
        self.warn_if_bad(warn_if_bad);
        self.summary.counts
    }

    /// Integral-based uncertainty on the counts.
    pub fn count_error(&self, warn_if_bad: bool) -> f64 {
        self.warn_if_bad(warn_if_bad);
        self.summary.integral_error
    }

    /// Function-parameter-based uncertainty on the counts: the quadrature
    /// of the amplitude and sigma fractional errors scaled by the counts.
    ///
    /// Kept distinct from [`FitEntry::count_error`]; the two estimators
    /// disagree when the background parameters are strongly correlated with
    /// the peak, and callers choose which to trust.
    pub fn count_error_from_shape(&self, warn_if_bad: bool) -> Result<f64> {
        self.warn_if_bad(warn_if_bad);
        let frac = add_errors_in_quadrature(&[
            (self.shape.values[PEAK_PAR_SIGMA], self.shape.errors[PEAK_PAR_SIGMA]),
            (self.shape.values[PEAK_PAR_AMPLITUDE], self.shape.errors[PEAK_PAR_AMPLITUDE]),
        ])?;
        Ok(frac * self.summary.counts)
    }

    /// FWHM of the fitted gaussian.
    pub fn fwhm(&self, warn_if_bad: bool) -> f64 {
        self.warn_if_bad(warn_if_bad);
        sigma_to_fwhm(self.shape.values[PEAK_PAR_SIGMA].abs())
    }
}

/// Insertion-ordered map from a peak key (typically the nominal peak
/// energy) to its fit entry.
#[derive(Debug, Clone, Default)]
pub struct FitStore<K> {
    entries: Vec<(K, FitEntry)>,
}

impl<K: PartialEq + Clone + fmt::Debug> FitStore<K> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Insert a fit entry, replacing any previous entry under the same key.
    pub fn insert(&mut self, key: K, entry: FitEntry) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = entry;
        } else {
            self.entries.push((key, entry));
        }
    }

    /// Entry for `key`, if present.
    pub fn get(&self, key: &K) -> Option<&FitEntry> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, e)| e)
    }

    fn require(&self, key: &K) -> Result<&FitEntry> {
        self.get(key).ok_or_else(|| Error::KeyNotFound(format!("key {key:?} does not exist")))
    }

    /// Integrated peak counts for `key`.
    ///
    /// # Errors
    /// [`Error::KeyNotFound`] when the key is absent.
    pub fn count(&self, key: &K, warn_if_bad: bool) -> Result<f64> {
        Ok(self.require(key)?.count(warn_if_bad))
    }

    /// Integral-based count uncertainty for `key`.
    pub fn count_error(&self, key: &K, warn_if_bad: bool) -> Result<f64> {
        Ok(self.require(key)?.count_error(warn_if_bad))
    }

    /// Function-parameter-based count uncertainty for `key`.
    pub fn count_error_from_shape(&self, key: &K, warn_if_bad: bool) -> Result<f64> {
        self.require(key)?.count_error_from_shape(warn_if_bad)
    }

    /// FWHM for `key`.
    pub fn fwhm(&self, key: &K, warn_if_bad: bool) -> Result<f64> {
        Ok(self.require(key)?.fwhm(warn_if_bad))
    }

    /// Copy of the summary for `key`.
    pub fn summary(&self, key: &K) -> Result<FitSummary> {
        Ok(self.require(key)?.summary)
    }

    /// All keys, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Keys whose entries are not flagged `bad_fit`, in insertion order.
    pub fn good_fit_keys(&self) -> Vec<&K> {
        self.entries.iter().filter(|(_, e)| !e.bad_fit).map(|(k, _)| k).collect()
    }

    /// Entries not flagged `bad_fit`, in insertion order.
    pub fn collect_good(&self) -> Vec<&FitEntry> {
        self.entries.iter().filter(|(_, e)| !e.bad_fit).map(|(_, e)| e).collect()
    }

    /// All summaries, in insertion order.
    pub fn summaries(&self) -> Vec<FitSummary> {
        self.entries.iter().map(|(_, e)| e.summary).collect()
    }

    /// All `(key, entry)` pairs, in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&K, &FitEntry)> {
        self.entries.iter().map(|(k, e)| (k, e))
    }

    /// Number of stored fits.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no fits are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn entry(counts: f64, bad_fit: bool) -> FitEntry {
        let shape = PeakShape {
            values: [10.0, 0.0, 50.0, 1000.0, 2.0],
            errors: [1.0, 0.0, 5.0, 0.1, 0.2],
        };
        FitEntry {
            shape,
            label: "1000 (1) keV".into(),
            summary: FitSummary {
                location: 1000.0,
                width: 2.0,
                counts,
                fit_low: 990.0,
                fit_high: 1010.0,
                integral: counts + 200.0,
                integral_error: 12.0,
            },
            report: FitReport {
                parameters: shape.values.to_vec(),
                uncertainties: shape.errors.to_vec(),
                names: vec![
                    "Constant".into(),
                    "Slope".into(),
                    "Amplitude".into(),
                    "Centroid".into(),
                    "Sigma".into(),
                ],
                fixed: vec![false, false, false, true, false],
                covariance: None,
                chi2: 1.0,
                n_points: 20,
                n_free: 4,
                converged: true,
                status: "CONVERGED".into(),
                n_evaluations: 30,
            },
            bad_fit,
            covariance: None,
        }
    }

    #[test]
    fn missing_key_is_an_error() {
        let store: FitStore<u32> = FitStore::new();
        assert!(matches!(store.count(&1460, true), Err(Error::KeyNotFound(_))));
        assert!(matches!(store.fwhm(&1460, false), Err(Error::KeyNotFound(_))));
        assert!(matches!(store.summary(&1460), Err(Error::KeyNotFound(_))));
    }

    #[test]
    fn bad_fit_still_returns_values() {
        let mut store = FitStore::new();
        store.insert(1460u32, entry(250.0, true));
        // warn flag changes logging only, never the value or the result
        assert_eq!(store.count(&1460, true).unwrap(), 250.0);
        assert_eq!(store.count(&1460, false).unwrap(), 250.0);
        assert_eq!(store.count_error(&1460, true).unwrap(), 12.0);
    }

    #[test]
    fn shape_based_error_is_the_parameter_quadrature() {
        let mut store = FitStore::new();
        store.insert(1460u32, entry(250.0, false));
        let expected = ((0.2_f64 / 2.0).powi(2) + (5.0_f64 / 50.0).powi(2)).sqrt() * 250.0;
        let got = store.count_error_from_shape(&1460, false).unwrap();
        assert_relative_eq!(got, expected, max_relative = 1e-12);
        // distinct from the integral-based estimate
        assert!((got - store.count_error(&1460, false).unwrap()).abs() > 1.0);
    }

    #[test]
    fn good_fit_filtering_preserves_insertion_order() {
        let mut store = FitStore::new();
        store.insert(100u32, entry(10.0, false));
        store.insert(200u32, entry(20.0, true));
        store.insert(300u32, entry(30.0, false));

        assert_eq!(store.len(), 3);
        assert_eq!(store.keys().collect::<Vec<_>>(), vec![&100, &200, &300]);
        assert_eq!(store.good_fit_keys(), vec![&100, &300]);
        assert_eq!(store.collect_good().len(), 2);
        let summaries = store.summaries();
        assert_eq!(summaries[1].counts, 20.0);
    }

    #[test]
    fn insert_replaces_same_key() {
        let mut store = FitStore::new();
        store.insert(100u32, entry(10.0, false));
        store.insert(100u32, entry(99.0, false));
        assert_eq!(store.len(), 1);
        assert_eq!(store.count(&100, false).unwrap(), 99.0);
    }

    #[test]
    fn fwhm_uses_the_fitted_sigma() {
        let mut store = FitStore::new();
        store.insert(1460u32, entry(250.0, false));
        assert_relative_eq!(
            store.fwhm(&1460, false).unwrap(),
            2.0 * (2.0 * std::f64::consts::LN_2).sqrt() * 2.0,
            max_relative = 1e-12
        );
    }
}
