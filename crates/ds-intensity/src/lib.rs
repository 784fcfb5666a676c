//! # ds-intensity
//!
//! The intensity half of DecayStat:
//! - [`EfficiencyTable`]: per-isotope gamma detection-efficiency curves with
//!   global fallbacks
//! - [`FitStore`]: keyed peak-fit results (gaussian on linear background)
//!   with good/bad-fit bookkeeping
//! - [`fit_peak`]: the fixed-centroid peak-fitting helper that populates a
//!   store from a histogram
//! - [`IntensityScheme`]: absolute and relative gamma intensities and
//!   beta-feeding intensities, all with quadrature error propagation

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Gamma detection-efficiency curves and lookups.
pub mod efficiency;
/// Fixed-centroid peak fitting.
pub mod peaks;
/// Gamma/beta intensity schemes.
pub mod scheme;
/// Peak-fit summaries, entries, and the keyed store.
pub mod store;

pub use efficiency::{
    curve_efficiency, fallback_efficiency, CountMode, DetectorConfig, EfficiencyTable,
    DEFAULT_QUENCHING,
};
pub use peaks::{fit_peak, PeakWindow};
pub use scheme::{BetaIntensity, BetaLevel, GammaIntensity, IntensityScheme, LitValue, RelativeIntensity};
pub use store::{
    FitEntry, FitStore, FitSummary, PeakShape, PEAK_PAR_AMPLITUDE, PEAK_PAR_CENTROID,
    PEAK_PAR_CONSTANT, PEAK_PAR_SIGMA, PEAK_PAR_SLOPE,
};
