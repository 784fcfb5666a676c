//! # ds-fit
//!
//! Histogram container and the nonlinear least-squares engine:
//! - [`Histogram`]: uniform-binning 1-D histogram with fill/merge/integral
//!   operations (partial histograms from independent fills sum commutatively)
//! - [`LbfgsOptimizer`]: bounded L-BFGS minimization behind the
//!   [`ObjectiveFunction`] interface
//! - [`fit_curve`]: chi-square fit of any [`ds_core::CurveModel`] against a
//!   histogram range, with numerical-Hessian covariance
//! - Simpson integration and covariance-propagated integral uncertainties

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Chi-square curve fitting against histograms.
pub mod engine;
/// Uniform-binning 1-D histogram.
pub mod histogram;
/// Numerical integration helpers.
pub mod integrate;
/// Bounded L-BFGS minimization.
pub mod optimizer;

pub use engine::{fit_curve, FitOptions, Weighting};
pub use histogram::Histogram;
pub use integrate::{integral_error, simpson_integral};
pub use optimizer::{LbfgsOptimizer, ObjectiveFunction, OptimizationResult, OptimizerConfig};
