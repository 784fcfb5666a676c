//! # ds-chain
//!
//! The decay-chain half of DecayStat:
//! - [`DecayChainModel`]: analytic mother → daughter → n-daughter →
//!   2n-daughter activity model (Bateman solution with 1n/2n branching and a
//!   flat background), fit against decay-time histograms
//! - sub-activity decomposition with reduced covariance sub-matrices
//! - flat-text fit-parameter reports with derived half-lives
//! - [`LiteratureDb`]: half-life / branching lookups keyed by (Z, N)

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Decay-chain activity model and sub-activity decomposition.
pub mod activity;
/// Literature half-life and branching database.
pub mod literature;
/// Flat-text fit-parameter reports.
pub mod report;

pub use activity::{
    ActivityComponent, ChainParam, ChainSpec, DecayChainModel, HalflifeGuess,
    LiteratureOverrides, SubActivity, SubActivityOptions, SubActivityParam, N_CHAIN_PARAMS,
    PAR_A0, PAR_BACKGROUND, PAR_LAMBDA_2N_DAUGHTER, PAR_LAMBDA_DAUGHTER, PAR_LAMBDA_MOTHER,
    PAR_LAMBDA_N_DAUGHTER, PAR_P_2N, PAR_P_N,
};
pub use literature::{BranchingRecord, LiteratureDb, NuclideRecord};
