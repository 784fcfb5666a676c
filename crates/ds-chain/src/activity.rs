//! Multi-generation beta-decay activity model.
//!
//! One isotope's chain: the mother nucleus beta-decays with rate λm; each
//! decay feeds the beta daughter, the one-neutron daughter (probability
//! `P_n`) or the two-neutron daughter (probability `P_2n`), each of which
//! beta-decays in turn. The four activities are the closed-form solution of
//! the chain's rate equations, summed on top of a flat background.

use crate::literature::LiteratureDb;
use ds_core::{CurveModel, Error, FitReport, Result};
use ds_fit::{fit_curve, simpson_integral, FitOptions, Histogram};
use nalgebra::DMatrix;
use std::fmt;
use std::sync::Arc;

/// Parameter index: initial mother population `A0`.
pub const PAR_A0: usize = 0;
/// Parameter index: flat background rate.
pub const PAR_BACKGROUND: usize = 1;
/// Parameter index: one-neutron branching probability.
pub const PAR_P_N: usize = 2;
/// Parameter index: two-neutron branching probability.
pub const PAR_P_2N: usize = 3;
/// Parameter index: mother decay constant.
pub const PAR_LAMBDA_MOTHER: usize = 4;
/// Parameter index: beta-daughter decay constant.
pub const PAR_LAMBDA_DAUGHTER: usize = 5;
/// Parameter index: one-neutron-daughter decay constant.
pub const PAR_LAMBDA_N_DAUGHTER: usize = 6;
/// Parameter index: two-neutron-daughter decay constant.
pub const PAR_LAMBDA_2N_DAUGHTER: usize = 7;
/// Number of chain parameters.
pub const N_CHAIN_PARAMS: usize = 8;

/// One additive term of the total activity.
///
/// A component is a pure function of time and the full 8-parameter vector,
/// and it declares up front which global parameter indices it reads. The
/// declared indices drive sub-activity covariance extraction, so an
/// override that reads an undeclared parameter gets a truncated covariance.
#[derive(Clone)]
pub struct ActivityComponent {
    name: String,
    param_indices: Vec<usize>,
    eval: Arc<dyn Fn(f64, &[f64]) -> f64 + Send + Sync>,
}

impl ActivityComponent {
    /// Build a component from its name, the parameter indices it reads, and
    /// its evaluation closure.
    pub fn new(
        name: impl Into<String>,
        mut param_indices: Vec<usize>,
        eval: impl Fn(f64, &[f64]) -> f64 + Send + Sync + 'static,
    ) -> Self {
        param_indices.sort_unstable();
        param_indices.dedup();
        Self { name: name.into(), param_indices, eval: Arc::new(eval) }
    }

    /// Component name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Global parameter indices this component reads.
    pub fn param_indices(&self) -> &[usize] {
        &self.param_indices
    }

    /// Evaluate the component at time `t` with the full parameter vector.
    pub fn eval(&self, t: f64, params: &[f64]) -> f64 {
        (self.eval)(t, params)
    }
}

impl fmt::Debug for ActivityComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityComponent")
            .field("name", &self.name)
            .field("param_indices", &self.param_indices)
            .finish()
    }
}

fn default_components(time_units: f64) -> [ActivityComponent; 4] {
    let tu = time_units;
    let mother = ActivityComponent::new(
        "mother",
        vec![PAR_A0, PAR_LAMBDA_MOTHER],
        move |t, p| {
            if t < 0.0 {
                return 0.0;
            }
            let lm = p[PAR_LAMBDA_MOTHER];
            p[PAR_A0] * lm * (-lm * t * tu).exp()
        },
    );
    let daughter = ActivityComponent::new(
        "daughter",
        vec![PAR_A0, PAR_P_N, PAR_P_2N, PAR_LAMBDA_MOTHER, PAR_LAMBDA_DAUGHTER],
        move |t, p| {
            if t < 0.0 {
                return 0.0;
            }
            let (lm, ld) = (p[PAR_LAMBDA_MOTHER], p[PAR_LAMBDA_DAUGHTER]);
            p[PAR_A0]
                * (1.0 - p[PAR_P_N] - p[PAR_P_2N])
                * (lm * ld / (ld - lm))
                * ((-lm * t * tu).exp() - (-ld * t * tu).exp())
        },
    );
    let n_daughter = ActivityComponent::new(
        "n_daughter",
        vec![PAR_A0, PAR_P_N, PAR_LAMBDA_MOTHER, PAR_LAMBDA_N_DAUGHTER],
        move |t, p| {
            if t < 0.0 {
                return 0.0;
            }
            let (lm, ln) = (p[PAR_LAMBDA_MOTHER], p[PAR_LAMBDA_N_DAUGHTER]);
            p[PAR_A0]
                * p[PAR_P_N]
                * (lm * ln / (ln - lm))
                * ((-lm * t * tu).exp() - (-ln * t * tu).exp())
        },
    );
    let n2_daughter = ActivityComponent::new(
        "2n_daughter",
        vec![PAR_A0, PAR_P_2N, PAR_LAMBDA_MOTHER, PAR_LAMBDA_2N_DAUGHTER],
        move |t, p| {
            if t < 0.0 {
                return 0.0;
            }
            let (lm, l2n) = (p[PAR_LAMBDA_MOTHER], p[PAR_LAMBDA_2N_DAUGHTER]);
            p[PAR_A0]
                * p[PAR_P_2N]
                * (lm * l2n / (l2n - lm))
                * ((-lm * t * tu).exp() - (-l2n * t * tu).exp())
        },
    );
    [mother, daughter, n_daughter, n2_daughter]
}

/// Initial guess for one decay constant: value, display error, fixed flag.
#[derive(Debug, Clone, Copy)]
pub struct HalflifeGuess {
    /// Decay-constant value.
    pub value: f64,
    /// Display error; carried even for fixed parameters.
    pub error: f64,
    /// Hold fixed during fits.
    pub fixed: bool,
}

impl HalflifeGuess {
    /// A constant held fixed at `value` with no display error.
    pub fn fixed(value: f64) -> Self {
        Self { value, error: 0.0, fixed: true }
    }

    /// A floating constant starting from `value`.
    pub fn floating(value: f64) -> Self {
        Self { value, error: 0.0, fixed: false }
    }

    /// Attach a display error.
    pub fn with_error(mut self, error: f64) -> Self {
        self.error = error;
        self
    }
}

/// Construction configuration for [`DecayChainModel`].
///
/// Defaults match the historical analysis conventions: a ±100 ms fit window
/// in nanoseconds, branching guesses held fixed (measured branching ratios
/// act as constants unless `p_n_as_parameter` floats them).
#[derive(Debug, Clone)]
pub struct ChainSpec {
    /// Model name, used to label sub-activities and reports.
    pub name: String,
    /// Name of the fitted function.
    pub fit_name: String,
    /// Names of the four decay-constant parameters.
    pub halflife_names: [String; 4],
    /// Initial guesses for the four decay constants
    /// (mother, daughter, n-daughter, 2n-daughter).
    pub halflife_info: [HalflifeGuess; 4],
    /// Lower edge of the fit range, native time units.
    pub fit_low: f64,
    /// Upper edge of the fit range, native time units.
    pub fit_high: f64,
    /// Starting value for `A0`.
    pub a0_start: f64,
    /// Starting value for the flat background.
    pub background: f64,
    /// One-neutron branching guess.
    pub p_n_guess: f64,
    /// Two-neutron branching guess.
    pub p_2n_guess: f64,
    /// Scale converting native time values into the units of the decay
    /// constants (1e-9 for nanosecond axes and per-second constants).
    pub time_units: f64,
    /// Float the branching probabilities instead of holding them fixed.
    pub p_n_as_parameter: bool,
    /// Fold the flat background into the total activity.
    pub include_background: bool,
    /// Hold the background fixed.
    pub fix_background: bool,
    /// Display error on the background.
    pub background_error: f64,
}

impl Default for ChainSpec {
    fn default() -> Self {
        Self {
            name: "chain".into(),
            fit_name: "chain_fit".into(),
            halflife_names: [
                "lambda_mother".into(),
                "lambda_daughter".into(),
                "lambda_n_daughter".into(),
                "lambda_2n_daughter".into(),
            ],
            halflife_info: [HalflifeGuess::floating(10.0); 4],
            fit_low: -1e8,
            fit_high: 1e8,
            a0_start: 10.0,
            background: 10.0,
            p_n_guess: 0.8,
            p_2n_guess: 0.1,
            time_units: 1e-9,
            p_n_as_parameter: false,
            include_background: true,
            fix_background: false,
            background_error: 0.0,
        }
    }
}

/// One parameter of the chain model: value, display error, fixed flag, bounds.
#[derive(Debug, Clone)]
pub struct ChainParam {
    /// Parameter name.
    pub name: String,
    /// Current value (updated by fits).
    pub value: f64,
    /// Current error (updated by fits for floating parameters; explicit
    /// display errors survive for fixed ones).
    pub error: f64,
    /// Held fixed during fits. Explicit state, never inferred from the error.
    pub fixed: bool,
    /// Box bounds applied while floating.
    pub bounds: (f64, f64),
}

/// Parameter value/error/name copied into a sub-activity.
#[derive(Debug, Clone)]
pub struct SubActivityParam {
    /// Global parameter index.
    pub index: usize,
    /// Parameter name.
    pub name: String,
    /// Value used by the sub-activity (background is zeroed when split out).
    pub value: f64,
    /// Parameter error.
    pub error: f64,
}

/// Options for [`DecayChainModel::sub_activities`].
#[derive(Debug, Clone, Copy)]
pub struct SubActivityOptions {
    /// Fold the fitted background into each component.
    pub include_background: bool,
    /// Extract reduced covariance sub-matrices.
    pub include_covariance: bool,
    /// Emit the background as its own fifth component (and zero the folded
    /// background value inside the four activity components).
    pub separate_background: bool,
}

impl Default for SubActivityOptions {
    fn default() -> Self {
        Self { include_background: true, include_covariance: true, separate_background: true }
    }
}

/// One additive component of a fitted chain, independently evaluable.
#[derive(Debug, Clone)]
pub struct SubActivity {
    name: String,
    component: ActivityComponent,
    params: Vec<f64>,
    background: f64,
    fit_low: f64,
    fit_high: f64,
    /// Global parameter indices this sub-activity depends on.
    pub param_indices: Vec<usize>,
    /// Copies of the referenced parameters' values, errors, and names.
    pub parameters: Vec<SubActivityParam>,
    /// Reduced covariance sub-matrix of rank `max(index) + 1`, with entries
    /// filled only at referenced index pairs.
    pub covariance: Option<DMatrix<f64>>,
}

impl SubActivity {
    /// Sub-activity name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fit range the sub-activity was built over.
    pub fn fit_range(&self) -> (f64, f64) {
        (self.fit_low, self.fit_high)
    }

    /// Evaluate at time `t` (native units).
    pub fn eval(&self, t: f64) -> f64 {
        self.component.eval(t, &self.params) + self.background
    }

    /// Simpson integral over `[low, high]` with the given step.
    pub fn integral(&self, low: f64, high: f64, step: f64) -> f64 {
        simpson_integral(|t| self.eval(t), low, high, step, false)
    }
}

/// The 8-parameter decay-chain model for one isotope.
#[derive(Debug, Clone)]
pub struct DecayChainModel {
    name: String,
    fit_name: String,
    params: Vec<ChainParam>,
    initial_values: [f64; N_CHAIN_PARAMS],
    initial_errors: [f64; N_CHAIN_PARAMS],
    components: [ActivityComponent; 4],
    fit_low: f64,
    fit_high: f64,
    time_units: f64,
    include_background: bool,
    last_fit: Option<FitReport>,
}

impl DecayChainModel {
    /// Build a model with the default Bateman components.
    pub fn new(spec: ChainSpec) -> Self {
        Self::with_components(spec, [None, None, None, None])
    }

    /// Build a model, overriding any of the four activity components.
    ///
    /// Overrides must keep the 8-parameter index semantics; each declares
    /// the indices it reads.
    pub fn with_components(
        spec: ChainSpec,
        overrides: [Option<ActivityComponent>; 4],
    ) -> Self {
        // invalid branching guesses silently fall back to the defaults
        let p_n = if spec.p_n_guess.is_finite() && spec.p_n_guess >= 0.0 {
            spec.p_n_guess
        } else {
            0.8
        };
        let p_2n = if spec.p_2n_guess.is_finite() && spec.p_2n_guess >= 0.0 {
            spec.p_2n_guess
        } else {
            0.1
        };

        let mut params = Vec::with_capacity(N_CHAIN_PARAMS);
        params.push(ChainParam {
            name: "A0".into(),
            value: spec.a0_start,
            error: 0.0,
            fixed: false,
            bounds: (0.0, 10000.0),
        });
        params.push(ChainParam {
            name: "Background".into(),
            value: spec.background,
            error: spec.background_error,
            // a background the total never reads must not float: the fit
            // would carry an unconstrained parameter and a singular Hessian
            fixed: spec.fix_background || !spec.include_background,
            bounds: (f64::NEG_INFINITY, f64::INFINITY),
        });
        params.push(ChainParam {
            name: "P_n".into(),
            value: p_n,
            error: 0.0,
            fixed: !spec.p_n_as_parameter,
            bounds: (0.0, 1.0),
        });
        params.push(ChainParam {
            name: "P_2n".into(),
            value: p_2n,
            error: 0.0,
            fixed: !spec.p_n_as_parameter,
            bounds: (0.0, 1.0),
        });
        for (i, guess) in spec.halflife_info.iter().enumerate() {
            params.push(ChainParam {
                name: spec.halflife_names[i].clone(),
                value: guess.value,
                error: guess.error,
                fixed: guess.fixed,
                bounds: (0.0, 2000.0),
            });
        }

        let mut initial_values = [0.0; N_CHAIN_PARAMS];
        let mut initial_errors = [0.0; N_CHAIN_PARAMS];
        for (i, p) in params.iter().enumerate() {
            initial_values[i] = p.value;
            initial_errors[i] = p.error;
        }

        let mut components = default_components(spec.time_units);
        for (slot, replacement) in overrides.into_iter().enumerate() {
            if let Some(c) = replacement {
                components[slot] = c;
            }
        }

        Self {
            name: spec.name,
            fit_name: spec.fit_name,
            params,
            initial_values,
            initial_errors,
            components,
            fit_low: spec.fit_low,
            fit_high: spec.fit_high,
            time_units: spec.time_units,
            include_background: spec.include_background,
            last_fit: None,
        }
    }

    /// Pre-populate a chain from literature values.
    ///
    /// Branching ratios and the three daughter decay constants come from the
    /// database (daughters held fixed); the mother decay constant floats
    /// from its literature value so the fit can test it.
    ///
    /// # Errors
    /// Lookup failures from the literature database propagate.
    pub fn from_literature(
        isotope: &str,
        fit_name: &str,
        fit_low: f64,
        fit_high: f64,
        overrides: LiteratureOverrides,
        time_units: f64,
        literature: &LiteratureDb,
    ) -> Result<Self> {
        let p_n = match overrides.p_n {
            Some(v) => v,
            None => literature.pn(isotope, 1)?,
        };
        let p_2n = match overrides.p_2n {
            Some(v) => v,
            None => literature.pn(isotope, 2)?,
        };
        let lambda_mother = match overrides.lambda_mother {
            Some(v) => v,
            None => literature.decay_constant(isotope)?,
        };

        let zn = LiteratureDb::parse_isotope(isotope)?;
        let daughter = LiteratureDb::isotope_name(LiteratureDb::beta_daughter(zn)?)?;
        let n_daughter = LiteratureDb::isotope_name(LiteratureDb::beta_n_daughter(zn)?)?;
        let n2_daughter = LiteratureDb::isotope_name(LiteratureDb::beta_2n_daughter(zn)?)?;

        let spec = ChainSpec {
            name: isotope.into(),
            fit_name: fit_name.into(),
            halflife_names: [
                format!("lambda_beta^{isotope}"),
                format!("lambda_beta^{daughter}"),
                format!("lambda_beta^{n_daughter}"),
                format!("lambda_beta^{n2_daughter}"),
            ],
            halflife_info: [
                // floating: the fit decides whether the literature value holds
                HalflifeGuess::floating(lambda_mother),
                HalflifeGuess::fixed(literature.decay_constant(&daughter)?),
                HalflifeGuess::fixed(literature.decay_constant(&n_daughter)?),
                HalflifeGuess::fixed(literature.decay_constant(&n2_daughter)?),
            ],
            fit_low,
            fit_high,
            a0_start: overrides.a0_start.unwrap_or(0.5),
            p_n_guess: p_n,
            p_2n_guess: p_2n,
            time_units,
            ..ChainSpec::default()
        };
        Ok(Self::new(spec))
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the fitted function.
    pub fn fit_name(&self) -> &str {
        &self.fit_name
    }

    /// Current fit range, native time units.
    pub fn fit_range(&self) -> (f64, f64) {
        (self.fit_low, self.fit_high)
    }

    /// Time-unit scale factor.
    pub fn time_units(&self) -> f64 {
        self.time_units
    }

    /// All eight parameters.
    pub fn params(&self) -> &[ChainParam] {
        &self.params
    }

    /// One parameter by global index.
    pub fn param(&self, index: usize) -> &ChainParam {
        &self.params[index]
    }

    /// The most recent fit report, if any.
    pub fn last_fit(&self) -> Option<&FitReport> {
        self.last_fit.as_ref()
    }

    /// Fit the model against a histogram.
    ///
    /// A range override becomes the stored default for later calls. The
    /// report is stored as the most recent fit and parameter values/errors
    /// are updated from it (fixed parameters keep their explicit errors).
    ///
    /// # Errors
    /// Engine failures propagate untouched.
    pub fn fit(
        &mut self,
        hist: &Histogram,
        options: &FitOptions,
        range_override: Option<(f64, f64)>,
    ) -> Result<FitReport> {
        if let Some((low, high)) = range_override {
            self.fit_low = low;
            self.fit_high = high;
        }
        let report = fit_curve(self, hist, (self.fit_low, self.fit_high), options)?;
        for (i, p) in self.params.iter_mut().enumerate() {
            if !p.fixed {
                p.value = report.parameters[i];
                p.error = report.uncertainties[i];
            }
        }
        self.last_fit = Some(report.clone());
        Ok(report)
    }

    /// Set `A0`; non-positive values are ignored (physical-domain guard).
    pub fn set_a0(&mut self, value: f64) {
        if value <= 0.0 {
            return;
        }
        self.params[PAR_A0].value = value;
        self.initial_values[PAR_A0] = value;
    }

    /// Set the background; negative values are ignored (physical-domain guard).
    pub fn set_background(&mut self, value: f64, fixed: bool) {
        if value < 0.0 {
            return;
        }
        self.params[PAR_BACKGROUND].value = value;
        self.params[PAR_BACKGROUND].fixed = fixed;
        self.initial_values[PAR_BACKGROUND] = value;
    }

    /// Set the mother decay constant, optionally with new bounds.
    pub fn set_mother_halflife(&mut self, value: f64, limits: Option<(f64, f64)>) {
        if let Some((low, high)) = limits {
            self.params[PAR_LAMBDA_MOTHER].bounds = (low, high);
        }
        self.params[PAR_LAMBDA_MOTHER].value = value;
    }

    /// Restore every parameter to its construction-time value and error.
    ///
    /// Fixed flags are explicit state and stay as they are.
    pub fn reset(&mut self) {
        for (i, p) in self.params.iter_mut().enumerate() {
            p.value = self.initial_values[i];
            p.error = self.initial_errors[i];
        }
    }

    /// Subtract the current model curve from `hist` in place, bin by bin,
    /// for bins whose centers fall inside `[low, high]`.
    pub fn residuals(&self, hist: &mut Histogram, low: f64, high: f64) {
        let values: Vec<f64> = self.params.iter().map(|p| p.value).collect();
        for bin in 0..hist.n_bins {
            let center = hist.bin_center(bin);
            if center < low || center > high {
                continue;
            }
            hist.bin_content[bin] -= self.eval(center, &values);
        }
    }

    /// Decompose the most recent fit into its additive components.
    ///
    /// Returns `None` when the model has never been fit — the historical
    /// silent no-op, kept so exploratory scripts can call this
    /// unconditionally.
    pub fn sub_activities(&self, options: SubActivityOptions) -> Option<Vec<SubActivity>> {
        let report = self.last_fit.as_ref()?;
        let fitted: Vec<f64> = report.parameters.clone();

        let mut out = Vec::with_capacity(5);
        for component in &self.components {
            let mut indices = component.param_indices().to_vec();
            if options.include_background && !indices.contains(&PAR_BACKGROUND) {
                indices.push(PAR_BACKGROUND);
                indices.sort_unstable();
            }
            log::debug!(
                "sub-activity {}{}: parameter indices {:?}",
                self.name,
                component.name(),
                indices
            );

            let covariance = if options.include_covariance {
                let rank = indices.iter().max().copied().unwrap_or(0) + 1;
                let mut cov = DMatrix::zeros(rank, rank);
                for &x in &indices {
                    for &y in &indices {
                        cov[(x, y)] = report.covariance_at(x, y).unwrap_or(0.0);
                    }
                }
                Some(cov)
            } else {
                None
            };

            let background = if options.include_background && !options.separate_background {
                fitted[PAR_BACKGROUND]
            } else {
                0.0
            };

            let parameters = indices
                .iter()
                .map(|&j| SubActivityParam {
                    index: j,
                    name: self.params[j].name.clone(),
                    value: if j == PAR_BACKGROUND && options.separate_background {
                        0.0
                    } else {
                        fitted[j]
                    },
                    error: self.params[j].error,
                })
                .collect();

            let sub = SubActivity {
                name: format!("{}{}", self.name, component.name()),
                component: component.clone(),
                params: fitted.clone(),
                background,
                fit_low: self.fit_low,
                fit_high: self.fit_high,
                param_indices: indices,
                parameters,
                covariance,
            };
            log::debug!(
                "sub-activity {} integral {}",
                sub.name,
                sub.integral(self.fit_low, self.fit_high, (self.fit_high - self.fit_low) / 256.0)
            );
            out.push(sub);
        }

        if options.separate_background {
            let value = fitted[PAR_BACKGROUND];
            let error = self.params[PAR_BACKGROUND].error;
            out.push(SubActivity {
                name: format!("{}background", self.name),
                component: ActivityComponent::new(
                    "background",
                    vec![PAR_BACKGROUND],
                    |_t, p| p[PAR_BACKGROUND],
                ),
                params: fitted.clone(),
                background: 0.0,
                fit_low: self.fit_low,
                fit_high: self.fit_high,
                param_indices: vec![PAR_BACKGROUND],
                parameters: vec![SubActivityParam {
                    index: PAR_BACKGROUND,
                    name: "Constant Background".into(),
                    value,
                    error,
                }],
                covariance: options.include_covariance.then(|| {
                    let mut cov = DMatrix::zeros(PAR_BACKGROUND + 1, PAR_BACKGROUND + 1);
                    cov[(PAR_BACKGROUND, PAR_BACKGROUND)] =
                        report.covariance_at(PAR_BACKGROUND, PAR_BACKGROUND).unwrap_or(0.0);
                    cov
                }),
            });
        }

        Some(out)
    }
}

impl CurveModel for DecayChainModel {
    fn n_parameters(&self) -> usize {
        N_CHAIN_PARAMS
    }

    fn parameter_names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name.clone()).collect()
    }

    fn parameter_init(&self) -> Vec<f64> {
        self.params.iter().map(|p| p.value).collect()
    }

    fn parameter_bounds(&self) -> Vec<(f64, f64)> {
        self.params.iter().map(|p| p.bounds).collect()
    }

    fn parameter_fixed(&self) -> Vec<bool> {
        self.params.iter().map(|p| p.fixed).collect()
    }

    fn eval(&self, t: f64, params: &[f64]) -> f64 {
        let mut total: f64 = self.components.iter().map(|c| c.eval(t, params)).sum();
        if self.include_background {
            total += params[PAR_BACKGROUND];
        }
        total
    }
}

/// Optional overrides for [`DecayChainModel::from_literature`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteratureOverrides {
    /// Override the one-neutron branching probability.
    pub p_n: Option<f64>,
    /// Override the two-neutron branching probability.
    pub p_2n: Option<f64>,
    /// Override the mother decay constant's starting value.
    pub lambda_mother: Option<f64>,
    /// Override the `A0` starting value.
    pub a0_start: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_spec() -> ChainSpec {
        ChainSpec {
            name: "test".into(),
            fit_name: "test_fit".into(),
            halflife_info: [
                HalflifeGuess::floating(7.7),
                HalflifeGuess::fixed(7.7).with_error(0.2),
                HalflifeGuess::fixed(18.0),
                HalflifeGuess::fixed(16.0),
            ],
            ..ChainSpec::default()
        }
    }

    #[test]
    fn parameter_layout() {
        let model = DecayChainModel::new(test_spec());
        let names = model.parameter_names();
        assert_eq!(names[PAR_A0], "A0");
        assert_eq!(names[PAR_BACKGROUND], "Background");
        assert_eq!(names[PAR_P_N], "P_n");
        assert_eq!(model.param(PAR_A0).bounds, (0.0, 10000.0));
        assert_eq!(model.param(PAR_LAMBDA_MOTHER).bounds, (0.0, 2000.0));
        // branching guesses are held fixed unless floated explicitly
        assert!(model.param(PAR_P_N).fixed);
        assert!(model.param(PAR_P_2N).fixed);
        assert!(!model.param(PAR_LAMBDA_MOTHER).fixed);
        assert!(model.param(PAR_LAMBDA_DAUGHTER).fixed);
        // explicit display error survives on a fixed parameter
        assert_eq!(model.param(PAR_LAMBDA_DAUGHTER).error, 0.2);
    }

    #[test]
    fn invalid_branching_guesses_fall_back() {
        let spec = ChainSpec { p_n_guess: -0.5, p_2n_guess: f64::NAN, ..test_spec() };
        let model = DecayChainModel::new(spec);
        assert_eq!(model.param(PAR_P_N).value, 0.8);
        assert_eq!(model.param(PAR_P_2N).value, 0.1);
    }

    #[test]
    fn activity_is_gated_and_background_floored() {
        let model = DecayChainModel::new(test_spec());
        let params = model.parameter_init();
        // before the implantation only background remains
        assert_relative_eq!(model.eval(-5e6, &params), params[PAR_BACKGROUND]);
        assert!(model.eval(5e6, &params) > params[PAR_BACKGROUND]);
    }

    #[test]
    fn setter_guards() {
        let mut model = DecayChainModel::new(test_spec());
        let a0 = model.param(PAR_A0).value;
        model.set_a0(-3.0);
        assert_eq!(model.param(PAR_A0).value, a0);
        model.set_a0(25.0);
        assert_eq!(model.param(PAR_A0).value, 25.0);

        let bg = model.param(PAR_BACKGROUND).value;
        model.set_background(-1.0, true);
        assert_eq!(model.param(PAR_BACKGROUND).value, bg);
        model.set_background(3.0, true);
        assert!(model.param(PAR_BACKGROUND).fixed);
        assert_eq!(model.param(PAR_BACKGROUND).value, 3.0);
    }

    #[test]
    fn reset_restores_values_but_not_flags() {
        let mut model = DecayChainModel::new(test_spec());
        let initial_a0 = model.param(PAR_A0).value;
        model.set_mother_halflife(12.0, Some((1.0, 100.0)));
        model.params[PAR_A0].value = 99.0;
        model.params[PAR_A0].error = 1.5;
        model.reset();
        assert_eq!(model.param(PAR_A0).value, initial_a0);
        assert_eq!(model.param(PAR_A0).error, 0.0);
        // reset touches values and errors only
        assert_eq!(model.param(PAR_LAMBDA_MOTHER).bounds, (1.0, 100.0));
        assert!(model.param(PAR_P_N).fixed);
    }

    #[test]
    fn sub_activities_require_a_fit() {
        let model = DecayChainModel::new(test_spec());
        assert!(model.sub_activities(SubActivityOptions::default()).is_none());
    }

    #[test]
    fn component_override_declares_indices() {
        let flat = ActivityComponent::new("flat_mother", vec![PAR_A0], |_t, p| p[PAR_A0]);
        let model = DecayChainModel::with_components(test_spec(), [Some(flat), None, None, None]);
        assert_eq!(model.components[0].param_indices(), &[PAR_A0]);
        let params = model.parameter_init();
        // the override ignores time entirely
        assert_relative_eq!(
            model.components[0].eval(1.0, &params),
            model.components[0].eval(1e6, &params)
        );
    }
}
