//! Bounded minimization via L-BFGS.
//!
//! Box constraints are handled by clamping trial points to the bounds and
//! zeroing gradient components that point outside an active bound, which
//! keeps the line search from stepping repeatedly into the clamped region.

use argmin::core::{CostFunction, Executor, Gradient, State, TerminationReason, TerminationStatus};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use ds_core::{Error, Result};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Configuration for the L-BFGS minimizer.
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Maximum number of iterations
    pub max_iter: u64,
    /// Convergence tolerance on the gradient norm
    pub tol: f64,
    /// Number of corrections kept for the inverse-Hessian approximation
    pub memory: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self { max_iter: 1000, tol: 1e-6, memory: 10 }
    }
}

/// Result of one minimization.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Best-fit parameters
    pub parameters: Vec<f64>,
    /// Objective value at the minimum
    pub fval: f64,
    /// Number of iterations
    pub n_iter: u64,
    /// Number of objective evaluations
    pub n_fev: usize,
    /// Number of gradient evaluations
    pub n_gev: usize,
    /// Convergence status
    pub converged: bool,
    /// Termination message
    pub message: String,
}

impl fmt::Display for OptimizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OptimizationResult(fval={:.6}, n_iter={}, n_fev={}, n_gev={}, converged={})",
            self.fval, self.n_iter, self.n_fev, self.n_gev, self.converged
        )
    }
}

/// Objective function minimized by [`LbfgsOptimizer`].
pub trait ObjectiveFunction: Send + Sync {
    /// Evaluate the objective at the given parameters.
    fn eval(&self, params: &[f64]) -> Result<f64>;

    /// Gradient at the given parameters; central differences unless overridden.
    fn gradient(&self, params: &[f64]) -> Result<Vec<f64>> {
        let n = params.len();
        let mut grad = vec![0.0; n];
        for i in 0..n {
            let eps = 1e-8 * params[i].abs().max(1.0);

            let mut plus = params.to_vec();
            plus[i] += eps;
            let f_plus = self.eval(&plus)?;

            let mut minus = params.to_vec();
            minus[i] -= eps;
            let f_minus = self.eval(&minus)?;

            grad[i] = (f_plus - f_minus) / (2.0 * eps);
        }
        Ok(grad)
    }
}

fn clamp_to_bounds(params: &[f64], bounds: &[(f64, f64)]) -> Vec<f64> {
    params.iter().zip(bounds.iter()).map(|(&v, &(lo, hi))| v.clamp(lo, hi)).collect()
}

#[derive(Default)]
struct EvalCounts {
    cost: AtomicUsize,
    grad: AtomicUsize,
}

struct BoundedProblem<'a> {
    objective: &'a dyn ObjectiveFunction,
    bounds: &'a [(f64, f64)],
    counts: Arc<EvalCounts>,
}

impl CostFunction for BoundedProblem<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
        self.counts.cost.fetch_add(1, Ordering::Relaxed);
        let clamped = clamp_to_bounds(params, self.bounds);
        self.objective.eval(&clamped).map_err(|e| argmin::core::Error::msg(e.to_string()))
    }
}

impl Gradient for BoundedProblem<'_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(
        &self,
        params: &Self::Param,
    ) -> std::result::Result<Self::Gradient, argmin::core::Error> {
        self.counts.grad.fetch_add(1, Ordering::Relaxed);
        let clamped = clamp_to_bounds(params, self.bounds);
        let mut g = self
            .objective
            .gradient(&clamped)
            .map_err(|e| argmin::core::Error::msg(e.to_string()))?;

        // At an active bound, drop the gradient component pointing outside.
        const EPS: f64 = 1e-12;
        for (i, (&x, &(lo, hi))) in clamped.iter().zip(self.bounds.iter()).enumerate() {
            if x <= lo + EPS && g[i] > 0.0 {
                g[i] = 0.0;
            }
            if x >= hi - EPS && g[i] < 0.0 {
                g[i] = 0.0;
            }
        }
        Ok(g)
    }
}

/// L-BFGS minimizer with box constraints.
pub struct LbfgsOptimizer {
    config: OptimizerConfig,
}

impl LbfgsOptimizer {
    /// Create a minimizer with the given configuration.
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Minimize `objective` from `init_params` within `bounds`.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] on mismatched input lengths or a rejected
    /// solver configuration; [`Error::NumericGuard`] when the solver run
    /// itself fails.
    pub fn minimize(
        &self,
        objective: &dyn ObjectiveFunction,
        init_params: &[f64],
        bounds: &[(f64, f64)],
    ) -> Result<OptimizationResult> {
        if init_params.len() != bounds.len() {
            return Err(Error::InvalidArgument(format!(
                "parameter and bounds length mismatch: {} != {}",
                init_params.len(),
                bounds.len()
            )));
        }

        let init_clamped = clamp_to_bounds(init_params, bounds);
        let counts = Arc::new(EvalCounts::default());
        let problem = BoundedProblem { objective, bounds, counts: counts.clone() };

        let linesearch = MoreThuenteLineSearch::new();
        // Argmin's default cost tolerance is near machine epsilon; relax it
        // relative to the gradient tolerance so large chi-square scales do
        // not terminate on max-iter instead.
        let tol_cost =
            if self.config.tol == 0.0 { 0.0 } else { (0.1 * self.config.tol).max(1e-12) };
        let solver = LBFGS::new(linesearch, self.config.memory)
            .with_tolerance_grad(self.config.tol)
            .map_err(|e| Error::InvalidArgument(format!("invalid optimizer tolerance: {e}")))?
            .with_tolerance_cost(tol_cost)
            .map_err(|e| Error::InvalidArgument(format!("invalid cost tolerance: {e}")))?;

        let res = Executor::new(problem, solver)
            .configure(|state| state.param(init_clamped).max_iters(self.config.max_iter))
            .run()
            .map_err(|e| Error::NumericGuard(format!("optimization failed: {e}")))?;

        let state = res.state();
        let best = state
            .get_best_param()
            .ok_or_else(|| Error::NumericGuard("optimizer produced no parameters".into()))?
            .clone();
        let parameters = clamp_to_bounds(&best, bounds);
        let termination = state.get_termination_status();
        let converged = matches!(
            termination,
            TerminationStatus::Terminated(TerminationReason::SolverConverged)
                | TerminationStatus::Terminated(TerminationReason::TargetCostReached)
        );

        Ok(OptimizationResult {
            parameters,
            fval: state.get_best_cost(),
            n_iter: state.get_iter(),
            n_fev: counts.cost.load(Ordering::Relaxed),
            n_gev: counts.grad.load(Ordering::Relaxed),
            converged,
            message: termination.to_string(),
        })
    }
}

impl Default for LbfgsOptimizer {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // f(x, y) = (x - 2)^2 + (y - 3)^2, minimum at (2, 3)
    struct Paraboloid;

    impl ObjectiveFunction for Paraboloid {
        fn eval(&self, params: &[f64]) -> Result<f64> {
            Ok((params[0] - 2.0).powi(2) + (params[1] - 3.0).powi(2))
        }

        fn gradient(&self, params: &[f64]) -> Result<Vec<f64>> {
            Ok(vec![2.0 * (params[0] - 2.0), 2.0 * (params[1] - 3.0)])
        }
    }

    #[test]
    fn paraboloid_minimum() {
        let optimizer = LbfgsOptimizer::default();
        let result = optimizer
            .minimize(&Paraboloid, &[0.0, 0.0], &[(-10.0, 10.0), (-10.0, 10.0)])
            .unwrap();
        assert!(result.converged);
        assert_relative_eq!(result.parameters[0], 2.0, epsilon = 1e-4);
        assert_relative_eq!(result.parameters[1], 3.0, epsilon = 1e-4);
        assert!(result.fval < 1e-6);
    }

    #[test]
    fn bound_holds_minimum_outside() {
        // unconstrained minimum at x = 2 sits outside the box [−1, 1]
        let optimizer = LbfgsOptimizer::default();
        let result =
            optimizer.minimize(&Paraboloid, &[0.0, 0.0], &[(-1.0, 1.0), (-10.0, 10.0)]).unwrap();
        assert_relative_eq!(result.parameters[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(result.parameters[1], 3.0, epsilon = 1e-4);
    }

    #[test]
    fn numerical_gradient_fallback() {
        struct NoGrad;
        impl ObjectiveFunction for NoGrad {
            fn eval(&self, params: &[f64]) -> Result<f64> {
                Ok((params[0] - 1.5).powi(2))
            }
        }
        let result = LbfgsOptimizer::default()
            .minimize(&NoGrad, &[0.0], &[(-10.0, 10.0)])
            .unwrap();
        assert_relative_eq!(result.parameters[0], 1.5, epsilon = 1e-4);
    }

    #[test]
    fn mismatched_bounds_rejected() {
        let result = LbfgsOptimizer::default().minimize(&Paraboloid, &[0.0, 0.0], &[(0.0, 1.0)]);
        assert!(result.is_err());
    }
}
