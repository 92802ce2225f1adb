//! Constrained weight optimization.
//!
//! Finds weights that extremize an [`Objective`] subject to
//!
//! ```text
//! sum(w) = 1
//! min_weight <= w_i <= max_weight   for every asset
//! ```
//!
//! The solver is a local SQP method (see [`sqp`]); with the ratio objective,
//! which need not be convex, the result can depend on the initial weights.

pub mod qp;
pub mod sqp;

use serde::{Deserialize, Serialize};

use nalgebra::DVector;

use crate::error::{PortfolioError, Result};
use crate::portfolio::{PortfolioState, Snapshot};
use qp::{project_onto_simplex, QpSettings};
use sqp::{loss_and_gradient, minimize, SqpSettings};

/// Slack used when deciding whether bounds admit a point on the simplex.
const BOUNDS_SLACK: f64 = 1e-12;

/// What the optimizer should extremize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Maximize `(return - rf) / volatility`.
    #[default]
    MaximizeRatio,
    /// Minimize annualized volatility.
    MinimizeVolatility,
}

/// Per-asset weight bounds, shared by every asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bounds {
    pub min_weight: f64,
    pub max_weight: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Bounds {
            min_weight: 0.0,
            max_weight: 1.0,
        }
    }
}

impl Bounds {
    pub fn new(min_weight: f64, max_weight: f64) -> Self {
        Bounds {
            min_weight,
            max_weight,
        }
    }

    /// Check that some weight vector on the simplex lies within the bounds.
    pub fn check(&self, num_assets: usize) -> Result<()> {
        let n = num_assets as f64;
        let infeasible = num_assets == 0
            || !self.min_weight.is_finite()
            || !self.max_weight.is_finite()
            || self.min_weight > self.max_weight
            || self.min_weight * n > 1.0 + BOUNDS_SLACK
            || self.max_weight * n < 1.0 - BOUNDS_SLACK;
        if infeasible {
            return Err(PortfolioError::InfeasibleBounds {
                min_weight: self.min_weight,
                max_weight: self.max_weight,
                num_assets,
            });
        }
        Ok(())
    }

    /// The only feasible point, when the bounds leave exactly one.
    fn unique_point(&self, num_assets: usize) -> Option<Vec<f64>> {
        let n = num_assets as f64;
        if num_assets == 1 {
            Some(vec![1.0])
        } else if (self.min_weight * n - 1.0).abs() <= BOUNDS_SLACK {
            Some(vec![self.min_weight; num_assets])
        } else if (self.max_weight * n - 1.0).abs() <= BOUNDS_SLACK {
            Some(vec![self.max_weight; num_assets])
        } else {
            None
        }
    }

    fn contains(&self, weights: &DVector<f64>) -> bool {
        (weights.sum() - 1.0).abs() <= BOUNDS_SLACK
            && weights
                .iter()
                .all(|&w| w >= self.min_weight && w <= self.max_weight)
    }
}

/// Optimizer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    /// Maximum SQP iterations.
    pub max_iter: u32,
    /// Stopping tolerance on step length, directional derivative and loss change.
    pub tol: f64,
    /// Print Clarabel output for every QP subproblem.
    pub verbose: bool,
    /// Maximum interior-point iterations per QP subproblem.
    pub qp_max_iter: u32,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        OptimizerSettings {
            max_iter: 100,
            tol: 1e-8,
            verbose: false,
            qp_max_iter: 200,
        }
    }
}

impl OptimizerSettings {
    fn qp(&self) -> QpSettings {
        QpSettings {
            verbose: self.verbose,
            max_iter: self.qp_max_iter,
            ..QpSettings::default()
        }
    }
}

/// Result of an optimization.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizeResult {
    pub objective: Objective,
    /// Optimal weights; feasible up to solver tolerance.
    pub weights: Vec<f64>,
    /// Metrics at the optimal weights.
    pub snapshot: Snapshot,
    /// SQP iterations performed.
    pub iterations: u32,
    /// Whether a stopping criterion was met before the iteration limit.
    pub converged: bool,
}

impl OptimizeResult {
    /// Sum of the weights, for re-checking the simplex constraint.
    pub fn weight_sum(&self) -> f64 {
        self.weights.iter().sum()
    }
}

/// Local constrained optimizer over portfolio weights.
#[derive(Debug, Clone, Default)]
pub struct ConstrainedOptimizer {
    settings: OptimizerSettings,
}

impl ConstrainedOptimizer {
    pub fn new(settings: OptimizerSettings) -> Self {
        ConstrainedOptimizer { settings }
    }

    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }

    /// Optimize the weights of `state`, starting from `initial`.
    ///
    /// On success `state` holds the optimal weights. Candidates are evaluated
    /// with the pure metrics function, so `state` is only written once.
    #[tracing::instrument(skip_all, fields(objective = ?objective, assets = state.num_assets()))]
    pub fn optimize(
        &self,
        state: &mut PortfolioState,
        initial: &[f64],
        bounds: Bounds,
        objective: Objective,
    ) -> Result<OptimizeResult> {
        let n = state.num_assets();
        if initial.len() != n {
            return Err(PortfolioError::dimension("initial weights", n, initial.len()));
        }
        bounds.check(n)?;

        if let Some(point) = bounds.unique_point(n) {
            let snapshot = state.set_weights(&point)?.clone();
            return Ok(OptimizeResult {
                objective,
                weights: point,
                snapshot,
                iterations: 0,
                converged: true,
            });
        }

        let qp_settings = self.settings.qp();
        let start = DVector::from_column_slice(initial);
        let start = if bounds.contains(&start) {
            start
        } else {
            project_onto_simplex(&start, &bounds, &qp_settings)?
        };

        let returns = state.returns().clone();
        let risk_free_rate = state.risk_free_rate();

        let first = loss_and_gradient(&start, &returns, risk_free_rate, objective);
        if objective == Objective::MaximizeRatio && first.loss == sqp::ZERO_VOLATILITY_LOSS {
            tracing::warn!("initial weights have zero volatility");
        }

        let sqp_settings = SqpSettings {
            max_iter: self.settings.max_iter,
            tol: self.settings.tol,
            qp: qp_settings,
        };
        let outcome = minimize(start, &bounds, &sqp_settings, |w| {
            loss_and_gradient(w, &returns, risk_free_rate, objective)
        })?;

        if !outcome.converged {
            tracing::warn!(
                iterations = outcome.iterations,
                loss = outcome.loss,
                "optimizer stopped before converging"
            );
        }

        let weights: Vec<f64> = outcome.x.iter().copied().collect();
        let snapshot = state.set_weights(&weights)?.clone();

        tracing::info!(
            iterations = outcome.iterations,
            converged = outcome.converged,
            ratio = snapshot.ratio,
            volatility = snapshot.volatility,
            "optimization finished"
        );

        Ok(OptimizeResult {
            objective,
            weights,
            snapshot,
            iterations: outcome.iterations,
            converged: outcome.converged,
        })
    }
}
