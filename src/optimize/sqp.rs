//! Sequential quadratic programming over the bounded simplex.
//!
//! Each iteration replaces the loss by a quadratic model (gradient plus a
//! damped-BFGS Hessian estimate), solves that model exactly over the feasible
//! set with Clarabel, and backtracks along the resulting direction. Iterates
//! stay feasible because every accepted point is a convex combination of two
//! feasible points.

use nalgebra::{DMatrix, DVector};

use super::qp::{solve_simplex_qp, QpSettings};
use super::{Bounds, Objective};
use crate::data::ReturnSeries;
use crate::error::Result;
use crate::portfolio::{moments, sharpe_ratio, TRADING_DAYS};

/// Loss assigned to a zero-volatility candidate when maximizing the ratio.
///
/// Finite so that line search comparisons stay meaningful.
pub const ZERO_VOLATILITY_LOSS: f64 = 1e10;

/// Armijo sufficient-decrease constant.
const ARMIJO: f64 = 1e-4;

/// Smallest step length tried before giving up on a direction.
const MIN_STEP: f64 = 1e-10;

/// Loss value and gradient at a point.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub loss: f64,
    pub gradient: DVector<f64>,
}

/// Loss and analytic gradient of an objective.
///
/// `MinimizeVolatility` uses `vol(w)`; `MaximizeRatio` uses `-ratio(w)`.
pub fn loss_and_gradient(
    weights: &DVector<f64>,
    returns: &ReturnSeries,
    risk_free_rate: f64,
    objective: Objective,
) -> Evaluation {
    let n = weights.len();
    let (expected_return, volatility) = moments(weights, returns);
    if volatility == 0.0 {
        let loss = match objective {
            Objective::MinimizeVolatility => 0.0,
            Objective::MaximizeRatio => ZERO_VOLATILITY_LOSS,
        };
        return Evaluation {
            loss,
            gradient: DVector::zeros(n),
        };
    }

    // d vol / dw = 252 Σw / vol
    let vol_gradient = (returns.covariance() * weights) * (TRADING_DAYS / volatility);

    match objective {
        Objective::MinimizeVolatility => Evaluation {
            loss: volatility,
            gradient: vol_gradient,
        },
        Objective::MaximizeRatio => {
            // volatility is nonzero here, so the ratio is defined.
            let ratio = sharpe_ratio(expected_return, volatility, risk_free_rate)
                .unwrap_or(-ZERO_VOLATILITY_LOSS);
            let ratio_gradient =
                (returns.mean() * TRADING_DAYS - vol_gradient * ratio) / volatility;
            Evaluation {
                loss: -ratio,
                gradient: -ratio_gradient,
            }
        }
    }
}

/// Solver limits.
#[derive(Debug, Clone)]
pub struct SqpSettings {
    pub max_iter: u32,
    pub tol: f64,
    pub qp: QpSettings,
}

/// Final iterate of an SQP run.
#[derive(Debug, Clone)]
pub struct SqpOutcome {
    pub x: DVector<f64>,
    pub loss: f64,
    pub iterations: u32,
    pub converged: bool,
}

/// Minimize `eval` over the bounded simplex starting from a feasible `x`.
pub fn minimize<F>(
    mut x: DVector<f64>,
    bounds: &Bounds,
    settings: &SqpSettings,
    mut eval: F,
) -> Result<SqpOutcome>
where
    F: FnMut(&DVector<f64>) -> Evaluation,
{
    let n = x.len();
    let mut current = eval(&x);
    let mut hessian = DMatrix::<f64>::identity(n, n);

    for iteration in 1..=settings.max_iter {
        // Model in terms of the next point y = x + d:
        // ½ d'Bd + g'd = ½ y'By + (g - Bx)'y + const
        let q = &current.gradient - &hessian * &x;
        let target = solve_simplex_qp(&hessian, &q, bounds, &settings.qp)?;
        let direction = target - &x;
        let slope = current.gradient.dot(&direction);

        if direction.norm() < settings.tol || slope > -settings.tol {
            return Ok(SqpOutcome {
                x,
                loss: current.loss,
                iterations: iteration,
                converged: true,
            });
        }

        let mut step = 1.0;
        let (next_x, next) = loop {
            let candidate = &x + &direction * step;
            let trial = eval(&candidate);
            if trial.loss <= current.loss + ARMIJO * step * slope {
                break (candidate, trial);
            }
            step *= 0.5;
            if step < MIN_STEP {
                tracing::warn!(iteration, slope, "line search found no decrease");
                return Ok(SqpOutcome {
                    x,
                    loss: current.loss,
                    iterations: iteration,
                    converged: false,
                });
            }
        };

        let s = &next_x - &x;
        let y = &next.gradient - &current.gradient;
        damped_bfgs_update(&mut hessian, &s, &y);

        let improvement = current.loss - next.loss;
        x = next_x;
        current = next;

        tracing::debug!(iteration, loss = current.loss, step, "sqp iteration");

        if improvement.abs() < settings.tol {
            return Ok(SqpOutcome {
                x,
                loss: current.loss,
                iterations: iteration,
                converged: true,
            });
        }
    }

    Ok(SqpOutcome {
        x,
        loss: current.loss,
        iterations: settings.max_iter,
        converged: false,
    })
}

/// Powell-damped BFGS update; keeps `b` symmetric positive definite.
fn damped_bfgs_update(b: &mut DMatrix<f64>, s: &DVector<f64>, y: &DVector<f64>) {
    let bs = &*b * s;
    let sbs = s.dot(&bs);
    if sbs <= f64::EPSILON {
        return;
    }
    let sy = s.dot(y);
    let theta = if sy >= 0.2 * sbs {
        1.0
    } else {
        0.8 * sbs / (sbs - sy)
    };
    let r = y * theta + &bs * (1.0 - theta);
    let sr = s.dot(&r);
    if sr <= f64::EPSILON {
        return;
    }
    *b += &r * r.transpose() / sr - &bs * bs.transpose() / sbs;
}
