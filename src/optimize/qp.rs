//! Clarabel solver integration.
//!
//! Every quadratic program in this crate has the same feasible set, the
//! bounded simplex `{ x : sum(x) = 1, lb <= x_i <= ub }`. In Clarabel form
//! (`Ax + s = b`, `s` in a cone) that is one zero-cone row followed by `2n`
//! nonnegative rows.

use clarabel::algebra::CscMatrix as ClarabelCsc;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use nalgebra::{DMatrix, DVector};

use super::Bounds;
use crate::error::{PortfolioError, Result};
use crate::sparse::{csc_from_triplets, dense_upper_to_csc};

/// Outcome status of a QP solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QpStatus {
    /// Optimal (or nearly optimal) solution found.
    Optimal,
    /// Problem is infeasible.
    Infeasible,
    /// Problem is unbounded.
    Unbounded,
    /// Maximum iterations or time reached.
    MaxIterations,
    /// Numerical difficulties.
    NumericalError,
    /// Unknown status.
    Unknown,
}

impl From<SolverStatus> for QpStatus {
    fn from(status: SolverStatus) -> Self {
        match status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => QpStatus::Optimal,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                QpStatus::Infeasible
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                QpStatus::Unbounded
            }
            SolverStatus::MaxIterations | SolverStatus::MaxTime => QpStatus::MaxIterations,
            SolverStatus::NumericalError | SolverStatus::InsufficientProgress => {
                QpStatus::NumericalError
            }
            _ => QpStatus::Unknown,
        }
    }
}

/// Settings for a single QP solve.
#[derive(Debug, Clone)]
pub struct QpSettings {
    /// Print Clarabel's iteration log.
    pub verbose: bool,
    /// Maximum interior-point iterations.
    pub max_iter: u32,
    /// Absolute and relative duality-gap tolerance.
    pub tol: f64,
}

impl Default for QpSettings {
    fn default() -> Self {
        QpSettings {
            verbose: false,
            max_iter: 200,
            tol: 1e-10,
        }
    }
}

/// Solve `min ½ x'Px + q'x` over the bounded simplex.
///
/// `p` must be symmetric positive semidefinite; only its upper triangle is read.
pub fn solve_simplex_qp(
    p: &DMatrix<f64>,
    q: &DVector<f64>,
    bounds: &Bounds,
    settings: &QpSettings,
) -> Result<DVector<f64>> {
    let n = q.len();
    if p.shape() != (n, n) {
        return Err(PortfolioError::dimension("QP cost matrix", n, p.nrows()));
    }

    let p_csc = to_clarabel_csc(&dense_upper_to_csc(p));
    let (a, b) = simplex_constraints(n, bounds);
    let a_csc = to_clarabel_csc(&a);
    let cones = [
        SupportedConeT::ZeroConeT(1),
        SupportedConeT::NonnegativeConeT(2 * n),
    ];

    let clarabel_settings = DefaultSettingsBuilder::default()
        .verbose(settings.verbose)
        .max_iter(settings.max_iter)
        .tol_gap_abs(settings.tol)
        .tol_gap_rel(settings.tol)
        .build()
        .map_err(|e| PortfolioError::SolverError(e.to_string()))?;

    let mut solver = DefaultSolver::new(&p_csc, q.as_slice(), &a_csc, &b, &cones, clarabel_settings);
    solver.solve();

    match QpStatus::from(solver.solution.status) {
        QpStatus::Optimal => Ok(DVector::from_column_slice(&solver.solution.x)),
        QpStatus::Infeasible => Err(PortfolioError::SolverError(
            "QP subproblem is infeasible".into(),
        )),
        QpStatus::Unbounded => Err(PortfolioError::SolverError(
            "QP subproblem is unbounded".into(),
        )),
        QpStatus::MaxIterations => Err(PortfolioError::SolverError(
            "QP subproblem reached its iteration limit".into(),
        )),
        QpStatus::NumericalError => Err(PortfolioError::NumericalError(
            "QP solver encountered numerical difficulties".into(),
        )),
        QpStatus::Unknown => Err(PortfolioError::SolverError(format!(
            "QP solver returned status {:?}",
            solver.solution.status
        ))),
    }
}

/// Euclidean projection of `point` onto the bounded simplex.
pub fn project_onto_simplex(
    point: &DVector<f64>,
    bounds: &Bounds,
    settings: &QpSettings,
) -> Result<DVector<f64>> {
    let n = point.len();
    solve_simplex_qp(&DMatrix::identity(n, n), &(-point), bounds, settings)
}

/// Constraint rows: `sum(x) = 1`, then `x <= ub`, then `-x <= -lb`.
fn simplex_constraints(n: usize, bounds: &Bounds) -> (nalgebra_sparse::CscMatrix<f64>, Vec<f64>) {
    let sum_row = (0..n).map(|j| (0, j, 1.0));
    let upper_rows = (0..n).map(|j| (1 + j, j, 1.0));
    let lower_rows = (0..n).map(|j| (1 + n + j, j, -1.0));
    let a = csc_from_triplets(1 + 2 * n, n, sum_row.chain(upper_rows).chain(lower_rows));

    let mut b = Vec::with_capacity(1 + 2 * n);
    b.push(1.0);
    b.extend(std::iter::repeat(bounds.max_weight).take(n));
    b.extend(std::iter::repeat(-bounds.min_weight).take(n));

    (a, b)
}

/// Convert nalgebra CSC to Clarabel CSC.
fn to_clarabel_csc(m: &nalgebra_sparse::CscMatrix<f64>) -> ClarabelCsc<f64> {
    ClarabelCsc::new(
        m.nrows(),
        m.ncols(),
        m.col_offsets().to_vec(),
        m.row_indices().to_vec(),
        m.values().to_vec(),
    )
}
