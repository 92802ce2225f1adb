//! Error types for meanvar.

use thiserror::Error;

/// Error type for meanvar operations.
#[derive(Debug, Error)]
pub enum PortfolioError {
    /// Too few observations to compute a covariance.
    #[error("Insufficient data for asset '{asset}': {observations} observation(s), need at least 2")]
    InsufficientData { asset: String, observations: usize },

    /// A vector or table has the wrong length.
    #[error("Dimension mismatch for {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        got: usize,
    },

    /// Portfolio volatility is exactly zero, so the ratio is undefined.
    #[error("Division by zero: portfolio volatility is zero, risk-adjusted ratio is undefined")]
    DivisionByZero,

    /// Box constraints cannot satisfy `sum(w) = 1`.
    #[error(
        "Infeasible bounds: [{min_weight}, {max_weight}] for {num_assets} asset(s) cannot sum to 1"
    )]
    InfeasibleBounds {
        min_weight: f64,
        max_weight: f64,
        num_assets: usize,
    },

    /// A best-point query had no candidate rows.
    #[error("No feasible sample{}", risk_suffix(.max_risk))]
    NoFeasibleSample { max_risk: Option<f64> },

    /// A price that cannot enter a log-return.
    #[error("Invalid price for asset '{asset}' at row {row}: {price}")]
    InvalidPrice { asset: String, row: usize, price: f64 },

    /// Date index is not strictly increasing.
    #[error("Dates are not strictly increasing at row {row}")]
    UnsortedDates { row: usize },

    /// The same asset identifier appears twice.
    #[error("Duplicate asset identifier: {0}")]
    DuplicateAsset(String),

    /// QP solver error.
    #[error("Solver error: {0}")]
    SolverError(String),

    /// Numerical error.
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PortfolioError {
    pub(crate) fn dimension(what: impl Into<String>, expected: usize, got: usize) -> Self {
        PortfolioError::DimensionMismatch {
            what: what.into(),
            expected,
            got,
        }
    }
}

fn risk_suffix(max_risk: &Option<f64>) -> String {
    match max_risk {
        Some(r) => format!(" with volatility <= {r}"),
        None => String::new(),
    }
}

/// Result type for meanvar operations.
pub type Result<T> = std::result::Result<T, PortfolioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_values() {
        let err = PortfolioError::InfeasibleBounds {
            min_weight: 0.5,
            max_weight: 1.0,
            num_assets: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("0.5") && msg.contains("3 asset"), "{}", msg);

        let err = PortfolioError::NoFeasibleSample { max_risk: Some(0.1) };
        assert!(err.to_string().contains("<= 0.1"));
        let err = PortfolioError::NoFeasibleSample { max_risk: None };
        assert_eq!(err.to_string(), "No feasible sample");
    }
}
