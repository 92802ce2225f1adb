//! Pure portfolio metrics.
//!
//! Every place that turns weights into return, volatility and ratio goes
//! through [`evaluate`]; nothing here touches shared state.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::data::ReturnSeries;
use crate::error::{PortfolioError, Result};

/// Trading days per year, used to annualize daily mean and variance.
pub const TRADING_DAYS: f64 = 252.0;

/// Annualized metrics of one weight vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// `252 * mean · w`
    pub expected_return: f64,
    /// `sqrt(252 * w' Σ w)`
    pub volatility: f64,
    /// `(expected_return - rf) / volatility`
    pub ratio: f64,
}

/// Annualized expected return and volatility.
///
/// Variance below zero can only come from round-off and is clamped to zero.
pub fn moments(weights: &DVector<f64>, returns: &ReturnSeries) -> (f64, f64) {
    let expected_return = TRADING_DAYS * returns.mean().dot(weights);
    let variance = TRADING_DAYS * weights.dot(&(returns.covariance() * weights));
    (expected_return, variance.max(0.0).sqrt())
}

/// Risk-adjusted ratio, failing on exactly zero volatility.
pub fn sharpe_ratio(expected_return: f64, volatility: f64, risk_free_rate: f64) -> Result<f64> {
    if volatility == 0.0 {
        return Err(PortfolioError::DivisionByZero);
    }
    Ok((expected_return - risk_free_rate) / volatility)
}

/// Evaluate a weight vector.
pub fn evaluate(
    weights: &DVector<f64>,
    returns: &ReturnSeries,
    risk_free_rate: f64,
) -> Result<Metrics> {
    if weights.len() != returns.num_assets() {
        return Err(PortfolioError::dimension(
            "weight vector",
            returns.num_assets(),
            weights.len(),
        ));
    }
    let (expected_return, volatility) = moments(weights, returns);
    let ratio = sharpe_ratio(expected_return, volatility, risk_free_rate)?;
    Ok(Metrics {
        expected_return,
        volatility,
        ratio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    fn two_assets() -> ReturnSeries {
        ReturnSeries::from_moments(
            vec!["A".into(), "B".into()],
            DVector::from_vec(vec![0.001, 0.0005]),
            DMatrix::from_row_slice(2, 2, &[0.0004, 0.0001, 0.0001, 0.0009]),
        )
        .unwrap()
    }

    #[test]
    fn test_evaluate_hand_values() {
        let series = two_assets();
        let w = DVector::from_vec(vec![0.5, 0.5]);
        let m = evaluate(&w, &series, 0.02).unwrap();

        // mean · w = 0.00075, w' Σ w = 0.25 * (0.0004 + 2 * 0.0001 + 0.0009) = 0.000375
        let ret = 252.0 * 0.00075;
        let vol = (252.0 * 0.000375f64).sqrt();
        assert!((m.expected_return - ret).abs() < 1e-9);
        assert!((m.volatility - vol).abs() < 1e-9);
        assert!((m.ratio - (ret - 0.02) / vol).abs() < 1e-9);
    }

    #[test]
    fn test_zero_volatility() {
        let series = ReturnSeries::from_moments(
            vec!["CASH".into()],
            DVector::from_vec(vec![0.0001]),
            DMatrix::zeros(1, 1),
        )
        .unwrap();
        let w = DVector::from_vec(vec![1.0]);
        assert!(matches!(
            evaluate(&w, &series, 0.01),
            Err(PortfolioError::DivisionByZero)
        ));
        let (_, vol) = moments(&w, &series);
        assert_eq!(vol, 0.0);
    }

    #[test]
    fn test_wrong_length() {
        let series = two_assets();
        let w = DVector::from_vec(vec![1.0]);
        assert!(matches!(
            evaluate(&w, &series, 0.0),
            Err(PortfolioError::DimensionMismatch { expected: 2, got: 1, .. })
        ));
    }
}
