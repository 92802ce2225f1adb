//! End-to-end tests: prices through return series into portfolio metrics.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use meanvar::prelude::*;
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Tolerance for hand-computed values
const TOL: f64 = 1e-9;

/// Geometric random walks with per-asset daily drift and scale.
fn synthetic_prices(params: &[(&str, f64, f64)], days: usize, seed: u64) -> PriceTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let dates = (0..days).map(|i| start + Duration::days(i as i64)).collect();

    let columns: Vec<(String, Vec<f64>)> = params
        .iter()
        .map(|&(name, drift, scale)| {
            let mut price = 100.0;
            let mut column = Vec::with_capacity(days);
            for _ in 0..days {
                column.push(price);
                let shock = rng.gen::<f64>() - 0.5;
                price *= (drift + scale * shock).exp();
            }
            (name.to_string(), column)
        })
        .collect();

    PriceTable::new(dates, columns).unwrap()
}

fn scenario_series() -> Arc<ReturnSeries> {
    Arc::new(
        ReturnSeries::from_moments(
            vec!["A".into(), "B".into()],
            DVector::from_vec(vec![0.001, 0.0005]),
            DMatrix::from_row_slice(2, 2, &[0.0004, 0.0001, 0.0001, 0.0009]),
        )
        .unwrap(),
    )
}

#[test]
fn test_two_asset_hand_computed() {
    let state = PortfolioState::new(&[0.5, 0.5], scenario_series(), 0.02).unwrap();
    let snap = state.snapshot();

    // 252 * (0.001 * 0.5 + 0.0005 * 0.5)
    let expected_return = 0.189;
    // 252 * (0.25 * 0.0004 + 2 * 0.25 * 0.0001 + 0.25 * 0.0009)
    let variance = 252.0 * 0.000375;
    let volatility = f64::sqrt(variance);

    assert!((snap.expected_return - expected_return).abs() < TOL);
    assert!((snap.volatility - volatility).abs() < TOL);
    assert!(
        (snap.ratio - (expected_return - 0.02) / volatility).abs() < TOL,
        "ratio {}",
        snap.ratio
    );
}

#[test]
fn test_volatility_nonnegative_on_simplex() {
    let prices = synthetic_prices(
        &[("SPY", 0.0004, 0.02), ("BND", 0.0001, 0.006), ("GLD", 0.0002, 0.015)],
        120,
        1,
    );
    let returns = Arc::new(ReturnSeries::from_prices(&prices).unwrap());
    let mut state = PortfolioState::uniform(returns, 0.045).unwrap();

    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..200 {
        let weights = meanvar::montecarlo::draw_weights(&mut rng, 3);
        let snap = state.set_weights(&weights).unwrap();
        assert!(snap.volatility >= 0.0);
    }
}

#[test]
fn test_prices_to_metrics_pipeline() {
    let prices = synthetic_prices(&[("QQQ", 0.0005, 0.03), ("VTI", 0.0003, 0.02)], 60, 5);
    let returns = ReturnSeries::from_prices(&prices).unwrap();
    assert_eq!(returns.log_returns().nrows(), 59);
    assert_eq!(returns.dates().len(), 59);
    assert_eq!(returns.assets(), prices.assets());

    let returns = Arc::new(returns);
    let state = PortfolioState::new(&[1.0, 0.0], returns.clone(), 0.0).unwrap();
    let mean_qqq = returns.log_returns().column(0).mean();
    assert!((state.expected_return() - 252.0 * mean_qqq).abs() < 1e-12);
    assert!(
        (state.volatility() - (252.0 * returns.covariance()[(0, 0)]).sqrt()).abs() < 1e-12
    );
}

#[test]
fn test_set_weights_idempotent() {
    let mut state = PortfolioState::uniform(scenario_series(), 0.01).unwrap();
    let a = state.set_weights(&[0.7, 0.3]).unwrap().clone();
    let b = state.set_weights(&[0.7, 0.3]).unwrap().clone();
    assert_eq!(a, b);
}

#[test]
fn test_unvalidated_direct_assignment() {
    // Weights off the simplex are accepted as-is.
    let mut state = PortfolioState::uniform(scenario_series(), 0.0).unwrap();
    let snap = state.set_weights(&[1.5, -0.5]).unwrap();
    assert!((snap.expected_return - 252.0 * (0.0015 - 0.00025)).abs() < TOL);
}

#[test]
fn test_insufficient_prices() {
    let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let prices = PriceTable::new(vec![start], [("ONLY", vec![10.0])]).unwrap();
    assert!(matches!(
        ReturnSeries::from_prices(&prices),
        Err(PortfolioError::InsufficientData { observations: 1, .. })
    ));
}

#[test]
fn test_error_reports_offending_values() {
    let err = PortfolioState::new(&[1.0, 0.0, 0.0], scenario_series(), 0.0).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("expected 2") && msg.contains("got 3"), "{}", msg);
}
