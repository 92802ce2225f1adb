//! Portfolio Allocation Example
//!
//! Builds a price table for five assets, then compares:
//!
//! maximize    (return - rf) / volatility
//! minimize    volatility
//! subject to  sum(w) = 1, 0 <= w <= 1
//!
//! against the best points of a Monte Carlo search. Set `RUST_LOG=debug` to
//! see the solver iterations.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use meanvar::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Stand-in for a market-data source: one year of daily random-walk prices.
fn load_prices(tickers: &[(&str, f64, f64)]) -> Result<PriceTable> {
    let mut rng = StdRng::seed_from_u64(2024);
    let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let days = 252;
    let dates = (0..days).map(|i| start + Duration::days(i)).collect();

    let columns = tickers.iter().map(|&(ticker, drift, scale)| {
        let mut price = 100.0;
        let column = (0..days)
            .map(|_| {
                let current = price;
                price *= (drift + scale * (rng.gen::<f64>() - 0.5)).exp();
                current
            })
            .collect();
        (ticker, column)
    });

    PriceTable::new(dates, columns.collect::<Vec<_>>())
}

fn print_snapshot(label: &str, assets: &[String], snap: &Snapshot) {
    println!("{}:", label);
    for (asset, w) in assets.iter().zip(&snap.weights) {
        println!("  {:<4} {:>6.2}%", asset, w * 100.0);
    }
    println!(
        "  return {:.2}%  volatility {:.2}%  ratio {:.4}\n",
        snap.expected_return * 100.0,
        snap.volatility * 100.0,
        snap.ratio
    );
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Portfolio Allocation ===\n");

    let tickers = [
        ("SPY", 0.0005, 0.035),
        ("QQQ", 0.0007, 0.05),
        ("BND", 0.0001, 0.01),
        ("GLD", 0.0003, 0.03),
        ("VTI", 0.0005, 0.037),
    ];
    let risk_free_rate = 0.045;

    let prices = load_prices(&tickers)?;
    let returns = Arc::new(ReturnSeries::from_prices(&prices)?);
    let assets = returns.assets().to_vec();
    let mut state = PortfolioState::uniform(returns, risk_free_rate)?;

    print_snapshot("Equal weight", &assets, state.snapshot());

    let optimizer = ConstrainedOptimizer::default();
    let initial = vec![1.0 / assets.len() as f64; assets.len()];
    let bounds = Bounds::new(0.0, 1.0);

    let best_ratio = optimizer.optimize(&mut state, &initial, bounds, Objective::MaximizeRatio)?;
    print_snapshot("Optimized: maximum ratio", &assets, &best_ratio.snapshot);

    let min_vol =
        optimizer.optimize(&mut state, &initial, bounds, Objective::MinimizeVolatility)?;
    print_snapshot("Optimized: minimum volatility", &assets, &min_vol.snapshot);

    let samples = MonteCarloSampler::default()
        .with_iterations(20_000)
        .with_seed(7)
        .run_parallel(&state)?;

    print_snapshot(
        "Monte Carlo: maximum ratio",
        &assets,
        &Snapshot::from(samples.best_ratio()?),
    );
    print_snapshot(
        "Monte Carlo: minimum volatility",
        &assets,
        &Snapshot::from(samples.best_min_volatility()?),
    );

    Ok(())
}
