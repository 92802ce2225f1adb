//! Risk Ceiling Example
//!
//! Monte Carlo search for the highest expected return whose volatility stays
//! under a ceiling, configured from a JSON document. Prints the sample table
//! as CSV-like rows for a plotting tool.

use std::sync::Arc;

use meanvar::prelude::*;
use nalgebra::{DMatrix, DVector};

const CONFIG: &str = r#"{
    "sampler": { "iterations": 2000, "seed": 42 },
    "max_risk": 0.12
}"#;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = AnalysisConfig::from_json(CONFIG)?;

    // Daily moments as a data provider might report them.
    #[rustfmt::skip]
    let covariance = DMatrix::from_row_slice(3, 3, &[
        0.00012, 0.00003, 0.00001,
        0.00003, 0.00020, 0.00002,
        0.00001, 0.00002, 0.00003,
    ]);
    let mean = DVector::from_vec(vec![0.0006, 0.0008, 0.0002]);
    let assets = vec!["EQ".to_string(), "EM".to_string(), "IG".to_string()];
    let returns = Arc::new(ReturnSeries::from_moments(assets, mean, covariance)?);

    let mut state = PortfolioState::uniform(returns, 0.03)?;
    config.validate(state.num_assets())?;

    let samples = MonteCarloSampler::new(config.sampler.clone()).run(&mut state)?;
    let ceiling = config.max_risk.unwrap_or(f64::INFINITY);

    match samples.best_return_under_risk(ceiling) {
        Ok(row) => println!(
            "Best return under {:.1}% volatility: {:.2}% (volatility {:.2}%, weights {:?})",
            ceiling * 100.0,
            row.expected_return * 100.0,
            row.volatility * 100.0,
            row.weights
        ),
        Err(e) => println!("{}", e),
    }

    println!("\n{}", samples.header().join(","));
    for row in samples.to_rows().iter().take(10) {
        let cells: Vec<String> = row.iter().map(|v| format!("{:.6}", v)).collect();
        println!("{}", cells.join(","));
    }
    println!("... {} rows", samples.len());

    Ok(())
}
