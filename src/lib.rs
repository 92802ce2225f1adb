//! # meanvar
//!
//! Mean-variance portfolio analysis: annualized return, volatility and
//! risk-adjusted (Sharpe) ratio for a basket of assets, plus two ways of
//! searching for good weights.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use meanvar::prelude::*;
//!
//! let prices = PriceTable::new(dates, columns)?;
//! let returns = Arc::new(ReturnSeries::from_prices(&prices)?);
//! let mut state = PortfolioState::uniform(returns, 0.045)?;
//!
//! // Deterministic local optimization
//! let best = ConstrainedOptimizer::default().optimize(
//!     &mut state,
//!     &[0.25; 4],
//!     Bounds::new(0.0, 1.0),
//!     Objective::MaximizeRatio,
//! )?;
//!
//! // Random search
//! let samples = MonteCarloSampler::default()
//!     .with_iterations(10_000)
//!     .with_seed(42)
//!     .run(&mut state)?;
//! let capped = samples.best_return_under_risk(0.15)?;
//! ```
//!
//! ## Conventions
//!
//! - Log-returns and covariance are daily; metrics are annualized with
//!   252 trading days (`return * 252`, `variance * 252`).
//! - Ratio: `(expected_return - risk_free_rate) / volatility`.
//! - Weights sum to one and lie within shared `[min_weight, max_weight]`
//!   bounds during optimization and sampling. Direct assignment through
//!   [`PortfolioState::set_weights`] does not enforce either.
//!
//! ## Architecture
//!
//! - **Data**: `PriceTable` → `ReturnSeries` (log-returns, mean, covariance)
//! - **Metrics**: a pure `evaluate` function; `PortfolioState` caches its result
//! - **Optimizer**: SQP with a damped-BFGS model, QP steps solved by Clarabel
//! - **Monte Carlo**: uniform-then-normalize sampling with best-point queries

pub mod config;
pub mod data;
pub mod error;
pub mod montecarlo;
pub mod optimize;
pub mod portfolio;
pub mod sparse;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use meanvar::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::AnalysisConfig;
    pub use crate::data::{PriceTable, ReturnSeries};
    pub use crate::error::{PortfolioError, Result};
    pub use crate::montecarlo::{MonteCarloSampler, SampleRow, SampleTable, SamplerSettings};
    pub use crate::optimize::{
        Bounds, ConstrainedOptimizer, Objective, OptimizeResult, OptimizerSettings,
    };
    pub use crate::portfolio::{evaluate, Metrics, PortfolioState, Snapshot, TRADING_DAYS};
}

// Re-export main types at crate root
pub use error::{PortfolioError, Result};
pub use portfolio::PortfolioState;
