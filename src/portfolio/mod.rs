//! Portfolio metrics and state.
//!
//! This module provides:
//! - A pure evaluation function from weights to annualized metrics
//! - `PortfolioState`, which keeps a weight vector and its metrics in sync

pub mod metrics;
pub mod state;

pub use metrics::{evaluate, moments, sharpe_ratio, Metrics, TRADING_DAYS};
pub use state::{PortfolioState, Snapshot};
