//! Mutable portfolio state with cached metrics.

use std::sync::Arc;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use super::metrics::{evaluate, Metrics};
use crate::data::ReturnSeries;
use crate::error::Result;

/// Immutable view of a portfolio's weights and metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub weights: Vec<f64>,
    pub expected_return: f64,
    pub volatility: f64,
    pub ratio: f64,
}

impl Snapshot {
    fn new(weights: &DVector<f64>, metrics: Metrics) -> Self {
        Snapshot {
            weights: weights.iter().copied().collect(),
            expected_return: metrics.expected_return,
            volatility: metrics.volatility,
            ratio: metrics.ratio,
        }
    }

    /// Metrics without the weights.
    pub fn metrics(&self) -> Metrics {
        Metrics {
            expected_return: self.expected_return,
            volatility: self.volatility,
            ratio: self.ratio,
        }
    }

    /// Weights followed by return, volatility and ratio, for tabular output.
    pub fn to_row(&self) -> Vec<f64> {
        let mut row = self.weights.clone();
        row.extend([self.expected_return, self.volatility, self.ratio]);
        row
    }
}

/// A weight vector over a fixed return series, with metrics kept in sync.
///
/// The return series is shared and never modified, so cloning a state is
/// cheap and gives an independent copy for another worker.
#[derive(Debug, Clone)]
pub struct PortfolioState {
    returns: Arc<ReturnSeries>,
    risk_free_rate: f64,
    weights: DVector<f64>,
    snapshot: Snapshot,
}

impl PortfolioState {
    /// Create a state with the given initial weights.
    ///
    /// Fails on a length mismatch or if the initial portfolio has zero volatility.
    pub fn new(weights: &[f64], returns: Arc<ReturnSeries>, risk_free_rate: f64) -> Result<Self> {
        let weights = DVector::from_column_slice(weights);
        let metrics = evaluate(&weights, &returns, risk_free_rate)?;
        let snapshot = Snapshot::new(&weights, metrics);
        Ok(PortfolioState {
            returns,
            risk_free_rate,
            weights,
            snapshot,
        })
    }

    /// Create a state with equal weights `1/N`.
    pub fn uniform(returns: Arc<ReturnSeries>, risk_free_rate: f64) -> Result<Self> {
        let n = returns.num_assets();
        let weights = vec![1.0 / n as f64; n];
        Self::new(&weights, returns, risk_free_rate)
    }

    /// Replace the weights and recompute every metric.
    ///
    /// Weights are not checked against the simplex or any bounds. On error the
    /// previous weights and snapshot are kept.
    pub fn set_weights(&mut self, weights: &[f64]) -> Result<&Snapshot> {
        let candidate = DVector::from_column_slice(weights);
        let metrics = evaluate(&candidate, &self.returns, self.risk_free_rate)?;
        self.snapshot = Snapshot::new(&candidate, metrics);
        self.weights = candidate;
        Ok(&self.snapshot)
    }

    /// Current weights and metrics.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn weights(&self) -> &DVector<f64> {
        &self.weights
    }

    pub fn expected_return(&self) -> f64 {
        self.snapshot.expected_return
    }

    pub fn volatility(&self) -> f64 {
        self.snapshot.volatility
    }

    pub fn ratio(&self) -> f64 {
        self.snapshot.ratio
    }

    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    /// Shared return series.
    pub fn returns(&self) -> &Arc<ReturnSeries> {
        &self.returns
    }

    pub fn num_assets(&self) -> usize {
        self.returns.num_assets()
    }
}
