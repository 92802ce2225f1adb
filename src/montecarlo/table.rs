//! Sample table produced by a Monte Carlo run.

use serde::Serialize;

use crate::error::{PortfolioError, Result};
use crate::portfolio::Snapshot;

/// One evaluated weight vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRow {
    pub weights: Vec<f64>,
    pub expected_return: f64,
    pub volatility: f64,
    pub ratio: f64,
}

impl From<Snapshot> for SampleRow {
    fn from(s: Snapshot) -> Self {
        SampleRow {
            weights: s.weights,
            expected_return: s.expected_return,
            volatility: s.volatility,
            ratio: s.ratio,
        }
    }
}

impl From<&SampleRow> for Snapshot {
    fn from(row: &SampleRow) -> Self {
        Snapshot {
            weights: row.weights.clone(),
            expected_return: row.expected_return,
            volatility: row.volatility,
            ratio: row.ratio,
        }
    }
}

/// Samples in generation order.
///
/// Rows are only appended while the sampler runs; a finished table has no
/// mutators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleTable {
    assets: Vec<String>,
    rows: Vec<SampleRow>,
}

impl SampleTable {
    pub(crate) fn with_capacity(assets: Vec<String>, capacity: usize) -> Self {
        SampleTable {
            assets,
            rows: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn from_rows(assets: Vec<String>, rows: Vec<SampleRow>) -> Self {
        SampleTable { assets, rows }
    }

    pub(crate) fn push(&mut self, row: SampleRow) {
        self.rows.push(row);
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn rows(&self) -> &[SampleRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn returns(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(|r| r.expected_return)
    }

    pub fn volatilities(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(|r| r.volatility)
    }

    pub fn ratios(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(|r| r.ratio)
    }

    /// Row with the highest ratio; ties go to the earliest row.
    pub fn best_ratio(&self) -> Result<&SampleRow> {
        first_max_by(self.rows.iter(), |r| r.ratio)
            .ok_or(PortfolioError::NoFeasibleSample { max_risk: None })
    }

    /// Row with the lowest volatility; ties go to the earliest row.
    pub fn best_min_volatility(&self) -> Result<&SampleRow> {
        first_max_by(self.rows.iter(), |r| -r.volatility)
            .ok_or(PortfolioError::NoFeasibleSample { max_risk: None })
    }

    /// Highest-return row among those with `volatility <= max_risk`.
    pub fn best_return_under_risk(&self, max_risk: f64) -> Result<&SampleRow> {
        let feasible = self.rows.iter().filter(|r| r.volatility <= max_risk);
        first_max_by(feasible, |r| r.expected_return).ok_or(PortfolioError::NoFeasibleSample {
            max_risk: Some(max_risk),
        })
    }

    /// Column names for [`to_rows`](Self::to_rows): assets, then the metrics.
    pub fn header(&self) -> Vec<String> {
        let mut header = self.assets.clone();
        header.extend(["return", "volatility", "ratio"].map(String::from));
        header
    }

    /// Row-oriented numeric table matching [`header`](Self::header).
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows
            .iter()
            .map(|r| {
                let mut row = r.weights.clone();
                row.extend([r.expected_return, r.volatility, r.ratio]);
                row
            })
            .collect()
    }
}

/// First element with the strictly largest key.
fn first_max_by<'a, I, F>(rows: I, key: F) -> Option<&'a SampleRow>
where
    I: Iterator<Item = &'a SampleRow>,
    F: Fn(&SampleRow) -> f64,
{
    let mut best: Option<(&SampleRow, f64)> = None;
    for row in rows {
        let k = key(row);
        match best {
            Some((_, best_key)) if k <= best_key => {}
            _ => best = Some((row, k)),
        }
    }
    best.map(|(row, _)| row)
}
