//! Log-returns and covariance derived from a price table.
//!
//! All quantities here are in daily units. Annualization happens only in
//! [`crate::portfolio::metrics`].

use chrono::NaiveDate;
use nalgebra::{DMatrix, DVector};

use super::prices::PriceTable;
use crate::error::{PortfolioError, Result};

/// Symmetry tolerance for covariance matrices supplied directly.
const SYMMETRY_TOL: f64 = 1e-12;

/// Daily log-returns, mean log-return per asset and their sample covariance.
///
/// Immutable once built; share it between portfolio states through an `Arc`.
#[derive(Debug, Clone)]
pub struct ReturnSeries {
    assets: Vec<String>,
    dates: Vec<NaiveDate>,
    log_returns: DMatrix<f64>,
    mean: DVector<f64>,
    covariance: DMatrix<f64>,
}

impl ReturnSeries {
    /// Derive log-returns and covariance from prices.
    ///
    /// Row `i` of the log-returns is `ln(p[i + 1] / p[i])`; the first date has
    /// no predecessor and is dropped. A return involving a missing price is
    /// missing too. Means use every available return of an asset, and each
    /// covariance entry uses every date on which both assets have a return.
    pub fn from_prices(table: &PriceTable) -> Result<Self> {
        let n = table.num_assets();
        if n == 0 {
            return Err(PortfolioError::dimension("price columns", 1, 0));
        }
        for (col, asset) in table.assets().iter().enumerate() {
            let observations = table.observations(col);
            if observations < 2 {
                return Err(PortfolioError::InsufficientData {
                    asset: asset.clone(),
                    observations,
                });
            }
        }

        let prices = table.prices();
        let rows = table.len() - 1;
        let log_returns = DMatrix::from_fn(rows, n, |i, j| {
            let (prev, next) = (prices[(i, j)], prices[(i + 1, j)]);
            (next / prev).ln()
        });

        let mean = DVector::from_fn(n, |j, _| {
            let (sum, count) = log_returns
                .column(j)
                .iter()
                .filter(|r| !r.is_nan())
                .fold((0.0, 0usize), |(s, c), r| (s + r, c + 1));
            if count == 0 {
                f64::NAN
            } else {
                sum / count as f64
            }
        });

        let covariance = pairwise_covariance(&log_returns, table.assets())?;

        tracing::debug!(
            assets = n,
            observations = rows,
            "derived return series"
        );

        Ok(ReturnSeries {
            assets: table.assets().to_vec(),
            dates: table.dates()[1..].to_vec(),
            log_returns,
            mean,
            covariance,
        })
    }

    /// Build a series from known daily moments, without a return history.
    pub fn from_moments(
        assets: Vec<String>,
        mean: DVector<f64>,
        covariance: DMatrix<f64>,
    ) -> Result<Self> {
        let n = assets.len();
        if mean.len() != n {
            return Err(PortfolioError::dimension("mean vector", n, mean.len()));
        }
        if covariance.nrows() != n {
            return Err(PortfolioError::dimension(
                "covariance rows",
                n,
                covariance.nrows(),
            ));
        }
        if covariance.ncols() != n {
            return Err(PortfolioError::dimension(
                "covariance columns",
                n,
                covariance.ncols(),
            ));
        }
        for i in 0..n {
            for j in (i + 1)..n {
                if (covariance[(i, j)] - covariance[(j, i)]).abs() > SYMMETRY_TOL {
                    return Err(PortfolioError::NumericalError(format!(
                        "covariance is not symmetric at ({}, {})",
                        i, j
                    )));
                }
            }
        }

        Ok(ReturnSeries {
            assets,
            dates: Vec::new(),
            log_returns: DMatrix::zeros(0, n),
            mean,
            covariance,
        })
    }

    /// Asset identifiers.
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Number of assets.
    pub fn num_assets(&self) -> usize {
        self.assets.len()
    }

    /// Dates of the return rows (price dates without the first).
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Daily log-returns (rows x assets), `NaN` where missing.
    pub fn log_returns(&self) -> &DMatrix<f64> {
        &self.log_returns
    }

    /// Mean daily log-return per asset.
    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    /// Daily covariance matrix.
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }
}

/// Sample covariance over pairwise-complete observations (denominator `n - 1`).
fn pairwise_covariance(returns: &DMatrix<f64>, assets: &[String]) -> Result<DMatrix<f64>> {
    let n = returns.ncols();
    let mut cov = DMatrix::zeros(n, n);

    for i in 0..n {
        for j in i..n {
            let pairs: Vec<(f64, f64)> = returns
                .column(i)
                .iter()
                .zip(returns.column(j).iter())
                .filter(|(a, b)| !a.is_nan() && !b.is_nan())
                .map(|(a, b)| (*a, *b))
                .collect();

            if pairs.len() < 2 {
                let asset = if i == j {
                    assets[i].clone()
                } else {
                    format!("{}/{}", assets[i], assets[j])
                };
                return Err(PortfolioError::InsufficientData {
                    asset,
                    observations: pairs.len(),
                });
            }

            let count = pairs.len() as f64;
            let mean_i = pairs.iter().map(|p| p.0).sum::<f64>() / count;
            let mean_j = pairs.iter().map(|p| p.1).sum::<f64>() / count;
            let value = pairs
                .iter()
                .map(|(a, b)| (a - mean_i) * (b - mean_j))
                .sum::<f64>()
                / (count - 1.0);

            cov[(i, j)] = value;
            cov[(j, i)] = value;
        }
    }

    Ok(cov)
}
