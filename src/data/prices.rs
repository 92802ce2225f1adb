//! Aligned price table.
//!
//! A `PriceTable` is the input handed over by whatever fetched the market data:
//! one price column per asset on a shared, strictly increasing date index.
//! A missing observation for one asset on a shared date is stored as `NaN`.

use std::collections::HashSet;

use chrono::NaiveDate;
use nalgebra::DMatrix;
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::error::{PortfolioError, Result};

/// Per-asset price observations aligned on a common date index.
#[derive(Debug, Clone)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    assets: Vec<String>,
    /// Rows are dates, columns are assets.
    prices: DMatrix<f64>,
}

/// Serializes as `{ dates, assets, prices }` with one price list per asset,
/// in the same order as `assets`. Missing observations become `null`.
impl Serialize for PriceTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let columns: Vec<Vec<Option<f64>>> = self
            .prices
            .column_iter()
            .map(|c| c.iter().map(|&p| (!p.is_nan()).then_some(p)).collect())
            .collect();
        let mut table = serializer.serialize_struct("PriceTable", 3)?;
        table.serialize_field("dates", &self.dates)?;
        table.serialize_field("assets", &self.assets)?;
        table.serialize_field("prices", &columns)?;
        table.end()
    }
}

impl PriceTable {
    /// Build a table from a date index and named price columns.
    ///
    /// Every column must have exactly one entry per date. Present prices must
    /// be finite and strictly positive; `NaN` marks a missing observation.
    pub fn new<S: Into<String>>(
        dates: Vec<NaiveDate>,
        columns: impl IntoIterator<Item = (S, Vec<f64>)>,
    ) -> Result<Self> {
        if let Some(row) = dates.windows(2).position(|w| w[0] >= w[1]) {
            return Err(PortfolioError::UnsortedDates { row: row + 1 });
        }

        let mut assets = Vec::new();
        let mut seen = HashSet::new();
        let mut values = Vec::new();

        for (name, column) in columns {
            let name = name.into();
            if !seen.insert(name.clone()) {
                return Err(PortfolioError::DuplicateAsset(name));
            }
            if column.len() != dates.len() {
                return Err(PortfolioError::dimension(
                    format!("price column '{}'", name),
                    dates.len(),
                    column.len(),
                ));
            }
            for (row, &price) in column.iter().enumerate() {
                if !price.is_nan() && (!price.is_finite() || price <= 0.0) {
                    return Err(PortfolioError::InvalidPrice {
                        asset: name,
                        row,
                        price,
                    });
                }
            }
            values.extend(column);
            assets.push(name);
        }

        // Column-major storage matches the order columns were pushed.
        let prices = DMatrix::from_vec(dates.len(), assets.len(), values);

        Ok(PriceTable {
            dates,
            assets,
            prices,
        })
    }

    /// Date index.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Asset identifiers in column order.
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Number of assets.
    pub fn num_assets(&self) -> usize {
        self.assets.len()
    }

    /// Number of dates.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the table has no dates.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Price matrix (dates x assets).
    pub fn prices(&self) -> &DMatrix<f64> {
        &self.prices
    }

    /// Price column for an asset, if present.
    pub fn column(&self, asset: &str) -> Option<Vec<f64>> {
        let idx = self.assets.iter().position(|a| a == asset)?;
        Some(self.prices.column(idx).iter().copied().collect())
    }

    /// Number of non-missing observations in a column.
    pub(crate) fn observations(&self, col: usize) -> usize {
        self.prices.column(col).iter().filter(|p| !p.is_nan()).count()
    }
}
