//! Market data inputs.
//!
//! This module provides:
//! - `PriceTable`, the aligned price input
//! - `ReturnSeries`, daily log-returns and covariance derived from it

pub mod prices;
pub mod returns;

pub use prices::PriceTable;
pub use returns::ReturnSeries;
