//! Analysis configuration.
//!
//! Groups the knobs a caller sets for one analysis run. Every field has a
//! default, so a JSON document only needs the values it changes:
//!
//! ```json
//! {
//!   "bounds": { "min_weight": 0.0, "max_weight": 0.4 },
//!   "objective": "minimize_volatility",
//!   "sampler": { "iterations": 5000, "seed": 7 },
//!   "max_risk": 0.18
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{PortfolioError, Result};
use crate::montecarlo::SamplerSettings;
use crate::optimize::{Bounds, Objective, OptimizerSettings};

/// Configuration for one analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub bounds: Bounds,
    pub objective: Objective,
    pub optimizer: OptimizerSettings,
    pub sampler: SamplerSettings,
    /// Volatility ceiling for the constrained-return query.
    pub max_risk: Option<f64>,
}

impl AnalysisConfig {
    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PortfolioError::Config(e.to_string()))
    }

    /// Check the configuration against a portfolio size.
    pub fn validate(&self, num_assets: usize) -> Result<()> {
        self.bounds.check(num_assets)?;
        if self.optimizer.tol.is_nan() || self.optimizer.tol <= 0.0 {
            return Err(PortfolioError::Config(format!(
                "optimizer tolerance must be positive, got {}",
                self.optimizer.tol
            )));
        }
        if self.optimizer.max_iter == 0 {
            return Err(PortfolioError::Config(
                "optimizer max_iter must be at least 1".into(),
            ));
        }
        if let Some(risk) = self.max_risk {
            if risk.is_nan() || risk < 0.0 {
                return Err(PortfolioError::Config(format!(
                    "max_risk must be non-negative, got {}",
                    risk
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::from_json("{}").unwrap();
        assert_eq!(config.bounds, Bounds::new(0.0, 1.0));
        assert_eq!(config.objective, Objective::MaximizeRatio);
        assert_eq!(config.optimizer.max_iter, 100);
        assert_eq!(config.optimizer.tol, 1e-8);
        assert_eq!(config.sampler.iterations, 10_000);
        assert!(config.sampler.seed.is_none());
        assert!(config.max_risk.is_none());
        assert!(config.validate(5).is_ok());
    }

    #[test]
    fn test_partial_document() {
        let config = AnalysisConfig::from_json(
            r#"{
                "bounds": { "max_weight": 0.4 },
                "objective": "minimize_volatility",
                "sampler": { "iterations": 250, "seed": 9 },
                "max_risk": 0.18
            }"#,
        )
        .unwrap();
        assert_eq!(config.bounds, Bounds::new(0.0, 0.4));
        assert_eq!(config.objective, Objective::MinimizeVolatility);
        assert_eq!(config.sampler.iterations, 250);
        assert_eq!(config.sampler.seed, Some(9));
        assert_eq!(config.max_risk, Some(0.18));
        assert!(config.validate(3).is_ok());
        assert!(matches!(
            config.validate(2),
            Err(PortfolioError::InfeasibleBounds { .. })
        ));
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            AnalysisConfig::from_json(r#"{ "objective": "maximize_alpha" }"#),
            Err(PortfolioError::Config(_))
        ));

        let mut config = AnalysisConfig::default();
        config.max_risk = Some(-0.1);
        assert!(matches!(config.validate(2), Err(PortfolioError::Config(_))));

        let mut config = AnalysisConfig::default();
        config.optimizer.tol = 0.0;
        assert!(matches!(config.validate(2), Err(PortfolioError::Config(_))));

        let mut config = AnalysisConfig::default();
        config.optimizer.tol = f64::NAN;
        assert!(matches!(config.validate(2), Err(PortfolioError::Config(_))));
    }
}
