//! Monte Carlo weight search.
//!
//! Each trial draws one uniform(0, 1) value per asset and divides by their
//! sum. This is *not* uniform over the simplex: balanced allocations are
//! over-represented and concentrated ones under-sampled. The search never
//! refines around good points; its precision grows only with the number of
//! iterations.

pub mod table;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::portfolio::PortfolioState;
pub use table::{SampleRow, SampleTable};

/// Sampler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerSettings {
    /// Number of random weight vectors to evaluate.
    pub iterations: usize,
    /// Seed for reproducible runs; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        SamplerSettings {
            iterations: 10_000,
            seed: None,
        }
    }
}

/// Uniform-then-normalize Monte Carlo sampler.
#[derive(Debug, Clone, Default)]
pub struct MonteCarloSampler {
    settings: SamplerSettings,
}

impl MonteCarloSampler {
    pub fn new(settings: SamplerSettings) -> Self {
        MonteCarloSampler { settings }
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.settings.iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.settings.seed = Some(seed);
        self
    }

    pub fn settings(&self) -> &SamplerSettings {
        &self.settings
    }

    fn rng(&self) -> StdRng {
        match self.settings.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        }
    }

    /// Evaluate `iterations` random weight vectors through `state`.
    ///
    /// Each trial sets the weights and reads the snapshot before the next
    /// one starts; `state` is left at the last sample.
    #[tracing::instrument(skip_all, fields(iterations = self.settings.iterations))]
    pub fn run(&self, state: &mut PortfolioState) -> Result<SampleTable> {
        let n = state.num_assets();
        let mut rng = self.rng();
        let mut table =
            SampleTable::with_capacity(state.returns().assets().to_vec(), self.settings.iterations);

        for _ in 0..self.settings.iterations {
            let weights = draw_weights(&mut rng, n);
            let snapshot = state.set_weights(&weights)?;
            table.push(SampleRow::from(snapshot.clone()));
        }

        tracing::info!(rows = table.len(), "monte carlo run finished");
        Ok(table)
    }

    /// Same samples as [`run`](Self::run) for the same seed, evaluated on the
    /// rayon thread pool.
    ///
    /// Weight vectors are drawn up front from a single generator; each worker
    /// evaluates them on its own clone of `state`.
    #[tracing::instrument(skip_all, fields(iterations = self.settings.iterations))]
    pub fn run_parallel(&self, state: &PortfolioState) -> Result<SampleTable> {
        let n = state.num_assets();
        let mut rng = self.rng();
        let candidates: Vec<Vec<f64>> = (0..self.settings.iterations)
            .map(|_| draw_weights(&mut rng, n))
            .collect();

        let rows = candidates
            .into_par_iter()
            .map_init(
                || state.clone(),
                |worker, weights| {
                    worker
                        .set_weights(&weights)
                        .map(|s| SampleRow::from(s.clone()))
                },
            )
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(rows = rows.len(), "parallel monte carlo run finished");
        Ok(SampleTable::from_rows(
            state.returns().assets().to_vec(),
            rows,
        ))
    }
}

/// Draw `n` uniform(0, 1) values and normalize them to sum to one.
///
/// Returns an empty vector when `n` is zero.
pub fn draw_weights<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    loop {
        let raw: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();
        let total: f64 = raw.iter().sum();
        if total > 0.0 {
            return raw.into_iter().map(|w| w / total).collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ReturnSeries;
    use nalgebra::{DMatrix, DVector};
    use std::sync::Arc;

    fn state() -> PortfolioState {
        let series = ReturnSeries::from_moments(
            vec!["A".into(), "B".into(), "C".into()],
            DVector::from_vec(vec![0.0009, 0.0004, 0.0002]),
            DMatrix::from_row_slice(
                3,
                3,
                &[
                    0.0004, 0.00005, 0.0, //
                    0.00005, 0.0002, 0.00002, //
                    0.0, 0.00002, 0.0001,
                ],
            ),
        )
        .unwrap();
        PortfolioState::uniform(Arc::new(series), 0.02).unwrap()
    }

    #[test]
    fn test_draw_weights_on_simplex() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let w = draw_weights(&mut rng, 5);
            assert_eq!(w.len(), 5);
            assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
            assert!(w.iter().all(|&x| (0.0..=1.0).contains(&x)));
        }
    }

    #[test]
    fn test_draw_weights_no_assets() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(draw_weights(&mut rng, 0).is_empty());
    }

    #[test]
    fn test_run_rows_on_simplex() {
        let mut s = state();
        let table = MonteCarloSampler::default()
            .with_iterations(500)
            .with_seed(42)
            .run(&mut s)
            .unwrap();
        assert_eq!(table.len(), 500);
        for row in table.rows() {
            assert!((row.weights.iter().sum::<f64>() - 1.0).abs() < 1e-12);
            assert!(row.volatility > 0.0);
        }
        // State holds the last sample.
        assert_eq!(s.snapshot().weights, table.rows()[499].weights);
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let sampler = MonteCarloSampler::default().with_iterations(50).with_seed(3);
        let a = sampler.run(&mut state()).unwrap();
        let b = sampler.run(&mut state()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sampler = MonteCarloSampler::default().with_iterations(300).with_seed(11);
        let s = state();
        let parallel = sampler.run_parallel(&s).unwrap();
        let sequential = sampler.run(&mut s.clone()).unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_zero_iterations() {
        let table = MonteCarloSampler::default()
            .with_iterations(0)
            .run(&mut state())
            .unwrap();
        assert!(table.is_empty());
        assert!(table.best_ratio().is_err());
        assert!(table.best_min_volatility().is_err());
        assert!(table.best_return_under_risk(1.0).is_err());
    }
}
