use log::debug;
use rand::seq::index::sample;
use rand::Rng;

use crate::error::{Result, TuneError};

/// Default share of rows drawn into every bootstrap sample
pub const DEFAULT_SAMPLE_RATIO: f64 = 0.7;

/// Draws row subsets without replacement
///
/// The generator is passed in by the caller and advanced by every draw, so a
/// whole sequence of draws is reproducible from one seed.
#[derive(Debug, Clone, Copy)]
pub struct BootstrapSampler {
    n_rows: usize,
    sample_ratio: f64,
}

impl BootstrapSampler {
    pub fn new(n_rows: usize, sample_ratio: f64) -> Result<Self> {
        if !sample_ratio.is_finite() || sample_ratio < 0.0 {
            return Err(TuneError::InvalidParameter(format!(
                "sample ratio must be a non-negative number, got {}",
                sample_ratio
            )));
        }
        let sampler = Self {
            n_rows,
            sample_ratio,
        };
        if sampler.sample_size() > n_rows {
            return Err(TuneError::InvalidParameter(format!(
                "cannot draw {} rows without replacement from {}",
                sampler.sample_size(),
                n_rows
            )));
        }
        Ok(sampler)
    }

    /// Rows per sample, rounded half to even
    pub fn sample_size(&self) -> usize {
        (self.n_rows as f64 * self.sample_ratio).round_ties_even() as usize
    }

    /// One sample of row indices, in draw order
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<usize> {
        sample(rng, self.n_rows, self.sample_size()).into_vec()
    }

    /// `n_bootstrap` consecutive draws from the same generator
    pub fn draw_many<R: Rng + ?Sized>(&self, rng: &mut R, n_bootstrap: usize) -> Vec<Vec<usize>> {
        let samples: Vec<Vec<usize>> = (0..n_bootstrap).map(|_| self.draw(rng)).collect();
        debug!(
            "Drew {} bootstrap samples of {} / {} rows",
            samples.len(),
            self.sample_size(),
            self.n_rows
        );
        samples
    }
}
