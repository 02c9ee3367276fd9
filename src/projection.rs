//! Lens functions for the Mapper construction
//!
//! A projector maps the `(n_samples, n_features)` sample matrix to
//! `(n_samples, n_components)`. Seeded projectors have to be deterministic
//! for a fixed seed.

use log::debug;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use ndarray_linalg::{Eigh, UPLO};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TuneError};

pub trait Projector {
    fn name(&self) -> &'static str;

    fn project(&self, data: ArrayView2<f64>, n_components: usize, seed: u64)
        -> Result<Array2<f64>>;
}

/// Principal component analysis via the eigendecomposition of the covariance
/// matrix. The seed is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pca;

impl Projector for Pca {
    fn name(&self) -> &'static str {
        "pca"
    }

    fn project(
        &self,
        data: ArrayView2<f64>,
        n_components: usize,
        _seed: u64,
    ) -> Result<Array2<f64>> {
        let (n_samples, n_features) = data.dim();
        if n_samples < 2 {
            return Err(TuneError::InvalidParameter(format!(
                "PCA needs at least 2 samples, got {}",
                n_samples
            )));
        }
        if n_components == 0 || n_components > n_features {
            return Err(TuneError::InvalidParameter(format!(
                "cannot extract {} components from {} features",
                n_components, n_features
            )));
        }

        let mean = data.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(n_features));
        let centered = &data - &mean;
        let cov = centered.t().dot(&centered) / (n_samples as f64 - 1.0);

        // eigenvalues come back in ascending order
        let (eigenvalues, eigenvectors) = cov.eigh(UPLO::Lower)?;

        let mut components = Array2::<f64>::zeros((n_features, n_components));
        for c in 0..n_components {
            let idx = n_features - 1 - c;
            let mut column = eigenvectors.column(idx).to_owned();

            // largest-magnitude loading positive, so the sign is reproducible
            let pivot = column
                .iter()
                .copied()
                .fold(0.0_f64, |acc, v| if v.abs() > acc.abs() { v } else { acc });
            if pivot < 0.0 {
                column.mapv_inplace(|v| -v);
            }
            components.column_mut(c).assign(&column);
        }

        let total: f64 = eigenvalues.iter().sum();
        if total > 0.0 {
            let kept: f64 = eigenvalues.iter().rev().take(n_components).sum();
            debug!(
                "PCA: {} components explain {:.2}% of the variance",
                n_components,
                100.0 * kept / total
            );
        }

        Ok(centered.dot(&components))
    }
}

/// Gaussian random projection with entries drawn from N(0, 1/n_components)
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomProjection;

impl Projector for RandomProjection {
    fn name(&self) -> &'static str {
        "random"
    }

    fn project(
        &self,
        data: ArrayView2<f64>,
        n_components: usize,
        seed: u64,
    ) -> Result<Array2<f64>> {
        if n_components == 0 {
            return Err(TuneError::InvalidParameter(
                "random projection needs at least one component".to_string(),
            ));
        }
        let n_features = data.ncols();
        let normal = Normal::new(0.0, 1.0 / (n_components as f64).sqrt())
            .map_err(|e| TuneError::InvalidParameter(e.to_string()))?;

        let mut rng = StdRng::seed_from_u64(seed);
        let matrix = Array2::from_shape_simple_fn((n_features, n_components), || {
            normal.sample(&mut rng)
        });

        Ok(data.dot(&matrix))
    }
}

/// Projector choice as it appears in configuration files and on the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ProjectorKind {
    #[default]
    Pca,
    Random,
}

impl ProjectorKind {
    pub fn build(self) -> Box<dyn Projector + Send + Sync> {
        match self {
            ProjectorKind::Pca => Box::new(Pca),
            ProjectorKind::Random => Box::new(RandomProjection),
        }
    }
}

/// Scale every column to [0, 1]; constant columns become 0
pub fn min_max_scale(lens: &mut Array2<f64>) {
    for mut column in lens.columns_mut() {
        let min = column.iter().copied().fold(f64::INFINITY, f64::min);
        let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;
        if range > 0.0 {
            column.mapv_inplace(|v| (v - min) / range);
        } else {
            column.fill(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn pca_recovers_dominant_axis() {
        // points spread along x, tiny noise on y and z
        let data = array![
            [-3.0, 0.01, 0.0],
            [-1.0, -0.02, 0.01],
            [0.0, 0.0, -0.01],
            [1.0, 0.02, 0.0],
            [3.0, -0.01, 0.0],
        ];
        let lens = Pca.project(data.view(), 2, 0).unwrap();
        assert_eq!(lens.dim(), (5, 2));

        // first component is the centred x coordinate, positive sign
        for (row, expected) in [-3.0, -1.0, 0.0, 1.0, 3.0].iter().enumerate() {
            assert!((lens[[row, 0]] - expected).abs() < 0.05);
        }
    }

    #[test]
    fn pca_rejects_too_many_components() {
        let data = array![[1.0], [2.0], [3.0]];
        assert!(matches!(
            Pca.project(data.view(), 2, 0),
            Err(TuneError::InvalidParameter(_))
        ));
    }

    #[test]
    fn random_projection_is_seeded() {
        let data = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [0.5, 0.1, 0.0]];
        let a = RandomProjection.project(data.view(), 2, 7).unwrap();
        let b = RandomProjection.project(data.view(), 2, 7).unwrap();
        let c = RandomProjection.project(data.view(), 2, 8).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn min_max_scale_handles_constant_columns() {
        let mut lens = array![[1.0, 5.0], [3.0, 5.0], [2.0, 5.0]];
        min_max_scale(&mut lens);
        assert_eq!(lens, array![[0.0, 0.0], [1.0, 0.0], [0.5, 0.0]]);
    }
}
