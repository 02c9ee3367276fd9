use mapper_tune::Dataset;
use ndarray::Array2;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Uniform noise in the unit cube
pub fn create_uniform_data(n_rows: usize, n_cols: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    Dataset::new(Array2::from_shape_simple_fn((n_rows, n_cols), || {
        rng.random::<f64>()
    }))
}

/// Gaussian-ish blobs placed along a line, so the lens has a clear main axis
pub fn create_blob_data(n_per_blob: usize, n_blobs: usize, n_dim: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let n_total = n_per_blob * n_blobs;
    let mut values = Array2::<f64>::zeros((n_total, n_dim));

    for blob in 0..n_blobs {
        for k in 0..n_per_blob {
            let row = blob * n_per_blob + k;
            for dim in 0..n_dim {
                let centre = if dim == 0 { 8.0 * blob as f64 } else { 0.0 };
                let noise: f64 = rng.random::<f64>() - 0.5;
                values[[row, dim]] = centre + noise;
            }
        }
    }

    Dataset::new(values)
}
