use ndarray::{Array1, ArrayView2};

use crate::error::{Result, TuneError};

/// Overlapping hypercube cover of the lens
///
/// Per lens dimension there are `n_cubes` evenly spaced centres; every cube
/// reaches `radius = range / (2 n (1 - overlap))` around its centre, so
/// neighbouring cubes share an `overlap` fraction of their width.
///
/// The overlap is used as given: at exactly 1 every cube spans the whole
/// lens, above 1 the radius turns negative and the cover holds no points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cover {
    n_cubes: usize,
    perc_overlap: f64,
}

impl Cover {
    pub fn new(n_cubes: usize, perc_overlap: f64) -> Result<Self> {
        if n_cubes == 0 {
            return Err(TuneError::InvalidParameter(
                "cover needs at least one cube".to_string(),
            ));
        }
        if !perc_overlap.is_finite() || perc_overlap < 0.0 {
            return Err(TuneError::InvalidParameter(format!(
                "overlap must be a non-negative number, got {}",
                perc_overlap
            )));
        }

        Ok(Self {
            n_cubes,
            perc_overlap,
        })
    }

    pub fn n_cubes(&self) -> usize {
        self.n_cubes
    }

    pub fn perc_overlap(&self) -> f64 {
        self.perc_overlap
    }

    /// Assign lens rows to hypercubes
    ///
    /// Returns the member lists of the non-empty hypercubes, ordered with the
    /// first lens dimension varying slowest. Cube ids count these lists only.
    pub fn fit_transform(&self, lens: ArrayView2<f64>) -> Vec<Vec<usize>> {
        let (n_rows, n_dims) = lens.dim();
        if n_rows == 0 || n_dims == 0 {
            return Vec::new();
        }

        let n = self.n_cubes as f64;
        let mut centres: Vec<Vec<f64>> = Vec::with_capacity(n_dims);
        let mut radius = Array1::<f64>::zeros(n_dims);

        for (d, column) in lens.columns().into_iter().enumerate() {
            let min = column.iter().copied().fold(f64::INFINITY, f64::min);
            let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let range = max - min;
            let inset = range / (2.0 * n);
            radius[d] = range / (2.0 * n * (1.0 - self.perc_overlap));
            centres.push(linspace(min + inset, max - inset, self.n_cubes));
        }

        let n_hypercubes = self.n_cubes.pow(n_dims as u32);
        let mut members = Vec::new();

        for cube in 0..n_hypercubes {
            let centre = cube_centre(cube, self.n_cubes, &centres);
            let inside: Vec<usize> = (0..n_rows)
                .filter(|&row| {
                    (0..n_dims).all(|d| {
                        let v = lens[[row, d]];
                        v >= centre[d] - radius[d] && v <= centre[d] + radius[d]
                    })
                })
                .collect();
            if !inside.is_empty() {
                members.push(inside);
            }
        }

        members
    }
}

fn linspace(start: f64, end: f64, num: usize) -> Vec<f64> {
    if num == 1 {
        return vec![start];
    }
    let step = (end - start) / (num - 1) as f64;
    (0..num).map(|i| start + step * i as f64).collect()
}

/// Mixed-radix decode of a hypercube index into per-dimension centres
fn cube_centre(cube: usize, n_cubes: usize, centres: &[Vec<f64>]) -> Vec<f64> {
    let n_dims = centres.len();
    let mut centre = vec![0.0; n_dims];
    let mut rest = cube;
    for d in (0..n_dims).rev() {
        centre[d] = centres[d][rest % n_cubes];
        rest /= n_cubes;
    }
    centre
}
