//! DBSCAN over the original sample rows, plus the nearest-neighbour eps
//! heuristic used to pick its radius.
//!
//! Neighbour queries go through a kd-tree (kiddo) for the dimensions listed
//! in `impl_index_for_dim!`, and through a brute-force scan otherwise.

use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;
use log::debug;
use ndarray::ArrayView2;
use std::collections::VecDeque;
use std::num::NonZeroUsize;

use crate::error::{Result, TuneError};

/// Label given to points that belong to no cluster
pub const NOISE: isize = -1;

/// Neighbour queries specialised on the row dimension
pub trait DimensionalIndex {
    /// For every row, all rows within `eps` (the row itself included)
    fn radius_neighbours(data: ArrayView2<f64>, eps: f64) -> Vec<Vec<usize>>;

    /// For every row, the distance to its nearest other row
    fn nearest_distances(data: ArrayView2<f64>) -> Vec<f64>;
}

macro_rules! impl_index_for_dim {
    ($dim:expr) => {
        impl DimensionalIndex for [(); $dim] {
            fn radius_neighbours(data: ArrayView2<f64>, eps: f64) -> Vec<Vec<usize>> {
                let points = rows_as_arrays::<$dim>(data);
                let tree = Tree::<$dim>::new_from_slice(&points);
                let eps_sq = eps * eps;

                points
                    .iter()
                    .map(|point| {
                        let mut found: Vec<usize> = tree
                            .within::<SquaredEuclidean>(point, eps_sq)
                            .into_iter()
                            .map(|nn| nn.item as usize)
                            .collect();
                        found.sort_unstable();
                        found
                    })
                    .collect()
            }

            fn nearest_distances(data: ArrayView2<f64>) -> Vec<f64> {
                let points = rows_as_arrays::<$dim>(data);
                let tree = Tree::<$dim>::new_from_slice(&points);

                points
                    .iter()
                    .map(|point| {
                        // the point itself is one of the two hits, at distance 0
                        tree.nearest_n::<SquaredEuclidean>(point, SELF_AND_NEAREST)
                            .iter()
                            .map(|nn| nn.distance)
                            .fold(0.0, f64::max)
                            .sqrt()
                    })
                    .collect()
            }
        }
    };
}

/// Immutable kd-tree: builds from a slice and, unlike the mutable tree,
/// accepts any number of rows sharing a coordinate. Items are row indices.
type Tree<const D: usize> = ImmutableKdTree<f64, u64, D, BUCKET>;

const BUCKET: usize = 32;
const SELF_AND_NEAREST: NonZeroUsize = NonZeroUsize::MIN.saturating_add(1);

fn rows_as_arrays<const D: usize>(data: ArrayView2<f64>) -> Vec<[f64; D]> {
    data.outer_iter()
        .map(|row| {
            let mut point = [0.0; D];
            for (slot, &v) in point.iter_mut().zip(row.iter()) {
                *slot = v;
            }
            point
        })
        .collect()
}

impl_index_for_dim!(1);
impl_index_for_dim!(2);
impl_index_for_dim!(3);
impl_index_for_dim!(4);
impl_index_for_dim!(5);
impl_index_for_dim!(6);
impl_index_for_dim!(7);
impl_index_for_dim!(8);
impl_index_for_dim!(9);
impl_index_for_dim!(10);

fn squared_distance(data: ArrayView2<f64>, a: usize, b: usize) -> f64 {
    data.row(a)
        .iter()
        .zip(data.row(b).iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

fn brute_radius_neighbours(data: ArrayView2<f64>, eps: f64) -> Vec<Vec<usize>> {
    let eps_sq = eps * eps;
    let n = data.nrows();
    (0..n)
        .map(|i| {
            (0..n)
                .filter(|&j| squared_distance(data, i, j) <= eps_sq)
                .collect()
        })
        .collect()
}

fn brute_nearest_distances(data: ArrayView2<f64>) -> Vec<f64> {
    let n = data.nrows();
    (0..n)
        .map(|i| {
            (0..n)
                .filter(|&j| j != i)
                .map(|j| squared_distance(data, i, j))
                .fold(f64::INFINITY, f64::min)
        })
        .map(|d| if d.is_finite() { d.sqrt() } else { 0.0 })
        .collect()
}

/// Dispatch to the kd-tree for supported dimensions
pub fn radius_neighbours(data: ArrayView2<f64>, eps: f64) -> Vec<Vec<usize>> {
    match data.ncols() {
        1 => <[(); 1]>::radius_neighbours(data, eps),
        2 => <[(); 2]>::radius_neighbours(data, eps),
        3 => <[(); 3]>::radius_neighbours(data, eps),
        4 => <[(); 4]>::radius_neighbours(data, eps),
        5 => <[(); 5]>::radius_neighbours(data, eps),
        6 => <[(); 6]>::radius_neighbours(data, eps),
        7 => <[(); 7]>::radius_neighbours(data, eps),
        8 => <[(); 8]>::radius_neighbours(data, eps),
        9 => <[(); 9]>::radius_neighbours(data, eps),
        10 => <[(); 10]>::radius_neighbours(data, eps),
        d => {
            debug!("No kd-tree for {} dimensions, scanning all pairs", d);
            brute_radius_neighbours(data, eps)
        }
    }
}

pub fn nearest_distances(data: ArrayView2<f64>) -> Vec<f64> {
    match data.ncols() {
        1 => <[(); 1]>::nearest_distances(data),
        2 => <[(); 2]>::nearest_distances(data),
        3 => <[(); 3]>::nearest_distances(data),
        4 => <[(); 4]>::nearest_distances(data),
        5 => <[(); 5]>::nearest_distances(data),
        6 => <[(); 6]>::nearest_distances(data),
        7 => <[(); 7]>::nearest_distances(data),
        8 => <[(); 8]>::nearest_distances(data),
        9 => <[(); 9]>::nearest_distances(data),
        10 => <[(); 10]>::nearest_distances(data),
        _ => brute_nearest_distances(data),
    }
}

/// Percentile with linear interpolation between closest ranks
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=100.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// DBSCAN radius such that `threshold` percent of the rows have their
/// nearest neighbour within it
pub fn optimize_eps(data: ArrayView2<f64>, threshold: f64) -> Result<f64> {
    if data.nrows() < 2 {
        return Err(TuneError::InvalidParameter(format!(
            "eps heuristic needs at least 2 rows, got {}",
            data.nrows()
        )));
    }
    let distances = nearest_distances(data);
    percentile(&distances, threshold).ok_or_else(|| {
        TuneError::InvalidParameter(format!("percentile {} outside [0, 100]", threshold))
    })
}

/// Density-based clustering
///
/// Returns one label per row: `NOISE` or a cluster id counted from 0 in
/// order of discovery.
pub fn dbscan(data: ArrayView2<f64>, eps: f64, min_samples: usize) -> Result<Vec<isize>> {
    if !eps.is_finite() || eps <= 0.0 {
        return Err(TuneError::InvalidParameter(format!(
            "eps must be positive and finite, got {}",
            eps
        )));
    }
    if min_samples == 0 {
        return Err(TuneError::InvalidParameter(
            "min_samples must be at least 1".to_string(),
        ));
    }

    let neighbours = radius_neighbours(data, eps);
    let is_core: Vec<bool> = neighbours.iter().map(|n| n.len() >= min_samples).collect();

    let mut labels = vec![NOISE; data.nrows()];
    let mut cluster_id: isize = 0;

    for i in 0..data.nrows() {
        if labels[i] != NOISE || !is_core[i] {
            continue;
        }

        labels[i] = cluster_id;
        let mut seeds: VecDeque<usize> = neighbours[i].iter().copied().collect();

        while let Some(current) = seeds.pop_front() {
            if labels[current] != NOISE {
                continue;
            }
            labels[current] = cluster_id;

            // only core points grow the cluster further
            if is_core[current] {
                seeds.extend(
                    neighbours[current]
                        .iter()
                        .copied()
                        .filter(|&n| labels[n] == NOISE),
                );
            }
        }

        cluster_id += 1;
    }

    Ok(labels)
}
