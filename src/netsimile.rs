//! NetSimile graph distance
//!
//! Seven local structural features per node, summarised column-wise by five
//! moments into a 35-value signature; two graphs are compared with the
//! Canberra distance between their signatures.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use petgraph::graph::UnGraph;
use rayon::prelude::*;
use std::collections::HashSet;

/// Per-node features, in signature order
pub const FEATURE_NAMES: [&str; 7] = [
    "node degree",
    "clustering coefficient",
    "average degree of neighborhood",
    "average clustering coefficient of neighborhood",
    "number of edges in the neighborhood",
    "number of outgoing edges from the neighborhood",
    "number of neighbors of neighbors (not in neighborhood)",
];

/// Per-feature summary statistics, in signature order
pub const STAT_NAMES: [&str; 5] = ["mean", "median", "std", "skewness", "kurtosis"];

pub const N_FEATURES: usize = FEATURE_NAMES.len();
pub const N_STATS: usize = STAT_NAMES.len();

/// Sorted, deduplicated neighbour lists without self-loops
fn adjacency<N, E>(graph: &UnGraph<N, E>) -> Vec<Vec<usize>> {
    let mut adj = vec![Vec::new(); graph.node_count()];
    for edge in graph.raw_edges() {
        let (a, b) = (edge.source().index(), edge.target().index());
        if a != b {
            adj[a].push(b);
            adj[b].push(a);
        }
    }
    for list in adj.iter_mut() {
        list.sort_unstable();
        list.dedup();
    }
    adj
}

fn linked(adj: &[Vec<usize>], a: usize, b: usize) -> bool {
    adj[a].binary_search(&b).is_ok()
}

fn mean_over<'a>(values: &[f64], nodes: impl Iterator<Item = &'a usize>) -> f64 {
    let (sum, count) = nodes.fold((0.0, 0usize), |(s, c), &n| (s + values[n], c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// `(n_nodes, 7)` feature matrix, one row per node in index order
pub fn feature_extraction<N, E>(graph: &UnGraph<N, E>) -> Array2<f64> {
    let adj = adjacency(graph);
    let n = adj.len();

    let degrees: Vec<f64> = adj.iter().map(|a| a.len() as f64).collect();

    // triangles through every node
    let triangles: Vec<usize> = adj
        .par_iter()
        .map(|neigh| {
            let mut t = 0;
            for (i, &u) in neigh.iter().enumerate() {
                for &w in &neigh[i + 1..] {
                    if linked(&adj, u, w) {
                        t += 1;
                    }
                }
            }
            t
        })
        .collect();

    let clustering: Vec<f64> = (0..n)
        .map(|v| {
            let d = adj[v].len();
            if d < 2 {
                0.0
            } else {
                2.0 * triangles[v] as f64 / (d * (d - 1)) as f64
            }
        })
        .collect();

    let rows: Vec<[f64; N_FEATURES]> = (0..n)
        .into_par_iter()
        .map(|v| {
            let neigh = &adj[v];
            if neigh.is_empty() {
                return [0.0; N_FEATURES];
            }

            let egonet_edges = neigh.len() + triangles[v];

            let outgoing: usize = std::iter::once(&v)
                .chain(neigh.iter())
                .map(|&u| {
                    adj[u]
                        .iter()
                        .filter(|&&w| w != v && !linked(&adj, v, w))
                        .count()
                })
                .sum();

            let second_hop: HashSet<usize> = neigh
                .iter()
                .flat_map(|&u| adj[u].iter().copied())
                .filter(|&w| w != v && !linked(&adj, v, w))
                .collect();

            [
                degrees[v],
                clustering[v],
                mean_over(&degrees, neigh.iter()),
                mean_over(&clustering, neigh.iter()),
                egonet_edges as f64,
                outgoing as f64,
                second_hop.len() as f64,
            ]
        })
        .collect();

    let mut features = Array2::<f64>::zeros((n, N_FEATURES));
    for (v, row) in rows.iter().enumerate() {
        for (f, &value) in row.iter().enumerate() {
            features[[v, f]] = value;
        }
    }
    features
}

/// mean, median, population std, biased skewness, biased excess kurtosis
///
/// Undefined moments are NaN: all five for empty input, skewness and
/// kurtosis for zero variance.
pub fn moments(values: ArrayView1<f64>) -> [f64; N_STATS] {
    let n = values.len();
    if n == 0 {
        return [f64::NAN; N_STATS];
    }
    let nf = n as f64;
    let mean = values.sum() / nf;

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };

    let (m2, m3, m4) = values.iter().fold((0.0, 0.0, 0.0), |(m2, m3, m4), &v| {
        let d = v - mean;
        (m2 + d * d, m3 + d * d * d, m4 + d * d * d * d)
    });
    let (m2, m3, m4) = (m2 / nf, m3 / nf, m4 / nf);

    let std = m2.sqrt();
    // relative threshold against rounding noise in m2
    let (skew, kurt) = if m2 <= f64::EPSILON * mean.abs().max(1.0).powi(2) {
        (f64::NAN, f64::NAN)
    } else {
        (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
    };

    [mean, median, std, skew, kurt]
}

/// Flattened feature-major signature: for every feature its five moments
pub fn graph_signature(features: ArrayView2<f64>) -> Array1<f64> {
    let mut signature = Vec::with_capacity(features.ncols() * N_STATS);
    for column in features.columns() {
        signature.extend_from_slice(&moments(column));
    }
    Array1::from(signature)
}

/// Canberra distance
///
/// Coordinates where either value is not finite, or both are 0, contribute
/// nothing, the same as summing the NaN terms away.
pub fn canberra(u: ArrayView1<f64>, v: ArrayView1<f64>) -> f64 {
    u.iter()
        .zip(v.iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| {
            let denom = a.abs() + b.abs();
            if denom == 0.0 {
                0.0
            } else {
                (a - b).abs() / denom
            }
        })
        .sum()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NetSimile;

impl NetSimile {
    pub fn signature<N, E>(&self, graph: &UnGraph<N, E>) -> Array1<f64> {
        graph_signature(feature_extraction(graph).view())
    }

    pub fn dist<N, E>(&self, g1: &UnGraph<N, E>, g2: &UnGraph<N, E>) -> f64 {
        canberra(self.signature(g1).view(), self.signature(g2).view())
    }
}
