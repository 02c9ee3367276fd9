//! Mapper graph construction
//!
//! lens (2-D projection, min-max scaled) -> hypercube cover -> DBSCAN on the
//! original rows of every cube -> one node per cluster, one edge per pair of
//! clusters sharing rows.

use log::{debug, warn};
use ndarray::{ArrayView2, Axis};
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::BTreeMap;

use crate::clustering::{dbscan, optimize_eps, NOISE};
use crate::cover::Cover;
use crate::error::Result;
use crate::projection::{min_max_scale, Projector};

/// Lens dimensionality used for every graph
pub const LENS_COMPONENTS: usize = 2;

/// Percentile of nearest-neighbour distances used as DBSCAN eps
pub const DEFAULT_EPS_PERCENTILE: f64 = 95.0;

/// DBSCAN core-point threshold, also the smallest cube that gets clustered
pub const DEFAULT_MIN_SAMPLES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperNode {
    pub cube: usize,
    pub cluster: usize,
    /// Sorted row indices into the sample the graph was built from
    pub members: Vec<usize>,
}

impl MapperNode {
    pub fn id(&self) -> String {
        format!("cube{}_cluster{}", self.cube, self.cluster)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MapperGraph {
    graph: UnGraph<MapperNode, ()>,
}

impl MapperGraph {
    /// Assemble the graph from its nodes; edges follow from shared members
    pub fn from_nodes(nodes: Vec<MapperNode>) -> Self {
        let mut graph = UnGraph::with_capacity(nodes.len(), 0);
        let indices: Vec<NodeIndex> = nodes.into_iter().map(|n| graph.add_node(n)).collect();

        for (a, &ia) in indices.iter().enumerate() {
            for &ib in &indices[a + 1..] {
                if shares_member(&graph[ia].members, &graph[ib].members) {
                    graph.add_edge(ia, ib, ());
                }
            }
        }

        Self { graph }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &MapperNode> {
        self.graph.node_weights()
    }

    pub fn graph(&self) -> &UnGraph<MapperNode, ()> {
        &self.graph
    }
}

/// Intersection test on two sorted member lists
fn shares_member(a: &[usize], b: &[usize]) -> bool {
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => return true,
        }
    }
    false
}

/// Builds Mapper graphs with a fixed lens and self-tuned clustering
pub struct MapperBuilder {
    projector: Box<dyn Projector + Send + Sync>,
    seed: u64,
    eps_percentile: f64,
    min_samples: usize,
}

impl MapperBuilder {
    pub fn new(projector: Box<dyn Projector + Send + Sync>, seed: u64) -> Self {
        Self {
            projector,
            seed,
            eps_percentile: DEFAULT_EPS_PERCENTILE,
            min_samples: DEFAULT_MIN_SAMPLES,
        }
    }

    pub fn with_eps_percentile(mut self, eps_percentile: f64) -> Self {
        self.eps_percentile = eps_percentile;
        self
    }

    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    pub fn projector_name(&self) -> &'static str {
        self.projector.name()
    }

    /// Build one Mapper graph of `x` under the given cover parameters
    pub fn create_tda_graph(
        &self,
        x: ArrayView2<f64>,
        perc_overlap: f64,
        n_cubes: usize,
    ) -> Result<MapperGraph> {
        let cover = Cover::new(n_cubes, perc_overlap)?;

        let mut lens = self.projector.project(x, LENS_COMPONENTS, self.seed)?;
        min_max_scale(&mut lens);

        let eps = optimize_eps(x, self.eps_percentile)?;

        let mut nodes = Vec::new();
        for (cube, members) in cover.fit_transform(lens.view()).into_iter().enumerate() {
            if members.len() < self.min_samples {
                continue;
            }

            let rows = x.select(Axis(0), &members);
            let labels = dbscan(rows.view(), eps, self.min_samples)?;

            let mut clusters: BTreeMap<isize, Vec<usize>> = BTreeMap::new();
            for (local, &label) in labels.iter().enumerate() {
                if label != NOISE {
                    clusters.entry(label).or_default().push(members[local]);
                }
            }

            for (label, mut rows) in clusters {
                rows.sort_unstable();
                nodes.push(MapperNode {
                    cube,
                    cluster: label as usize,
                    members: rows,
                });
            }
        }

        let graph = MapperGraph::from_nodes(nodes);
        if graph.node_count() == 0 {
            warn!(
                "Mapper graph is empty (n_cubes: {}, overlap: {:.3}, eps: {:.4})",
                cover.n_cubes(),
                cover.perc_overlap(),
                eps
            );
        }
        debug!(
            "Mapper graph: {} nodes, {} edges (n_cubes: {}, overlap: {:.3}, eps: {:.4})",
            graph.node_count(),
            graph.edge_count(),
            cover.n_cubes(),
            cover.perc_overlap(),
            eps
        );

        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::Pca;
    use ndarray::array;

    fn node(cube: usize, members: Vec<usize>) -> MapperNode {
        MapperNode {
            cube,
            cluster: 0,
            members,
        }
    }

    #[test]
    fn edges_connect_overlapping_clusters_only() {
        let graph = MapperGraph::from_nodes(vec![
            node(0, vec![0, 1, 2]),
            node(1, vec![2, 3]),
            node(2, vec![4, 5]),
        ]);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 1);
        let g = graph.graph();
        assert!(g.contains_edge(NodeIndex::new(0), NodeIndex::new(1)));
    }

    #[test]
    fn node_ids_follow_kmapper_naming() {
        let n = MapperNode {
            cube: 3,
            cluster: 1,
            members: vec![],
        };
        assert_eq!(n.id(), "cube3_cluster1");
    }

    #[test]
    fn single_cube_clusters_the_whole_sample() {
        // two tight blobs and one far outlier that ends up as noise
        let x = array![
            [0.0, 0.0],
            [0.1, 0.0],
            [0.2, 0.0],
            [5.0, 5.0],
            [10.0, 10.0],
            [10.1, 10.0],
            [10.2, 10.0],
        ];
        let builder = MapperBuilder::new(Box::new(Pca), 42);
        let graph = builder.create_tda_graph(x.view(), 0.0, 1).unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
        let members: Vec<&Vec<usize>> = graph.nodes().map(|n| &n.members).collect();
        assert_eq!(members, vec![&vec![0, 1, 2], &vec![4, 5, 6]]);
    }

    #[test]
    fn invalid_cover_propagates() {
        let x = array![[0.0, 0.0], [1.0, 1.0], [2.0, 0.5]];
        let builder = MapperBuilder::new(Box::new(Pca), 0);
        assert!(builder.create_tda_graph(x.view(), 0.3, 0).is_err());
    }
}
