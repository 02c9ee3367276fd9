use log::info;
use ndarray::{Array2, ArrayView1};
use serde::Serialize;
use std::fmt;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::mapper::MapperBuilder;
use crate::netsimile::{
    feature_extraction, graph_signature, FEATURE_NAMES, N_FEATURES, N_STATS, STAT_NAMES,
};
use crate::projection::Projector;

/// Summary statistics of the NetSimile node features of one graph
///
/// Rows are `mean, median, std, skewness, kurtosis`; columns are the seven
/// node features.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureStatsTable {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl FeatureStatsTable {
    /// Reshape a feature-major signature (7 x 5) and transpose it to 5 x 7.
    /// Fails with a shape error when the signature does not hold 35 values.
    pub fn from_signature(signature: ArrayView1<f64>) -> Result<Self> {
        let by_feature = Array2::from_shape_vec((N_FEATURES, N_STATS), signature.to_vec())?;
        let by_stat = by_feature.reversed_axes();

        Ok(Self {
            rows: STAT_NAMES.iter().map(|s| s.to_string()).collect(),
            columns: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            values: by_stat.outer_iter().map(|row| row.to_vec()).collect(),
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn get(&self, stat: &str, feature: &str) -> Option<f64> {
        let i = self.rows.iter().position(|r| r == stat)?;
        let j = self.columns.iter().position(|c| c == feature)?;
        Some(self.values[i][j])
    }
}

impl fmt::Display for FeatureStatsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (j, column) in self.columns.iter().enumerate() {
            write!(f, "{:<54}", column)?;
            for (i, row) in self.rows.iter().enumerate() {
                write!(f, " {}={:<10.4}", row, self.values[i][j])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// One graph of the full dataset at a fixed cover
pub struct GraphProperties {
    data: Dataset,
    builder: MapperBuilder,
    res: usize,
    gain: f64,
}

impl GraphProperties {
    pub fn new(
        data: Dataset,
        projector: Box<dyn Projector + Send + Sync>,
        res: usize,
        gain: f64,
        seed: u64,
    ) -> Self {
        Self {
            data,
            builder: MapperBuilder::new(projector, seed),
            res,
            gain,
        }
    }

    pub fn graph_properties_stats(&self) -> Result<FeatureStatsTable> {
        let graph = self
            .builder
            .create_tda_graph(self.data.view(), self.gain, self.res)?;
        info!(
            "Graph for n_cubes {} / overlap {}: {} nodes, {} edges",
            self.res,
            self.gain,
            graph.node_count(),
            graph.edge_count()
        );

        let features = feature_extraction(graph.graph());
        let signature = graph_signature(features.view());
        FeatureStatsTable::from_signature(signature.view())
    }
}
