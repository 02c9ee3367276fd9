//! Bootstrap grid search over the cover parameters
//!
//! Every (resolution, gain) cell builds one Mapper graph per bootstrap sample
//! and scores the cell with the NetSimile distance between those graphs.
//! Lower scores mean the graph shape is more stable under resampling.

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize, Serializer};

use crate::bootstrap::{BootstrapSampler, DEFAULT_SAMPLE_RATIO};
use crate::config::TuningConfig;
use crate::dataset::Dataset;
use crate::error::{Result, TuneError};
use crate::mapper::{MapperBuilder, MapperGraph};
use crate::netsimile::NetSimile;
use crate::projection::Projector;

/// How the pairwise graph distances of one cell are averaged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Stop after the first pair of graphs (0, 1). Matches the historical
    /// scores, which were computed this way.
    #[default]
    FirstPair,
    /// Average over every pair of graphs
    AllPairs,
}

/// Mean NetSimile distance between the graphs of one cell
///
/// For every pair both directions are computed; when they agree only one of
/// them enters the average.
pub fn graph_distance_metric(graphs: &[MapperGraph], aggregation: Aggregation) -> Result<f64> {
    if graphs.len() < 2 {
        return Err(TuneError::TooFewGraphs(graphs.len()));
    }

    let netsimile = NetSimile;
    let mut distances = Vec::new();

    'pairs: for i in 0..graphs.len() {
        for j in i + 1..graphs.len() {
            let d_ij = netsimile.dist(graphs[i].graph(), graphs[j].graph());
            let d_ji = netsimile.dist(graphs[j].graph(), graphs[i].graph());

            distances.push(d_ij);
            if d_ij != d_ji {
                distances.push(d_ji);
            }

            if aggregation == Aggregation::FirstPair {
                break 'pairs;
            }
        }
    }

    Ok(distances.iter().sum::<f64>() / distances.len() as f64)
}

fn serialize_matrix<S>(matrix: &Array2<f64>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let rows: Vec<Vec<f64>> = matrix.outer_iter().map(|row| row.to_vec()).collect();
    rows.serialize(serializer)
}

/// Stability scores indexed by (resolution index, gain index)
#[derive(Debug, Clone, Serialize)]
pub struct GridResult {
    pub res_range: Vec<usize>,
    pub gain_range: Vec<f64>,
    pub aggregation: Aggregation,
    #[serde(serialize_with = "serialize_matrix")]
    pub matrix: Array2<f64>,
}

impl GridResult {
    /// Most stable cell: `(resolution, gain, score)` with the lowest finite
    /// score, first one wins on ties
    pub fn best(&self) -> Option<(usize, f64, f64)> {
        let mut best: Option<(usize, f64, f64)> = None;
        for ((i, j), &score) in self.matrix.indexed_iter() {
            if !score.is_finite() {
                continue;
            }
            if best.map_or(true, |(_, _, s)| score < s) {
                best = Some((self.res_range[i], self.gain_range[j], score));
            }
        }
        best
    }
}

pub struct CoverTuning {
    data: Dataset,
    builder: MapperBuilder,
    res_range: Vec<usize>,
    gain_range: Vec<f64>,
    n_bootstrap: usize,
    seed: u64,
    sample_ratio: f64,
    aggregation: Aggregation,
    show_progress: bool,
}

impl CoverTuning {
    pub fn new(
        data: Dataset,
        projector: Box<dyn Projector + Send + Sync>,
        res_range: Vec<usize>,
        gain_range: Vec<f64>,
        n_bootstrap: usize,
        seed: u64,
    ) -> Self {
        Self {
            data,
            builder: MapperBuilder::new(projector, seed),
            res_range,
            gain_range,
            n_bootstrap,
            seed,
            sample_ratio: DEFAULT_SAMPLE_RATIO,
            aggregation: Aggregation::default(),
            show_progress: false,
        }
    }

    pub fn from_config(data: Dataset, config: &TuningConfig) -> Result<Self> {
        config.validate()?;
        let builder = MapperBuilder::new(config.projector.build(), config.seed)
            .with_eps_percentile(config.eps_percentile)
            .with_min_samples(config.min_samples);
        Ok(Self {
            data,
            builder,
            res_range: config.res_range.clone(),
            gain_range: config.gain_range.clone(),
            n_bootstrap: config.n_bootstrap,
            seed: config.seed,
            sample_ratio: config.sample_ratio,
            aggregation: config.aggregation,
            show_progress: config.show_progress,
        })
    }

    pub fn with_sample_ratio(mut self, sample_ratio: f64) -> Self {
        self.sample_ratio = sample_ratio;
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Row indices of every bootstrap sample. The generator is seeded here,
    /// so repeated calls return the same sequence.
    pub fn bootstrap_indices(&self) -> Result<Vec<Vec<usize>>> {
        let sampler = BootstrapSampler::new(self.data.nrows(), self.sample_ratio)?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        Ok(sampler.draw_many(&mut rng, self.n_bootstrap))
    }

    pub fn get_bootstrap_sample(&self) -> Result<Vec<Array2<f64>>> {
        Ok(self
            .bootstrap_indices()?
            .iter()
            .map(|rows| self.data.select_rows(rows))
            .collect())
    }

    pub fn create_tda_graph(
        &self,
        x: ArrayView2<f64>,
        perc_overlap: f64,
        n_cubes: usize,
    ) -> Result<MapperGraph> {
        self.builder.create_tda_graph(x, perc_overlap, n_cubes)
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        let style = ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} cells ({msg})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
        pb.set_style(style);
        pb
    }

    /// Score every (resolution, gain) pair; the first failure aborts the sweep
    pub fn grid_search(&self) -> Result<GridResult> {
        let n_res = self.res_range.len();
        let n_gain = self.gain_range.len();
        let mut matrix = Array2::<f64>::zeros((n_res, n_gain));

        let bootstrap_samples = self.get_bootstrap_sample()?;
        info!(
            "Grid search: {} resolutions x {} gains, {} bootstrap samples, projector {}",
            n_res,
            n_gain,
            bootstrap_samples.len(),
            self.builder.projector_name()
        );

        let pb = self.progress_bar((n_res * n_gain) as u64);

        for (i, &res) in self.res_range.iter().enumerate() {
            for (j, &gain) in self.gain_range.iter().enumerate() {
                info!(
                    "Iteration res {} of {}, gain {} of {} (n_cubes: {}, overlap: {})",
                    i + 1,
                    n_res,
                    j + 1,
                    n_gain,
                    res,
                    gain
                );
                pb.set_message(format!("res {}, gain {}", res, gain));

                let graphs = bootstrap_samples
                    .iter()
                    .map(|sample| self.create_tda_graph(sample.view(), gain, res))
                    .collect::<Result<Vec<_>>>()?;

                let score = graph_distance_metric(&graphs, self.aggregation)?;
                debug!("Cell ({}, {}) scored {:.4}", i, j, score);
                matrix[[i, j]] = score;

                pb.inc(1);
            }
        }

        pb.finish_with_message("grid search complete");

        Ok(GridResult {
            res_range: self.res_range.clone(),
            gain_range: self.gain_range.clone(),
            aggregation: self.aggregation,
            matrix,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::MapperNode;
    use ndarray::array;

    fn chain(len: usize) -> MapperGraph {
        // consecutive nodes share one member
        MapperGraph::from_nodes(
            (0..len)
                .map(|i| MapperNode {
                    cube: i,
                    cluster: 0,
                    members: vec![i, i + 1],
                })
                .collect(),
        )
    }

    fn star(leaves: usize) -> MapperGraph {
        let mut nodes = vec![MapperNode {
            cube: 0,
            cluster: 0,
            members: (0..leaves).collect(),
        }];
        for i in 0..leaves {
            nodes.push(MapperNode {
                cube: i + 1,
                cluster: 0,
                members: vec![i],
            });
        }
        MapperGraph::from_nodes(nodes)
    }

    #[test]
    fn first_pair_ignores_later_graphs() {
        let graphs = vec![chain(4), chain(4), star(5)];
        let first = graph_distance_metric(&graphs, Aggregation::FirstPair).unwrap();
        assert_eq!(first, 0.0);

        let all = graph_distance_metric(&graphs, Aggregation::AllPairs).unwrap();
        let d = NetSimile.dist(chain(4).graph(), star(5).graph());
        // pairs (0,1)=0, (0,2)=d, (1,2)=d
        assert!((all - 2.0 * d / 3.0).abs() < 1e-12);
    }

    #[test]
    fn one_graph_is_not_enough() {
        assert!(matches!(
            graph_distance_metric(&[chain(3)], Aggregation::FirstPair),
            Err(TuneError::TooFewGraphs(1))
        ));
    }

    #[test]
    fn best_skips_non_finite_scores() {
        let result = GridResult {
            res_range: vec![5, 10],
            gain_range: vec![0.1, 0.2],
            aggregation: Aggregation::FirstPair,
            matrix: array![[0.8, f64::NAN], [0.3, 0.3]],
        };
        assert_eq!(result.best(), Some((10, 0.1, 0.3)));
    }

    #[test]
    fn empty_ranges_give_empty_matrix() {
        let data = Dataset::new(Array2::from_shape_fn((10, 2), |(i, j)| (i * (j + 1)) as f64));
        let tuning = CoverTuning::new(
            data,
            Box::new(crate::projection::Pca),
            vec![],
            vec![0.2, 0.3],
            3,
            0,
        );
        let result = tuning.grid_search().unwrap();
        assert_eq!(result.matrix.dim(), (0, 2));
        assert_eq!(result.best(), None);
    }

    #[test]
    fn bootstrap_indices_repeat_across_calls() {
        let data = Dataset::new(Array2::zeros((30, 2)));
        let tuning = CoverTuning::new(data, Box::new(crate::projection::Pca), vec![], vec![], 4, 9);
        let a = tuning.bootstrap_indices().unwrap();
        let b = tuning.bootstrap_indices().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 4);
        assert!(a.iter().all(|rows| rows.len() == 21));
    }

    #[test]
    fn grid_result_serialises_matrix_as_rows() {
        let result = GridResult {
            res_range: vec![2],
            gain_range: vec![0.1, 0.2],
            aggregation: Aggregation::AllPairs,
            matrix: array![[1.0, 2.0]],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["matrix"], serde_json::json!([[1.0, 2.0]]));
        assert_eq!(json["aggregation"], "all_pairs");
    }
}
