//! mapper-tune: stability-driven tuning of Mapper cover parameters
//!
//! For every (resolution, gain) pair of a grid, Mapper graphs are built on
//! bootstrap resamples of the data and compared with the NetSimile graph
//! distance. The resulting matrix shows which cover keeps the graph shape
//! most stable. A second entry point summarises the node-level structure of
//! a single graph.

pub mod bootstrap;
pub mod clustering;
pub mod config;
pub mod cover;
pub mod dataset;
pub mod error;
pub mod mapper;
pub mod netsimile;
pub mod projection;
pub mod properties;
pub mod report;
pub mod tuning;

pub use config::TuningConfig;
pub use dataset::Dataset;
pub use error::{Result, TuneError};
pub use mapper::{MapperBuilder, MapperGraph, MapperNode};
pub use netsimile::NetSimile;
pub use projection::{Pca, Projector, ProjectorKind, RandomProjection};
pub use properties::{FeatureStatsTable, GraphProperties};
pub use tuning::{graph_distance_metric, Aggregation, CoverTuning, GridResult};
