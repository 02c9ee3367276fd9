use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::bootstrap::DEFAULT_SAMPLE_RATIO;
use crate::error::{Result, TuneError};
use crate::mapper::{DEFAULT_EPS_PERCENTILE, DEFAULT_MIN_SAMPLES};
use crate::projection::ProjectorKind;
use crate::tuning::Aggregation;

/// Settings of one grid search, as read from a JSON file
///
/// Every field except the two ranges has a default, so a minimal file is
/// `{"res_range": [5, 10], "gain_range": [0.2, 0.3]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    pub res_range: Vec<usize>,
    pub gain_range: Vec<f64>,
    pub n_bootstrap: usize,
    pub seed: u64,
    pub sample_ratio: f64,
    pub projector: ProjectorKind,
    pub aggregation: Aggregation,
    pub eps_percentile: f64,
    pub min_samples: usize,
    pub show_progress: bool,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            res_range: Vec::new(),
            gain_range: Vec::new(),
            n_bootstrap: 10,
            seed: 42,
            sample_ratio: DEFAULT_SAMPLE_RATIO,
            projector: ProjectorKind::default(),
            aggregation: Aggregation::default(),
            eps_percentile: DEFAULT_EPS_PERCENTILE,
            min_samples: DEFAULT_MIN_SAMPLES,
            show_progress: true,
        }
    }
}

impl TuningConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that can never produce a result. Cover parameters are
    /// left to the cover itself.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.eps_percentile) {
            return Err(TuneError::InvalidParameter(format!(
                "eps_percentile must lie in [0, 100], got {}",
                self.eps_percentile
            )));
        }
        if self.min_samples == 0 {
            return Err(TuneError::InvalidParameter(
                "min_samples must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
