use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use peakrep_core::PeakRepError;
use peakrep_core::consts::DEFAULT_SCALES;

use crate::correction::CorrectionMethod;
use crate::scoring::{ScorerType, SelfNormalization};

///
/// Configuration for one scoring run.
///
/// # Example
/// ```toml
/// workers = 8
/// p_value_cutoff = 1e-5
/// self_normalize = true
/// scorer = "lambda_table"
/// correction = "storey_bootstrap_spline"
/// scales = [1000, 5000, 10000]
/// seed = 42
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    pub workers: usize,
    pub p_value_cutoff: f64,
    pub self_normalize: bool,
    pub scorer: ScorerType,
    pub correction: CorrectionMethod,
    pub scales: Vec<u32>,
    pub seed: Option<u64>,
    pub q_value_cutoff: f64,
    pub progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism().map_or(1, |n| n.get()),
            p_value_cutoff: 1e-5,
            self_normalize: false,
            scorer: ScorerType::default(),
            correction: CorrectionMethod::default(),
            scales: DEFAULT_SCALES.to_vec(),
            seed: None,
            q_value_cutoff: 0.05,
            progress: false,
        }
    }
}

impl RunConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), PeakRepError> {
        if self.workers == 0 {
            return Err(PeakRepError::InvalidParameter(
                "workers must be positive".to_string(),
            ));
        }
        if !(self.p_value_cutoff > 0.0 && self.p_value_cutoff <= 1.0) {
            return Err(PeakRepError::InvalidParameter(format!(
                "p_value_cutoff must lie in (0, 1], got {}",
                self.p_value_cutoff
            )));
        }
        if !(0.0..=1.0).contains(&self.q_value_cutoff) {
            return Err(PeakRepError::InvalidParameter(format!(
                "q_value_cutoff must lie in [0, 1], got {}",
                self.q_value_cutoff
            )));
        }
        if self.scales.is_empty() {
            return Err(PeakRepError::InvalidParameter(
                "at least one neighborhood scale is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn normalization(&self) -> SelfNormalization {
        if self.self_normalize {
            SelfNormalization::with_cutoff(self.p_value_cutoff)
        } else {
            SelfNormalization::disabled()
        }
    }
}
