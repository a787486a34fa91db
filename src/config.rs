//! Training configuration.
//!
//! With the `serde` feature, [`TrainConfig`] can be read from a JSON file. Missing fields
//! take their [`Default`] values, so a config file only needs the knobs it changes:
//!
//! ```json
//! { "epochs": 2000, "lr": 0.005, "hidden": [32, 16] }
//! ```

#[cfg(feature = "serde")]
use std::path::Path;

use crate::layer::Init;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct TrainConfig {
    pub epochs: usize,
    pub lr: f32,
    /// L2 shrinkage applied after every update: `p -= l2_lambda * p`. `0` disables it.
    pub l2_lambda: f32,
    /// Fraction of parameters (by magnitude) zeroed after training. `0` disables pruning.
    pub prune_ratio: f32,
    /// Record and log an epoch summary every `log_every` epochs.
    pub log_every: usize,
    pub seed: u64,
    /// Hidden layer widths of the policy network.
    pub hidden: Vec<usize>,
    pub init: Init,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 1000,
            lr: 0.01,
            l2_lambda: 0.001,
            prune_ratio: 0.1,
            log_every: 10,
            seed: 0,
            hidden: vec![64, 32],
            init: Init::HeUniform,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be > 0".to_owned()));
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "lr must be finite and > 0, got {}",
                self.lr
            )));
        }
        if !(self.l2_lambda.is_finite() && (0.0..1.0).contains(&self.l2_lambda)) {
            return Err(Error::InvalidConfig(format!(
                "l2_lambda must be finite and in [0, 1), got {}",
                self.l2_lambda
            )));
        }
        if !(self.prune_ratio.is_finite() && (0.0..1.0).contains(&self.prune_ratio)) {
            return Err(Error::InvalidConfig(format!(
                "prune_ratio must be finite and in [0, 1), got {}",
                self.prune_ratio
            )));
        }
        if self.log_every == 0 {
            return Err(Error::InvalidConfig("log_every must be > 0".to_owned()));
        }
        if self.hidden.contains(&0) {
            return Err(Error::InvalidConfig(
                "hidden layer widths must be > 0".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
impl TrainConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| Error::InvalidConfig(format!("failed to parse config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p)
            .map_err(|e| Error::Io(format!("failed to read {}: {e}", p.display())))?;
        Self::from_json_str(&s)
    }

    pub fn to_json_string_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::InvalidConfig(format!("failed to serialize config: {e}")))
    }
}
