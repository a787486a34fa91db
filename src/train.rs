//! The training driver: full-batch descent with L2 shrinkage, progress history, and
//! post-training pruning.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::TrainConfig;
use crate::data::Dataset;
use crate::loss::mse;
use crate::metrics::accuracy;
use crate::network::NeuralNetwork;
use crate::regularize::{apply_l2_shrinkage, prune_by_magnitude};
use crate::{Error, Result};

/// Score added to the negated loss when reporting a reward-style progress number.
pub const REWARD_BASELINE: f32 = 100.0;

/// One row of training history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochRecord {
    pub epoch: usize,
    pub loss: f32,
    /// `REWARD_BASELINE - loss`.
    pub reward: f32,
    /// Arg-max accuracy in percent, measured on the pre-update prediction.
    pub accuracy: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    /// Every `log_every`-th epoch, starting at epoch 0.
    pub history: Vec<EpochRecord>,
    pub final_loss: f32,
    pub final_accuracy: f32,
    /// Parameters zeroed by the post-training prune.
    pub pruned: usize,
}

impl FitReport {
    /// Write the history as CSV with an `epoch,reward,precision` header.
    pub fn write_csv<W: Write>(&self, out: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(["epoch", "reward", "precision"])?;
        for r in &self.history {
            wtr.write_record([r.epoch.to_string(), r.reward.to_string(), r.accuracy.to_string()])?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let p = path.as_ref();
        let file =
            File::create(p).map_err(|e| Error::Io(format!("failed to create {}: {e}", p.display())))?;
        self.write_csv(BufWriter::new(file))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalReport {
    pub loss: f32,
    pub accuracy: f32,
}

impl NeuralNetwork {
    /// Train on `train` as configured.
    ///
    /// Each epoch runs one full-batch step, then applies L2 shrinkage to every parameter.
    /// After the last epoch the smallest `prune_ratio` of parameters by magnitude are zeroed.
    pub fn fit(&mut self, train: &Dataset, cfg: &TrainConfig) -> Result<FitReport> {
        cfg.validate()?;
        if self.num_layers() == 0 {
            return Err(Error::logic("neural network has no layers"));
        }

        let x = train.inputs();
        let y = train.targets();
        let mut history = Vec::with_capacity(cfg.epochs.div_ceil(cfg.log_every));
        let mut final_loss = 0.0;
        let mut final_accuracy = 0.0;

        for epoch in 0..cfg.epochs {
            let (loss, pred) = self.step_with_prediction(x, y, cfg.lr)?;
            let acc = accuracy(&pred, y)?;
            apply_l2_shrinkage(self, cfg.l2_lambda)?;

            log::debug!("epoch {epoch}: loss={loss:.6} accuracy={acc:.2}%");
            if epoch % cfg.log_every == 0 {
                let record = EpochRecord {
                    epoch,
                    loss,
                    reward: REWARD_BASELINE - loss,
                    accuracy: acc,
                };
                log::info!(
                    "epoch {epoch} | reward {:.4} | precision {acc:.2}%",
                    record.reward
                );
                history.push(record);
            }
            final_loss = loss;
            final_accuracy = acc;
        }

        let pruned = prune_by_magnitude(self, cfg.prune_ratio)?;
        log::info!(
            "training finished after {} epochs: loss={final_loss:.6}, pruned {pruned} parameters ({:.0}% ratio)",
            cfg.epochs,
            cfg.prune_ratio * 100.0
        );

        Ok(FitReport {
            history,
            final_loss,
            final_accuracy,
            pruned,
        })
    }

    /// Loss and accuracy of the current parameters on `data`, without training.
    pub fn evaluate(&self, data: &Dataset) -> Result<EvalReport> {
        let pred = self.predict(data.inputs())?;
        Ok(EvalReport {
            loss: mse(&pred, data.targets())?,
            accuracy: accuracy(&pred, data.targets())?,
        })
    }
}
