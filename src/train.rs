use std::ops::Range;

use rayon::prelude::*;

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::helpers::train_split;
use crate::mlp::MlpClassifier;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    pub learning_rate: f32,
    /// Fraction of the dataset, taken from the front, used for training.
    pub train_split: f64,
    pub epochs: usize,
    /// Examples per loop group. Every example still gets its own update.
    pub batch_size: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            learning_rate: 0.001,
            train_split: 0.8,
            epochs: 20,
            batch_size: 64,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be positive and finite, got {}",
                self.learning_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.train_split) {
            return Err(Error::InvalidConfig(format!(
                "train split must be within [0, 1], got {}",
                self.train_split
            )));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch size must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport {
    pub epoch: usize,
    /// Percentage of held-out examples classified correctly; `None` when nothing is held out.
    pub accuracy: Option<f32>,
    /// Mean cross-entropy over the epoch's training examples, each measured right after its update.
    pub avg_loss: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    pub train_size: usize,
    pub test_size: usize,
    pub epochs: Vec<EpochReport>,
}

impl TrainReport {
    pub fn last(&self) -> Option<&EpochReport> {
        self.epochs.last()
    }
}

impl MlpClassifier {
    /// Online SGD over the leading `train_split` share of `dataset`, evaluating on the rest
    /// after every epoch.
    pub fn train_network(&mut self, dataset: &Dataset, config: &TrainConfig) -> Result<TrainReport> {
        config.validate()?;

        let num_examples = dataset.len();
        let train_size = train_split(num_examples, config.train_split);
        let test_size = num_examples - train_size;
        if train_size == 0 {
            return Err(Error::InvalidConfig(format!(
                "train split {} of {} examples leaves nothing to train on",
                config.train_split, num_examples
            )));
        }
        if test_size == 0 {
            log::warn!("No held-out examples; accuracy will not be reported");
        }

        let mut epochs = Vec::with_capacity(config.epochs);
        for epoch in 0..config.epochs {
            let mut total_loss = 0.0f64;

            for (batch, start) in (0..train_size).step_by(config.batch_size).enumerate() {
                let end = (start + config.batch_size).min(train_size);
                for i in start..end {
                    let input = dataset.normalized(i);
                    let label = dataset.label(i);
                    self.train_single(&input, label, config.learning_rate)?;
                    total_loss += self.loss(&input, label)? as f64;
                }
                log::debug!("Epoch {} batch {}: examples {}..{}", epoch, batch, start, end);
            }

            let accuracy = if test_size > 0 {
                let correct = self.evaluate(dataset, train_size..num_examples)?;
                Some(correct as f32 / test_size as f32 * 100.0)
            } else {
                None
            };
            let avg_loss = (total_loss / train_size as f64) as f32;

            match accuracy {
                Some(acc) => log::info!(
                    "Epoch {} - accuracy: {:.2}%, avg loss: {:.4}",
                    epoch,
                    acc,
                    avg_loss
                ),
                None => log::info!("Epoch {} - avg loss: {:.4}", epoch, avg_loss),
            }
            epochs.push(EpochReport { epoch, accuracy, avg_loss });
        }

        Ok(TrainReport { train_size, test_size, epochs })
    }

    /// Number of examples in `range` whose prediction matches the label.
    /// Predictions run in parallel against the current, unchanging parameters.
    pub fn evaluate(&self, dataset: &Dataset, range: Range<usize>) -> Result<usize> {
        check_range(dataset, &range)?;
        range
            .into_par_iter()
            .map(|i| {
                let predicted = self.predict(&dataset.normalized(i))?;
                Ok(usize::from(predicted == dataset.label(i)))
            })
            .try_reduce(|| 0, |a, b| Ok(a + b))
    }

    /// Mean cross-entropy over `range` without touching the parameters.
    pub fn mean_loss(&self, dataset: &Dataset, range: Range<usize>) -> Result<f32> {
        check_range(dataset, &range)?;
        if range.is_empty() {
            return Ok(0.0);
        }
        let count = range.len();
        let total = range
            .into_par_iter()
            .map(|i| self.loss(&dataset.normalized(i), dataset.label(i)).map(f64::from))
            .try_reduce(|| 0.0, |a, b| Ok(a + b))?;
        Ok((total / count as f64) as f32)
    }
}

fn check_range(dataset: &Dataset, range: &Range<usize>) -> Result<()> {
    if range.start > range.end || range.end > dataset.len() {
        return Err(Error::ShapeMismatch(format!(
            "range {}..{} is outside a dataset of {} examples",
            range.start,
            range.end,
            dataset.len()
        )));
    }
    Ok(())
}
