//! Brute-force k-nearest-neighbor classification over a [`TrainingSet`].

use serde::{Deserialize, Serialize};

use crate::dataset::TrainingSet;
use crate::error::{Error, Result};
use crate::features::FEATURE_LEN;
use crate::labels::LabelCode;

/// Number of neighbors consulted when nothing else is configured.
pub const DEFAULT_K: usize = 3;

/// Classification decision for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// The winning code could not be mapped back to a label name.
    Unrecognized,
    Label(String),
}

impl Decision {
    pub fn label(&self) -> Option<&str> {
        match self {
            Decision::Unrecognized => None,
            Decision::Label(name) => Some(name),
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Unrecognized => f.write_str("unrecognized"),
            Decision::Label(name) => f.write_str(name),
        }
    }
}

/// Classification result with decision and confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub decision: Decision,
    /// Share of the consulted neighbors that voted for the decision, in (0,1].
    pub confidence: f32,
}

/// Outcome of the neighbor vote before the code is resolved to a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vote {
    pub code: LabelCode,
    pub votes: usize,
    pub neighbors: usize,
}

/// Nearest-neighbor classifier holding its training set for its lifetime.
#[derive(Debug, Clone)]
pub struct KnnClassifier {
    k: usize,
    training: TrainingSet,
}

impl KnnClassifier {
    /// Takes ownership of `training` as the model.
    pub fn train(k: usize, training: TrainingSet) -> Result<Self> {
        if k == 0 {
            return Err(Error::InvalidConfig("k must be at least 1".into()));
        }
        if training.is_empty() {
            return Err(Error::EmptyDataset(Default::default()));
        }
        tracing::info!(
            "Trained k={k} classifier on {} samples, {} labels",
            training.len(),
            training.labels().len()
        );
        Ok(Self { k, training })
    }

    /// Replaces the held model. On error the previous model is kept.
    pub fn retrain(&mut self, training: TrainingSet) -> Result<()> {
        *self = Self::train(self.k, training)?;
        Ok(())
    }

    pub fn training_set(&self) -> &TrainingSet {
        &self.training
    }

    /// Runs the neighbor vote for `query` and returns the winning code.
    ///
    /// Neighbors are the `k` samples with the smallest squared Euclidean
    /// distance; equal distances keep training order. The vote goes to the
    /// most frequent code, and equal counts go to the smallest code.
    pub fn predict_code(&self, query: &[f32]) -> Result<Vote> {
        if query.len() != FEATURE_LEN {
            return Err(Error::DimensionMismatch {
                expected: FEATURE_LEN,
                actual: query.len(),
            });
        }

        let mut ranked: Vec<(f32, LabelCode)> = self
            .training
            .samples()
            .iter()
            .map(|(features, code)| (squared_distance(query, features), *code))
            .collect();
        // stable: ties stay in training order
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

        let neighbors = self.k.min(ranked.len());
        let mut counts = vec![0usize; self.training.labels().len()];
        for &(_, code) in &ranked[..neighbors] {
            if let Some(count) = counts.get_mut(code) {
                *count += 1;
            }
        }

        let mut best: Option<(LabelCode, usize)> = None;
        for (code, &votes) in counts.iter().enumerate() {
            if votes > best.map_or(0, |(_, v)| v) {
                best = Some((code, votes));
            }
        }
        // counts is indexed by a code every sample carries, so a winner exists
        let (code, votes) = best.ok_or(Error::EmptyDataset(Default::default()))?;
        Ok(Vote {
            code,
            votes,
            neighbors,
        })
    }

    /// Classifies a feature vector, resolving the winning code to its name.
    pub fn predict(&self, query: &[f32]) -> Result<Classification> {
        let vote = self.predict_code(query)?;
        let decision = match self.training.labels().code_to_name(vote.code) {
            Ok(name) => Decision::Label(name.to_string()),
            Err(e) => {
                tracing::warn!("Winning label cannot be resolved: {e}");
                Decision::Unrecognized
            }
        };
        Ok(Classification {
            decision,
            confidence: vote.votes as f32 / vote.neighbors as f32,
        })
    }
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
