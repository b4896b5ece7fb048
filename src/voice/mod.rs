//! Voice command intake
//!
//! The speech model is an external producer: it pushes classification
//! events whenever it likes. This module turns those into debounced lane
//! changes.

pub mod channel;
pub mod model;
pub mod router;

pub use channel::{VoiceInbox, VoiceSender, channel};
pub use model::{ModelError, ModelSource, ModelStatus, validate_bundle};
pub use router::{DropReason, LaneCommand, RouteOutcome, VoiceRouter};

use serde::{Deserialize, Serialize};

/// One classification result from the speech model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationEvent {
    /// Predicted word label; `None` when the producer sent no label
    pub label: Option<String>,
    /// Per-label confidence, in model label order
    #[serde(default)]
    pub scores: Vec<f32>,
}

impl ClassificationEvent {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            scores: Vec::new(),
        }
    }

    /// Pick the top-scoring label (first index on ties).
    ///
    /// Returns `None` when there are no scores or the best score is under
    /// `threshold`, matching a recognizer that only emits confident results.
    pub fn from_scores(labels: &[String], scores: Vec<f32>, threshold: f32) -> Option<Self> {
        let (best, top) = top_score(&scores)?;
        if top < threshold {
            return None;
        }
        Some(Self {
            label: labels.get(best).cloned(),
            scores,
        })
    }

    /// Whether the event clears `threshold`.
    ///
    /// Events without scores were already filtered by their producer and
    /// always pass; scored events need a finite top score of at least
    /// `threshold`.
    pub fn is_confident(&self, threshold: f32) -> bool {
        if self.scores.is_empty() {
            return true;
        }
        top_score(&self.scores).is_some_and(|(_, top)| top >= threshold)
    }
}

/// Index and value of the best finite score; first index on ties
fn top_score(scores: &[f32]) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, s)| s.is_finite())
        .fold(None, |best, (i, s)| match best {
            Some((_, b)) if b >= s => best,
            _ => Some((i, s)),
        })
}
