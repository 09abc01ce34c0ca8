use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// One class score reported by the external classifier for a video frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub class_name: String,
    pub confidence: f64,
}

impl Sample {
    pub fn new(class_name: impl Into<String>, confidence: f64) -> Self {
        Self {
            class_name: class_name.into(),
            confidence,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.class_name.is_empty() {
            return Err(ValidationError::EmptyClassName);
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(ValidationError::ConfidenceOutOfRange(self.confidence));
        }
        Ok(())
    }
}

/// Pick the frame's dominant score: highest confidence wins, ties go to the
/// first-seen score so selection stays deterministic.
pub fn top_sample(scores: &[Sample]) -> Option<&Sample> {
    let mut best: Option<&Sample> = None;
    for score in scores {
        match best {
            Some(current) if score.confidence <= current.confidence => {}
            _ => best = Some(score),
        }
    }
    best
}
