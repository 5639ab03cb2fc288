//! Hallucination Vulnerability Index: weighted blend of similarity and grounding.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// HVI weights; must be non-negative and sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HviWeights {
    #[serde(default = "default_similarity_weight")]
    pub similarity_weight: f64,
    #[serde(default = "default_grounding_weight")]
    pub grounding_weight: f64,
}

fn default_similarity_weight() -> f64 {
    0.4
}

fn default_grounding_weight() -> f64 {
    0.6
}

impl Default for HviWeights {
    fn default() -> Self {
        Self {
            similarity_weight: default_similarity_weight(),
            grounding_weight: default_grounding_weight(),
        }
    }
}

impl HviWeights {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.similarity_weight < 0.0 || self.grounding_weight < 0.0 {
            return Err(ConfigError::Invalid {
                message: "hvi weights must be non-negative".into(),
            });
        }
        let sum = self.similarity_weight + self.grounding_weight;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::Invalid {
                message: format!("hvi weights must sum to 1, got {sum}"),
            });
        }
        Ok(())
    }

    /// Combine the two signals; both are clamped into [0, 1] first.
    pub fn combine(&self, similarity: f64, grounding: f64) -> f64 {
        let similarity = clamp_unit(similarity);
        let grounding = clamp_unit(grounding);
        self.similarity_weight * similarity + self.grounding_weight * grounding
    }
}

/// HVI under the default (grounding-heavy) weights.
pub fn hvi(similarity: f64, grounding: f64) -> f64 {
    HviWeights::default().combine(similarity, grounding)
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
