//! Maps a classifier probability to a user-facing verdict with configurable thresholds.

use crate::config::VerdictConfig;
use crate::features::FeatureRecord;
use crate::model::Classifier;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Safe,
    Caution,
    Warning,
    Blocked,
    /// The classifier failed on this record
    Unscored,
}

impl Verdict {
    /// `percent` is the malicious probability scaled to 0..=100; thresholds are exclusive.
    pub fn from_percent(percent: f32, config: &VerdictConfig) -> Self {
        if percent > config.blocked_above {
            Verdict::Blocked
        } else if percent > config.warning_above {
            Verdict::Warning
        } else if percent > config.caution_above {
            Verdict::Caution
        } else {
            Verdict::Safe
        }
    }
}

/// Verdict for a single URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub url: String,
    /// Malicious likelihood, percent; -1 when unscored
    pub score: f32,
    pub verdict: Verdict,
}

pub struct RiskEngine {
    config: VerdictConfig,
}

impl RiskEngine {
    pub fn new(config: VerdictConfig) -> Self {
        Self { config }
    }

    /// `probability` in [0, 1], as returned by a [`Classifier`](crate::model::Classifier).
    pub fn assess(&self, url: impl Into<String>, probability: f32) -> Assessment {
        let score = probability.clamp(0.0, 1.0) * 100.0;
        Assessment {
            url: url.into(),
            score,
            verdict: Verdict::from_percent(score, &self.config),
        }
    }

    /// Run `classifier` on `record`. A model error is logged and gives an unscored
    /// assessment, so one bad record never stops a batch.
    pub fn score(&self, classifier: &dyn Classifier, record: &FeatureRecord) -> Assessment {
        match classifier.score(record) {
            Ok(probability) => self.assess(record.url.as_str(), probability),
            Err(e) => {
                tracing::warn!(url = %record.url, error = %e, "scoring failed");
                self.unscored(record.url.as_str())
            }
        }
    }

    pub fn unscored(&self, url: impl Into<String>) -> Assessment {
        Assessment {
            url: url.into(),
            score: -1.0,
            verdict: Verdict::Unscored,
        }
    }

    pub fn config(&self) -> &VerdictConfig {
        &self.config
    }
}
