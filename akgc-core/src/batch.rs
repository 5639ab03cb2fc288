//! Batch evaluation: many independent corrections with per-item isolation.
//!
//! A failed item never aborts the run. It is recorded as the failure
//! sentinel together with the error text, and the remaining items carry on.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::error::Result;
use crate::knowledge::SourceCounts;
use crate::metrics::{exact_match_accuracy, rouge_l};
use crate::persistence::save_json;
use crate::policy::{CorrectionPolicy, CorrectionResult};

/// Response recorded for an item whose correction failed.
pub const FAILURE_SENTINEL: &str = "[correction failed]";

/// One evaluation input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub prompt: String,
    #[serde(default)]
    pub ground_truth: Option<String>,
}

impl Sample {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ground_truth: None,
        }
    }

    pub fn with_ground_truth(mut self, truth: impl Into<String>) -> Self {
        self.ground_truth = Some(truth.into());
        self
    }
}

/// Load samples from a JSON array of `{ "prompt", "ground_truth" }` objects.
pub fn load_samples(path: &Path) -> Result<Vec<Sample>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn failure_sentinel() -> CorrectionResult {
    CorrectionResult {
        response: FAILURE_SENTINEL.to_string(),
        is_factual: false,
        hvi: 0.0,
    }
}

/// Per-sample outcome.
#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub index: usize,
    pub prompt: String,
    #[serde(flatten)]
    pub result: CorrectionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rouge_l: Option<f64>,
}

impl BatchItem {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub failures: usize,
    pub corrections: usize,
    /// Mean HVI over items that did not fail.
    pub mean_hvi: f64,
    /// Means over items with a ground truth; `None` when there are none.
    pub mean_accuracy: Option<f64>,
    pub mean_rouge_l: Option<f64>,
    pub sources: SourceCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn write(&self, path: &Path) -> Result<()> {
        save_json(path, self)?;
        Ok(())
    }
}

/// Correct every sample with at most `concurrency` calls in flight.
/// Items come back in input order.
pub async fn evaluate_batch(
    policy: &CorrectionPolicy,
    samples: &[Sample],
    concurrency: usize,
) -> BatchReport {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    tracing::info!(%run_id, samples = samples.len(), concurrency, "Starting batch evaluation");

    let items: Vec<BatchItem> = stream::iter(samples.iter().enumerate())
        .map(|(index, sample)| evaluate_one(policy, index, sample))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let summary = summarize(run_id, started_at, &items, policy.fact_provider().stats());
    tracing::info!(
        %run_id,
        total = summary.total,
        failures = summary.failures,
        corrections = summary.corrections,
        mean_hvi = summary.mean_hvi,
        "Batch evaluation complete"
    );
    BatchReport { summary, items }
}

async fn evaluate_one(policy: &CorrectionPolicy, index: usize, sample: &Sample) -> BatchItem {
    let (result, error) = match policy.correct(&sample.prompt).await {
        Ok(result) => (result, None),
        Err(e) => {
            tracing::warn!(index, prompt = %sample.prompt, error = %e, "Correction failed, recording sentinel");
            (failure_sentinel(), Some(e.to_string()))
        }
    };
    let accuracy = sample
        .ground_truth
        .as_deref()
        .map(|truth| exact_match_accuracy(&result.response, truth));
    let rouge = sample
        .ground_truth
        .as_deref()
        .map(|truth| rouge_l(&result.response, truth));
    BatchItem {
        index,
        prompt: sample.prompt.clone(),
        result,
        error,
        accuracy,
        rouge_l: rouge,
    }
}

fn summarize(
    run_id: Uuid,
    started_at: DateTime<Utc>,
    items: &[BatchItem],
    sources: SourceCounts,
) -> BatchSummary {
    let succeeded: Vec<&BatchItem> = items.iter().filter(|i| !i.is_failure()).collect();
    let corrections = succeeded.iter().filter(|i| !i.result.is_factual).count();
    let mean_hvi = mean(succeeded.iter().map(|i| i.result.hvi)).unwrap_or(0.0);

    BatchSummary {
        run_id,
        started_at,
        finished_at: Utc::now(),
        total: items.len(),
        failures: items.len() - succeeded.len(),
        corrections,
        mean_hvi,
        mean_accuracy: mean(items.iter().filter_map(|i| i.accuracy)),
        mean_rouge_l: mean(items.iter().filter_map(|i| i.rouge_l)),
        sources,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}
