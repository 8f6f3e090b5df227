//! Deterministic weighted aggregation. No model call, no randomness.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::debug;

use pitchgauge_common::Metric;

use crate::error::{PreconditionError, StageError};
use crate::stage::{Stage, StageId};
use crate::state::{EvaluationState, StagePatch, SynthesisInput};

/// Missing-key policy for aggregation. `Strict` (the default) fails when
/// any of the twelve metrics is absent; `Lenient` scores what is there,
/// treating missing metrics as zero-weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AggregationMode {
    #[default]
    Strict,
    Lenient,
}

pub struct AggregateStage {
    mode: AggregationMode,
}

impl AggregateStage {
    pub fn new(mode: AggregationMode) -> Self {
        Self { mode }
    }
}

/// Weighted composite over [0, 10] metrics, rescaled to [0, 100] and
/// rounded to two decimals.
pub fn composite_score(scores: &BTreeMap<Metric, f64>) -> f64 {
    let weighted: f64 = scores
        .iter()
        .map(|(metric, score)| score * metric.weight())
        .sum();
    (weighted * 10.0 * 100.0).round() / 100.0
}

#[async_trait]
impl Stage for AggregateStage {
    fn id(&self) -> StageId {
        StageId::Aggregate
    }

    async fn run(&self, state: EvaluationState) -> Result<StagePatch, StageError> {
        let idea_summary = state
            .idea_summary
            .ok_or(StageError::MissingInput("idea_summary"))?;

        if self.mode == AggregationMode::Strict {
            for metric in Metric::ALL {
                if !state.metric_scores.contains_key(&metric) {
                    return Err(PreconditionError { missing: metric }.into());
                }
            }
        }

        let final_score = composite_score(&state.metric_scores);
        debug!(final_score, "aggregated metric scores");

        Ok(StagePatch::Aggregation {
            final_score,
            synthesis_input: SynthesisInput {
                idea_summary,
                metric_scores: state.metric_scores,
                metric_rationales: state.metric_rationales,
                final_score,
            },
        })
    }
}
