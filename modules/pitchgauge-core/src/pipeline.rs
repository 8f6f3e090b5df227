//! Public evaluator API: builds the task graph and runs one evaluation.

use std::sync::Arc;
use std::time::Instant;

use model_client::ModelClient;
use tracing::{error, info};
use uuid::Uuid;

use pitchgauge_common::EvaluationResult;

use crate::error::PipelineError;
use crate::graph::TaskGraph;
use crate::stage::StageId;
use crate::stages::{
    AggregateStage, AggregationMode, AnalystStage, NormalizeStage, SynthesizeStage,
};
use crate::state::EvaluationState;

/// Startup-idea evaluator.
///
/// Holds the one shared model adapter; every stage receives it by
/// reference at graph-build time, so there is exactly one client per
/// evaluator regardless of how many runs it serves. A run keeps no state
/// across invocations.
pub struct Evaluator {
    model: Arc<dyn ModelClient>,
    mode: AggregationMode,
}

impl Evaluator {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self {
            model,
            mode: AggregationMode::Strict,
        }
    }

    pub fn with_aggregation_mode(mut self, mode: AggregationMode) -> Self {
        self.mode = mode;
        self
    }

    fn build_graph(&self) -> TaskGraph {
        let mut graph = TaskGraph::new();
        graph.add_stage(Arc::new(NormalizeStage::new(self.model.clone())));
        graph.add_stage(Arc::new(AnalystStage::product(self.model.clone())));
        graph.add_stage(Arc::new(AnalystStage::market(self.model.clone())));
        graph.add_stage(Arc::new(AnalystStage::moat(self.model.clone())));
        graph.add_stage(Arc::new(AnalystStage::execution(self.model.clone())));
        graph.add_stage(Arc::new(AggregateStage::new(self.mode)));
        graph.add_stage(Arc::new(SynthesizeStage::new(self.model.clone())));

        let analysts = [
            StageId::ProductAnalyst,
            StageId::MarketAnalyst,
            StageId::MoatAnalyst,
            StageId::ExecutionAnalyst,
        ];
        for analyst in analysts {
            graph.add_edge(StageId::Normalize, analyst);
            graph.add_edge(analyst, StageId::Aggregate);
        }
        graph.add_edge(StageId::Aggregate, StageId::Synthesize);
        graph
    }

    /// Evaluate one raw idea. Returns the complete result or the first
    /// stage failure; never a partially populated result.
    pub async fn run(&self, raw_idea: &str) -> Result<EvaluationResult, PipelineError> {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        info!(%run_id, "evaluation started");

        let mut state = EvaluationState::new(raw_idea);
        if let Err(e) = self.build_graph().execute(&mut state).await {
            error!(%run_id, stage = ?e.stage().map(|s| s.to_string()), error = %e, "evaluation failed");
            return Err(e);
        }

        let (final_score, swot) = match (state.final_score, state.swot) {
            (Some(score), Some(swot)) => (score, swot),
            _ => {
                return Err(PipelineError::Aborted(
                    "run finished without a complete result".into(),
                ))
            }
        };

        info!(
            %run_id,
            final_score,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "evaluation complete"
        );

        Ok(EvaluationResult {
            final_score,
            metric_scores: state.metric_scores,
            swot,
        })
    }
}
