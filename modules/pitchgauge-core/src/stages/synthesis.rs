//! SWOT synthesis from the aggregation bundle.

use std::sync::Arc;

use async_trait::async_trait;
use model_client::{ModelClient, ModelClientExt, StructuredOutput};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::debug;

use pitchgauge_common::SwotReport;

use crate::error::StageError;
use crate::stage::{Stage, StageId};
use crate::state::{EvaluationState, StagePatch};

const SWOT_SYSTEM_PROMPT: &str = r#"You are a startup strategy analyst.

Generate a SWOT analysis using the evaluation data you are given.

Rules:
- Do NOT rescore or recompute metrics.
- Do NOT introduce new facts.
- Be concise and specific.
- Output exactly four lists: strengths, weaknesses, opportunities, threats."#;

/// What the model returns for a synthesis call. A reply missing any of the
/// four lists fails shape validation at the adapter.
#[derive(Debug, Deserialize, JsonSchema)]
struct SwotOutput {
    /// Internal advantages of the startup
    strengths: Vec<String>,
    /// Internal limitations or gaps
    weaknesses: Vec<String>,
    /// External factors the startup can leverage
    opportunities: Vec<String>,
    /// External risks or competitive pressures
    threats: Vec<String>,
}

impl StructuredOutput for SwotOutput {}

pub struct SynthesizeStage {
    model: Arc<dyn ModelClient>,
}

impl SynthesizeStage {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Stage for SynthesizeStage {
    fn id(&self) -> StageId {
        StageId::Synthesize
    }

    async fn run(&self, state: EvaluationState) -> Result<StagePatch, StageError> {
        let input = state
            .synthesis_input
            .ok_or(StageError::MissingInput("synthesis_input"))?;

        let user = format!("Evaluation data:\n{input}");
        let output: SwotOutput = self.model.extract(SWOT_SYSTEM_PROMPT, &user).await?;

        debug!(
            strengths = output.strengths.len(),
            weaknesses = output.weaknesses.len(),
            opportunities = output.opportunities.len(),
            threats = output.threats.len(),
            "swot synthesized"
        );

        Ok(StagePatch::Swot(SwotReport {
            strengths: output.strengths,
            weaknesses: output.weaknesses,
            opportunities: output.opportunities,
            threats: output.threats,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn synthesis_requires_the_aggregation_bundle() {
        let stage = SynthesizeStage::new(Arc::new(crate::testing::ScriptedModel::new()));
        let err = stage
            .run(EvaluationState::new("idea"))
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::MissingInput("synthesis_input")));
    }

    #[test]
    fn reply_missing_a_list_fails_deserialization() {
        let partial = serde_json::json!({
            "strengths": ["niche focus"],
            "weaknesses": [],
            "opportunities": []
        });
        assert!(serde_json::from_value::<SwotOutput>(partial).is_err());
    }
}
