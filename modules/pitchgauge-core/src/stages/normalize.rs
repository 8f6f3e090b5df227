//! Idea normalization: raw free text to a structured summary.
//!
//! Pure extraction, no judgment. Every downstream stage depends on this
//! one, so a failure here fails the whole run.

use std::sync::Arc;

use async_trait::async_trait;
use model_client::{ModelClient, ModelClientExt, StructuredOutput};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::debug;

use pitchgauge_common::IdeaSummary;

use crate::error::StageError;
use crate::stage::{Stage, StageId};
use crate::state::{EvaluationState, StagePatch};

const NORMALIZE_SYSTEM_PROMPT: &str = r#"You are an analyst whose only task is to extract and normalize a startup idea.

Rules:
- Do NOT evaluate, score, judge, or improve the idea.
- Do NOT suggest alternatives or opinions.
- Do NOT add information not explicitly stated or logically implied.

Convert the startup idea you are given into a structured, factual summary."#;

/// What the model returns for a normalization call.
#[derive(Debug, Deserialize, JsonSchema)]
struct SummaryExtraction {
    /// Core problem being solved
    problem: String,
    /// Primary user or customer segment
    target_user: String,
    /// Proposed solution or product
    solution: String,
    /// Industry or domain
    industry: String,
    /// Key assumptions the idea relies on
    assumptions: Vec<String>,
}

impl StructuredOutput for SummaryExtraction {
    fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("problem", &self.problem),
            ("target_user", &self.target_user),
            ("solution", &self.solution),
            ("industry", &self.industry),
        ] {
            if value.trim().is_empty() {
                return Err(format!("summary field `{field}` is empty"));
            }
        }
        Ok(())
    }
}

pub struct NormalizeStage {
    model: Arc<dyn ModelClient>,
}

impl NormalizeStage {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Stage for NormalizeStage {
    fn id(&self) -> StageId {
        StageId::Normalize
    }

    async fn run(&self, state: EvaluationState) -> Result<StagePatch, StageError> {
        let user = format!("Startup idea:\n{}", state.raw_idea);
        let extracted: SummaryExtraction =
            self.model.extract(NORMALIZE_SYSTEM_PROMPT, &user).await?;

        debug!(industry = %extracted.industry, "idea normalized");

        Ok(StagePatch::Summary(IdeaSummary {
            problem: extracted.problem,
            target_user: extracted.target_user,
            solution: extracted.solution,
            industry: extracted.industry,
            assumptions: extracted.assumptions,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_summary_field_fails_validation() {
        let extraction = SummaryExtraction {
            problem: "expensive furniture".into(),
            target_user: " ".into(),
            solution: "subscription box".into(),
            industry: "office goods".into(),
            assumptions: vec![],
        };
        let err = extraction.validate().unwrap_err();
        assert!(err.contains("target_user"));
    }
}
