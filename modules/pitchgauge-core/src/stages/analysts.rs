//! The four scoring analysts: one stage shape, four framings.
//!
//! Each analyst owns exactly three metrics, and its framing explicitly
//! excludes the other analysts' concerns so no dimension is scored twice.
//! That partition is what keeps the four concurrent metric-map
//! contributions disjoint.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use model_client::{ModelClient, ModelClientExt, ModelError, StructuredOutput};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::debug;

use pitchgauge_common::Metric;

use crate::error::StageError;
use crate::stage::{Stage, StageId};
use crate::state::{EvaluationState, StagePatch};

const PRODUCT_SYSTEM_PROMPT: &str = r#"You are a startup product analyst.

Your task is to evaluate the PRODUCT QUALITY and ORIGINALITY of a startup idea.

Rules:
- Base your analysis ONLY on the provided idea summary.
- Do NOT evaluate market size, cost, or execution feasibility.
- Do NOT assume proprietary data unless explicitly stated.
- Be critical but fair.

Score each metric from 0 to 10 and provide a brief justification.

Metrics:
1. originality – How novel or unique is the idea?
2. problem_solution_fit – How well does the solution address the stated problem?
3. differentiation – How clearly differentiated is this from existing solutions?"#;

const MARKET_SYSTEM_PROMPT: &str = r#"You are a market research analyst.

Your task is to evaluate the MARKET POTENTIAL of a startup idea.

Rules:
- Base your analysis ONLY on the provided idea summary.
- Use reasonable industry heuristics when exact data is unavailable.
- Do NOT evaluate product originality or technical difficulty.
- Avoid optimism bias.

Score each metric from 0 to 10 and provide a brief justification.

Metrics:
1. market_size – Estimated total addressable market.
2. market_growth – Expected growth rate of the market.
3. customer_willingness_to_pay – Likelihood that customers will pay for this solution."#;

const MOAT_SYSTEM_PROMPT: &str = r#"You are a competitive strategy analyst.

Your task is to evaluate how DEFENSIBLE a startup idea is.

Rules:
- Assume competitors are rational and well-funded.
- Do NOT assume patents or proprietary data unless stated.
- Focus on long-term competitive advantage.
- Higher scores mean stronger defensibility.

Score each metric from 0 to 10 and provide a brief justification.

Metrics:
1. ease_of_duplication – How difficult is it for competitors to copy this?
2. defensibility – Strength of long-term competitive moat.
3. switching_costs – Difficulty for users to switch away once adopted."#;

const EXECUTION_SYSTEM_PROMPT: &str = r#"You are a startup execution and operations analyst.

Your task is to evaluate how FEASIBLE it is to build and scale this startup.

Rules:
- Assume a small but competent founding team.
- Do NOT evaluate market size or originality.
- Consider infrastructure, talent, and operational complexity.
- Higher scores mean easier execution.

Score each metric from 0 to 10 and provide a brief justification.

Metrics:
1. execution_complexity – Difficulty of building the product.
2. cost_feasibility – Likelihood of building sustainably at reasonable cost.
3. scalability – Ability to scale without proportional cost increase."#;

/// What the model returns for one analyst call.
#[derive(Debug, Deserialize, JsonSchema)]
struct AnalystOutput {
    /// Metric scores between 0 and 10
    metric_scores: BTreeMap<String, f64>,
    /// Justification for each metric score
    metric_rationales: BTreeMap<String, String>,
}

impl StructuredOutput for AnalystOutput {
    fn validate(&self) -> Result<(), String> {
        for (name, score) in &self.metric_scores {
            if !score.is_finite() || !(0.0..=10.0).contains(score) {
                return Err(format!("score for `{name}` is outside [0, 10]: {score}"));
            }
        }
        Ok(())
    }
}

pub struct AnalystStage {
    id: StageId,
    system_prompt: &'static str,
    owned: [Metric; 3],
    model: Arc<dyn ModelClient>,
}

impl AnalystStage {
    pub fn product(model: Arc<dyn ModelClient>) -> Self {
        Self {
            id: StageId::ProductAnalyst,
            system_prompt: PRODUCT_SYSTEM_PROMPT,
            owned: [
                Metric::Originality,
                Metric::ProblemSolutionFit,
                Metric::Differentiation,
            ],
            model,
        }
    }

    pub fn market(model: Arc<dyn ModelClient>) -> Self {
        Self {
            id: StageId::MarketAnalyst,
            system_prompt: MARKET_SYSTEM_PROMPT,
            owned: [
                Metric::MarketSize,
                Metric::MarketGrowth,
                Metric::CustomerWillingnessToPay,
            ],
            model,
        }
    }

    pub fn moat(model: Arc<dyn ModelClient>) -> Self {
        Self {
            id: StageId::MoatAnalyst,
            system_prompt: MOAT_SYSTEM_PROMPT,
            owned: [
                Metric::EaseOfDuplication,
                Metric::Defensibility,
                Metric::SwitchingCosts,
            ],
            model,
        }
    }

    pub fn execution(model: Arc<dyn ModelClient>) -> Self {
        Self {
            id: StageId::ExecutionAnalyst,
            system_prompt: EXECUTION_SYSTEM_PROMPT,
            owned: [
                Metric::ExecutionComplexity,
                Metric::CostFeasibility,
                Metric::Scalability,
            ],
            model,
        }
    }

    /// Map the model's string-keyed output onto this analyst's three owned
    /// metrics. Anything missing or extra is a shape failure.
    fn convert(
        &self,
        output: AnalystOutput,
    ) -> Result<(BTreeMap<Metric, f64>, BTreeMap<Metric, String>), ModelError> {
        let AnalystOutput {
            mut metric_scores,
            mut metric_rationales,
        } = output;

        let mut scores = BTreeMap::new();
        let mut rationales = BTreeMap::new();
        for metric in self.owned {
            let score = metric_scores
                .remove(metric.as_str())
                .ok_or_else(|| ModelError::Shape(format!("missing score for `{metric}`")))?;
            let rationale = metric_rationales
                .remove(metric.as_str())
                .ok_or_else(|| ModelError::Shape(format!("missing rationale for `{metric}`")))?;
            scores.insert(metric, score);
            rationales.insert(metric, rationale);
        }

        if let Some(stray) = metric_scores
            .into_keys()
            .chain(metric_rationales.into_keys())
            .next()
        {
            return Err(ModelError::Shape(format!(
                "unexpected metric `{stray}` from {}",
                self.id
            )));
        }

        Ok((scores, rationales))
    }
}

#[async_trait]
impl Stage for AnalystStage {
    fn id(&self) -> StageId {
        self.id
    }

    async fn run(&self, state: EvaluationState) -> Result<StagePatch, StageError> {
        let summary = state
            .idea_summary
            .ok_or(StageError::MissingInput("idea_summary"))?;

        let user = format!("Startup idea summary:\n{summary}");
        let output: AnalystOutput = self.model.extract(self.system_prompt, &user).await?;
        let (scores, rationales) = self.convert(output)?;

        debug!(stage = %self.id, ?scores, "analyst scored");

        Ok(StagePatch::MetricContribution { scores, rationales })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;

    fn output(entries: &[(&str, f64)]) -> AnalystOutput {
        AnalystOutput {
            metric_scores: entries
                .iter()
                .map(|(name, score)| (name.to_string(), *score))
                .collect(),
            metric_rationales: entries
                .iter()
                .map(|(name, _)| (name.to_string(), format!("{name} justified")))
                .collect(),
        }
    }

    fn product_stage() -> AnalystStage {
        AnalystStage::product(Arc::new(ScriptedModel::new()))
    }

    #[test]
    fn convert_accepts_exactly_the_owned_metrics() {
        let stage = product_stage();
        let (scores, rationales) = stage
            .convert(output(&[
                ("originality", 6.0),
                ("problem_solution_fit", 7.0),
                ("differentiation", 5.0),
            ]))
            .unwrap();

        assert_eq!(scores[&Metric::Originality], 6.0);
        assert_eq!(scores.len(), 3);
        assert_eq!(rationales.len(), 3);
    }

    #[test]
    fn convert_rejects_missing_metric() {
        let stage = product_stage();
        let err = stage
            .convert(output(&[("originality", 6.0), ("differentiation", 5.0)]))
            .unwrap_err();
        assert!(err.to_string().contains("problem_solution_fit"));
    }

    #[test]
    fn convert_rejects_metric_owned_by_another_stage() {
        let stage = product_stage();
        let err = stage
            .convert(output(&[
                ("originality", 6.0),
                ("problem_solution_fit", 7.0),
                ("differentiation", 5.0),
                ("market_size", 4.0),
            ]))
            .unwrap_err();
        assert!(err.to_string().contains("market_size"));
    }

    #[test]
    fn out_of_range_score_fails_validation() {
        let bad = output(&[("originality", 11.0)]);
        assert!(bad.validate().is_err());

        let nan = AnalystOutput {
            metric_scores: BTreeMap::from([("originality".to_string(), f64::NAN)]),
            metric_rationales: BTreeMap::new(),
        };
        assert!(nan.validate().is_err());
    }
}
