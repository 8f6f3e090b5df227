//! Shared evaluation state and its merge rules.
//!
//! Stages never mutate this record directly: each returns a [`StagePatch`]
//! carrying only the fields it owns, and the orchestrator merges patches
//! one at a time. Singly-owned fields reject a second write; the two metric
//! maps take key-union contributions from the four analysts and reject any
//! overlapping key. Either rejection means the graph is miswired, so the
//! run aborts instead of silently keeping one of the values.

use std::collections::BTreeMap;

use thiserror::Error;

use pitchgauge_common::{IdeaSummary, Metric, SwotReport};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("field `{0}` written twice")]
    DuplicateWrite(&'static str),

    #[error("metric `{0}` contributed by more than one stage")]
    MetricCollision(Metric),
}

/// Bundle assembled by aggregation for the synthesis stage.
#[derive(Debug, Clone)]
pub struct SynthesisInput {
    pub idea_summary: IdeaSummary,
    pub metric_scores: BTreeMap<Metric, f64>,
    pub metric_rationales: BTreeMap<Metric, String>,
    pub final_score: f64,
}

impl std::fmt::Display for SynthesisInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.idea_summary)?;
        writeln!(f, "Final score: {}/100", self.final_score)?;
        writeln!(f, "Metric scores and rationales:")?;
        for (metric, score) in &self.metric_scores {
            let rationale = self
                .metric_rationales
                .get(metric)
                .map(String::as_str)
                .unwrap_or("");
            writeln!(f, "- {metric}: {score}/10 ({rationale})")?;
        }
        Ok(())
    }
}

/// Partial update produced by one stage.
#[derive(Debug, Clone)]
pub enum StagePatch {
    Summary(IdeaSummary),
    MetricContribution {
        scores: BTreeMap<Metric, f64>,
        rationales: BTreeMap<Metric, String>,
    },
    Aggregation {
        final_score: f64,
        synthesis_input: SynthesisInput,
    },
    Swot(SwotReport),
}

/// The record threaded through a single pipeline run.
///
/// Created with only `raw_idea` set; fields fill in monotonically as stages
/// complete, and the whole record is dropped when the run returns.
#[derive(Debug, Clone, Default)]
pub struct EvaluationState {
    pub raw_idea: String,
    pub idea_summary: Option<IdeaSummary>,
    pub metric_scores: BTreeMap<Metric, f64>,
    pub metric_rationales: BTreeMap<Metric, String>,
    pub final_score: Option<f64>,
    pub synthesis_input: Option<SynthesisInput>,
    pub swot: Option<SwotReport>,
}

impl EvaluationState {
    pub fn new(raw_idea: impl Into<String>) -> Self {
        Self {
            raw_idea: raw_idea.into(),
            ..Default::default()
        }
    }

    /// Merge one stage's output. Overwrite fields have exactly one writer;
    /// the metric maps take a key-union of disjoint contributions.
    pub fn apply(&mut self, patch: StagePatch) -> Result<(), MergeError> {
        match patch {
            StagePatch::Summary(summary) => {
                if self.idea_summary.is_some() {
                    return Err(MergeError::DuplicateWrite("idea_summary"));
                }
                self.idea_summary = Some(summary);
            }
            StagePatch::MetricContribution { scores, rationales } => {
                for (metric, score) in scores {
                    if self.metric_scores.insert(metric, score).is_some() {
                        return Err(MergeError::MetricCollision(metric));
                    }
                }
                for (metric, rationale) in rationales {
                    if self.metric_rationales.insert(metric, rationale).is_some() {
                        return Err(MergeError::MetricCollision(metric));
                    }
                }
            }
            StagePatch::Aggregation {
                final_score,
                synthesis_input,
            } => {
                if self.final_score.is_some() || self.synthesis_input.is_some() {
                    return Err(MergeError::DuplicateWrite("final_score"));
                }
                self.final_score = Some(final_score);
                self.synthesis_input = Some(synthesis_input);
            }
            StagePatch::Swot(report) => {
                if self.swot.is_some() {
                    return Err(MergeError::DuplicateWrite("swot"));
                }
                self.swot = Some(report);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contribution(entries: &[(Metric, f64)]) -> StagePatch {
        StagePatch::MetricContribution {
            scores: entries.iter().copied().collect(),
            rationales: entries
                .iter()
                .map(|(m, _)| (*m, format!("{m} rationale")))
                .collect(),
        }
    }

    #[test]
    fn disjoint_contributions_union_in_any_order() {
        let a = [(Metric::Originality, 6.0), (Metric::Differentiation, 5.0)];
        let b = [(Metric::MarketSize, 4.0), (Metric::MarketGrowth, 5.0)];

        for (first, second) in [(a, b), (b, a)] {
            let mut state = EvaluationState::new("idea");
            state.apply(contribution(&first)).unwrap();
            state.apply(contribution(&second)).unwrap();

            assert_eq!(state.metric_scores.len(), 4);
            assert_eq!(state.metric_rationales.len(), 4);
            assert_eq!(state.metric_scores[&Metric::Originality], 6.0);
            assert_eq!(state.metric_scores[&Metric::MarketGrowth], 5.0);
        }
    }

    #[test]
    fn four_analyst_contributions_union_in_every_rotation() {
        let contributions = [
            contribution(&[(Metric::Originality, 6.0), (Metric::Differentiation, 5.0)]),
            contribution(&[(Metric::MarketSize, 4.0), (Metric::MarketGrowth, 5.0)]),
            contribution(&[(Metric::Defensibility, 3.0), (Metric::SwitchingCosts, 4.0)]),
            contribution(&[(Metric::ExecutionComplexity, 7.0), (Metric::Scalability, 6.0)]),
        ];

        for start in 0..contributions.len() {
            let mut state = EvaluationState::new("idea");
            for offset in 0..contributions.len() {
                let idx = (start + offset) % contributions.len();
                state.apply(contributions[idx].clone()).unwrap();
            }
            assert_eq!(state.metric_scores.len(), 8);
            assert_eq!(state.metric_rationales.len(), 8);
        }
    }

    #[test]
    fn overlapping_metric_key_is_rejected() {
        let mut state = EvaluationState::new("idea");
        state
            .apply(contribution(&[(Metric::Originality, 6.0)]))
            .unwrap();

        let err = state
            .apply(contribution(&[(Metric::Originality, 2.0)]))
            .unwrap_err();
        assert_eq!(err, MergeError::MetricCollision(Metric::Originality));
    }

    #[test]
    fn second_summary_write_is_rejected() {
        let summary = IdeaSummary {
            problem: "p".into(),
            target_user: "t".into(),
            solution: "s".into(),
            industry: "i".into(),
            assumptions: vec![],
        };

        let mut state = EvaluationState::new("idea");
        state.apply(StagePatch::Summary(summary.clone())).unwrap();

        let err = state.apply(StagePatch::Summary(summary)).unwrap_err();
        assert_eq!(err, MergeError::DuplicateWrite("idea_summary"));
    }

    #[test]
    fn second_swot_write_is_rejected() {
        let report = SwotReport {
            strengths: vec![],
            weaknesses: vec![],
            opportunities: vec![],
            threats: vec![],
        };

        let mut state = EvaluationState::new("idea");
        state.apply(StagePatch::Swot(report.clone())).unwrap();
        let err = state.apply(StagePatch::Swot(report)).unwrap_err();
        assert_eq!(err, MergeError::DuplicateWrite("swot"));
    }
}
