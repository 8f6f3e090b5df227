//! Domain types shared by the pipeline, the CLI, and the HTTP shell.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::metrics::Metric;

/// Normalized extraction of a raw startup description.
///
/// Produced once by the normalization stage and read-only afterward; every
/// downstream stage reasons over this summary, never the raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IdeaSummary {
    /// Core problem being solved
    pub problem: String,
    /// Primary user or customer segment
    pub target_user: String,
    /// Proposed solution or product
    pub solution: String,
    /// Industry or domain
    pub industry: String,
    /// Key assumptions the idea relies on
    pub assumptions: Vec<String>,
}

impl std::fmt::Display for IdeaSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Problem: {}", self.problem)?;
        writeln!(f, "Target user: {}", self.target_user)?;
        writeln!(f, "Solution: {}", self.solution)?;
        writeln!(f, "Industry: {}", self.industry)?;
        writeln!(f, "Assumptions:")?;
        for assumption in &self.assumptions {
            writeln!(f, "- {assumption}")?;
        }
        Ok(())
    }
}

/// Four-category qualitative summary produced by the synthesis stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SwotReport {
    /// Internal advantages of the startup
    pub strengths: Vec<String>,
    /// Internal limitations or gaps
    pub weaknesses: Vec<String>,
    /// External factors the startup can leverage
    pub opportunities: Vec<String>,
    /// External risks or competitive pressures
    pub threats: Vec<String>,
}

/// Completed evaluation: composite score, all twelve metric scores, and the
/// SWOT report. This is the whole caller-visible result; a failed run
/// returns an error instead, never a partial result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Weighted composite on a 0–100 scale, rounded to two decimals.
    pub final_score: f64,
    pub metric_scores: BTreeMap<Metric, f64>,
    pub swot: SwotReport,
}

impl std::fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Startup Evaluation ===")?;
        writeln!(f, "Final score: {}/100", self.final_score)?;
        writeln!(f, "\nMetric scores:")?;
        for (metric, score) in &self.metric_scores {
            writeln!(f, "  {metric}: {score}/10")?;
        }
        for (title, items) in [
            ("Strengths", &self.swot.strengths),
            ("Weaknesses", &self.swot.weaknesses),
            ("Opportunities", &self.swot.opportunities),
            ("Threats", &self.swot.threats),
        ] {
            writeln!(f, "\n{title}:")?;
            for item in items {
                writeln!(f, "  - {item}")?;
            }
        }
        Ok(())
    }
}
