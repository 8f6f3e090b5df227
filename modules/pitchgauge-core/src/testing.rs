//! Test doubles for the model boundary.
//!
//! `ScriptedModel` matches each request's system prompt against registered
//! markers and replies with a canned payload, an injected failure, or a
//! delayed response. That is enough to exercise ordering, failure, and
//! short-circuit behavior with no network. Later registrations win, so a
//! canned scenario can be overridden per test.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use model_client::{ModelClient, ModelError, ModelRequest};
use serde_json::{json, Value};

use pitchgauge_common::Metric;

/// Stable substrings of each stage's system prompt.
pub mod markers {
    pub const NORMALIZE: &str = "extract and normalize";
    pub const PRODUCT: &str = "PRODUCT QUALITY and ORIGINALITY";
    pub const MARKET: &str = "MARKET POTENTIAL";
    pub const MOAT: &str = "DEFENSIBLE";
    pub const EXECUTION: &str = "FEASIBLE it is to build";
    pub const SWOT: &str = "SWOT analysis";
}

enum Reply {
    Value(Value),
    Fail,
}

struct Rule {
    marker: &'static str,
    reply: Reply,
    delay: Option<Duration>,
}

/// Scripted stand-in for the inference service.
#[derive(Default)]
pub struct ScriptedModel {
    rules: Vec<Rule>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `response` when the system prompt contains `marker`.
    pub fn on(mut self, marker: &'static str, response: Value) -> Self {
        self.rules.push(Rule {
            marker,
            reply: Reply::Value(response),
            delay: None,
        });
        self
    }

    /// Like [`ScriptedModel::on`], but hold the reply for `delay` first.
    pub fn on_delayed(mut self, marker: &'static str, response: Value, delay: Duration) -> Self {
        self.rules.push(Rule {
            marker,
            reply: Reply::Value(response),
            delay: Some(delay),
        });
        self
    }

    /// Fail matching requests with a 503, as a transport-adjacent error.
    pub fn fail_on(mut self, marker: &'static str) -> Self {
        self.rules.push(Rule {
            marker,
            reply: Reply::Fail,
            delay: None,
        });
        self
    }

    /// Number of calls whose system prompt contained `marker`.
    pub fn calls_matching(&self, marker: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|system| system.contains(marker))
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn invoke(&self, request: ModelRequest) -> Result<Value, ModelError> {
        self.calls.lock().unwrap().push(request.system.clone());

        let rule = self
            .rules
            .iter()
            .rev()
            .find(|rule| request.system.contains(rule.marker))
            .ok_or_else(|| {
                let head: String = request.system.chars().take(60).collect();
                ModelError::Shape(format!("no scripted reply for request: {head}"))
            })?;

        if let Some(delay) = rule.delay {
            tokio::time::sleep(delay).await;
        }

        match &rule.reply {
            Reply::Value(value) => Ok(value.clone()),
            Reply::Fail => Err(ModelError::Api {
                status: 503,
                message: "scripted failure".into(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Canned replies
// ---------------------------------------------------------------------------

/// Canned normalization reply.
pub fn summary_reply() -> Value {
    json!({
        "problem": "Small startups overspend on office furniture",
        "target_user": "Small startup teams",
        "solution": "A subscription box for recycled office furniture",
        "industry": "Office furnishings",
        "assumptions": ["Startups prefer renting over buying"],
    })
}

/// Analyst reply carrying the given scores, with a stock rationale each.
pub fn analyst_reply(scores: &[(Metric, f64)]) -> Value {
    let mut score_map = serde_json::Map::new();
    let mut rationale_map = serde_json::Map::new();
    for (metric, score) in scores {
        score_map.insert(metric.as_str().to_string(), json!(score));
        rationale_map.insert(
            metric.as_str().to_string(),
            json!(format!("{metric} assessed from the summary")),
        );
    }
    json!({ "metric_scores": score_map, "metric_rationales": rationale_map })
}

pub fn product_reply() -> Value {
    analyst_reply(&[
        (Metric::Originality, 6.0),
        (Metric::ProblemSolutionFit, 7.0),
        (Metric::Differentiation, 5.0),
    ])
}

pub fn market_reply() -> Value {
    analyst_reply(&[
        (Metric::MarketSize, 4.0),
        (Metric::MarketGrowth, 5.0),
        (Metric::CustomerWillingnessToPay, 6.0),
    ])
}

pub fn moat_reply() -> Value {
    analyst_reply(&[
        (Metric::EaseOfDuplication, 5.0),
        (Metric::Defensibility, 3.0),
        (Metric::SwitchingCosts, 4.0),
    ])
}

pub fn execution_reply() -> Value {
    analyst_reply(&[
        (Metric::ExecutionComplexity, 7.0),
        (Metric::CostFeasibility, 5.0),
        (Metric::Scalability, 6.0),
    ])
}

pub fn swot_reply() -> Value {
    json!({
        "strengths": ["Sustainability angle resonates with startups"],
        "weaknesses": ["Logistics-heavy operating model"],
        "opportunities": ["Growing secondhand office market"],
        "threats": ["Incumbent furniture rental services"],
    })
}

/// Fully scripted happy path: the weighted composite of these scores is
/// exactly 53.0.
pub fn scenario_model() -> ScriptedModel {
    ScriptedModel::new()
        .on(markers::NORMALIZE, summary_reply())
        .on(markers::PRODUCT, product_reply())
        .on(markers::MARKET, market_reply())
        .on(markers::MOAT, moat_reply())
        .on(markers::EXECUTION, execution_reply())
        .on(markers::SWOT, swot_reply())
}
