//! The twelve scored metrics and the fixed aggregation weight table.

use serde::{Deserialize, Serialize};

/// One of the twelve evaluation dimensions.
///
/// Ownership is partitioned across the four analyst stages: no two stages
/// score the same metric, so the concurrent metric-map merge is
/// collision-free by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    // Product / originality
    Originality,
    ProblemSolutionFit,
    Differentiation,
    // Market demand
    MarketSize,
    MarketGrowth,
    CustomerWillingnessToPay,
    // Defensibility
    EaseOfDuplication,
    Defensibility,
    SwitchingCosts,
    // Execution feasibility
    ExecutionComplexity,
    CostFeasibility,
    Scalability,
}

impl Metric {
    pub const ALL: [Metric; 12] = [
        Metric::Originality,
        Metric::ProblemSolutionFit,
        Metric::Differentiation,
        Metric::MarketSize,
        Metric::MarketGrowth,
        Metric::CustomerWillingnessToPay,
        Metric::EaseOfDuplication,
        Metric::Defensibility,
        Metric::SwitchingCosts,
        Metric::ExecutionComplexity,
        Metric::CostFeasibility,
        Metric::Scalability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Originality => "originality",
            Metric::ProblemSolutionFit => "problem_solution_fit",
            Metric::Differentiation => "differentiation",
            Metric::MarketSize => "market_size",
            Metric::MarketGrowth => "market_growth",
            Metric::CustomerWillingnessToPay => "customer_willingness_to_pay",
            Metric::EaseOfDuplication => "ease_of_duplication",
            Metric::Defensibility => "defensibility",
            Metric::SwitchingCosts => "switching_costs",
            Metric::ExecutionComplexity => "execution_complexity",
            Metric::CostFeasibility => "cost_feasibility",
            Metric::Scalability => "scalability",
        }
    }

    pub fn parse(s: &str) -> Option<Metric> {
        match s {
            "originality" => Some(Metric::Originality),
            "problem_solution_fit" => Some(Metric::ProblemSolutionFit),
            "differentiation" => Some(Metric::Differentiation),
            "market_size" => Some(Metric::MarketSize),
            "market_growth" => Some(Metric::MarketGrowth),
            "customer_willingness_to_pay" => Some(Metric::CustomerWillingnessToPay),
            "ease_of_duplication" => Some(Metric::EaseOfDuplication),
            "defensibility" => Some(Metric::Defensibility),
            "switching_costs" => Some(Metric::SwitchingCosts),
            "execution_complexity" => Some(Metric::ExecutionComplexity),
            "cost_feasibility" => Some(Metric::CostFeasibility),
            "scalability" => Some(Metric::Scalability),
            _ => None,
        }
    }

    /// Composite weight. The weighted metrics sum to 1.0;
    /// `ease_of_duplication` and `cost_feasibility` inform the rationale
    /// set but carry no weight in the composite score.
    pub fn weight(&self) -> f64 {
        match self {
            Metric::Originality => 0.10,
            Metric::ProblemSolutionFit => 0.10,
            Metric::Differentiation => 0.10,
            Metric::MarketSize => 0.15,
            Metric::MarketGrowth => 0.10,
            Metric::CustomerWillingnessToPay => 0.10,
            Metric::EaseOfDuplication => 0.0,
            Metric::Defensibility => 0.10,
            Metric::SwitchingCosts => 0.05,
            Metric::ExecutionComplexity => 0.10,
            Metric::CostFeasibility => 0.0,
            Metric::Scalability => 0.10,
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        let total: f64 = Metric::ALL.iter().map(|m| m.weight()).sum();
        assert!((total - 1.0).abs() < 1e-9, "weights sum to {total}");
    }

    #[test]
    fn parse_round_trips() {
        for metric in Metric::ALL {
            assert_eq!(Metric::parse(metric.as_str()), Some(metric));
        }
        assert_eq!(Metric::parse("vibes"), None);
    }

    #[test]
    fn serde_uses_snake_case_names() {
        let json = serde_json::to_string(&Metric::ProblemSolutionFit).unwrap();
        assert_eq!(json, "\"problem_solution_fit\"");
        let back: Metric = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Metric::ProblemSolutionFit);
    }
}
