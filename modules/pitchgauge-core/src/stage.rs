//! Stage contract: identity plus a snapshot-in, patch-out async function.

use async_trait::async_trait;

use crate::error::StageError;
use crate::state::{EvaluationState, StagePatch};

/// Identity of one pipeline node, carried on failures and in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    Normalize,
    ProductAnalyst,
    MarketAnalyst,
    MoatAnalyst,
    ExecutionAnalyst,
    Aggregate,
    Synthesize,
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageId::Normalize => write!(f, "normalize"),
            StageId::ProductAnalyst => write!(f, "product_analyst"),
            StageId::MarketAnalyst => write!(f, "market_analyst"),
            StageId::MoatAnalyst => write!(f, "moat_analyst"),
            StageId::ExecutionAnalyst => write!(f, "execution_analyst"),
            StageId::Aggregate => write!(f, "aggregate"),
            StageId::Synthesize => write!(f, "synthesize"),
        }
    }
}

/// One node of the evaluation graph.
#[async_trait]
pub trait Stage: Send + Sync {
    fn id(&self) -> StageId;

    /// Run against a snapshot taken after every predecessor stage merged.
    /// Returns only the fields this stage owns.
    async fn run(&self, state: EvaluationState) -> Result<StagePatch, StageError>;
}
