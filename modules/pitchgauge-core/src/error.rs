use model_client::ModelError;
use pitchgauge_common::Metric;
use thiserror::Error;

use crate::stage::StageId;
use crate::state::MergeError;

/// Aggregation precondition violation: the merged metric map is missing a
/// key that the four analysts together must have produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("merged metric map is missing `{missing}`")]
pub struct PreconditionError {
    pub missing: Metric,
}

/// A failure inside one stage, before stage identity is attached.
#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    /// A field a predecessor stage owns was absent from the snapshot.
    /// Means the graph is miswired, not that the model misbehaved.
    #[error("missing upstream input `{0}`")]
    MissingInput(&'static str),
}

/// A [`StageError`] carrying the identity of the stage that produced it.
#[derive(Error, Debug)]
#[error("stage `{stage}` failed: {source}")]
pub struct StageFailure {
    pub stage: StageId,
    #[source]
    pub source: StageError,
}

/// Terminal result of a run that reached the failed state. Callers get
/// either a complete `EvaluationResult` or one of these; never both.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Stage(#[from] StageFailure),

    /// Two stages wrote the same field or metric key.
    #[error("state merge conflict after stage `{stage}`: {merge}")]
    Merge {
        stage: StageId,
        #[source]
        merge: MergeError,
    },

    /// Executor-level breakage: a stage task panicked or the graph stalled.
    #[error("pipeline aborted: {0}")]
    Aborted(String),
}

impl PipelineError {
    /// The stage that sank the run, when one is identifiable.
    pub fn stage(&self) -> Option<StageId> {
        match self {
            PipelineError::Stage(failure) => Some(failure.stage),
            PipelineError::Merge { stage, .. } => Some(*stage),
            PipelineError::Aborted(_) => None,
        }
    }
}
