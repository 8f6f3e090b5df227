//! Startup-idea evaluation pipeline.
//!
//! `Evaluator` fans one normalized idea out to four concurrent analyst
//! stages, joins their metric contributions behind a barrier, folds them
//! into a weighted composite, and synthesizes a SWOT report. The whole run
//! is driven by an explicit task graph over a shared, merge-checked
//! evaluation state; the only external dependency is the injected model
//! client.

pub mod error;
pub mod graph;
pub mod pipeline;
pub mod stage;
pub mod stages;
pub mod state;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use error::{PipelineError, PreconditionError, StageError, StageFailure};
pub use pipeline::Evaluator;
pub use stage::{Stage, StageId};
pub use stages::aggregate::AggregationMode;
pub use state::{EvaluationState, MergeError, StagePatch, SynthesisInput};
