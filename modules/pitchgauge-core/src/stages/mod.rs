pub mod aggregate;
pub mod analysts;
pub mod normalize;
pub mod synthesis;

pub use aggregate::{AggregateStage, AggregationMode};
pub use analysts::AnalystStage;
pub use normalize::NormalizeStage;
pub use synthesis::SynthesizeStage;
