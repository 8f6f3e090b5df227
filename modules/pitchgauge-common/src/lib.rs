pub mod config;
pub mod metrics;
pub mod types;

pub use config::Config;
pub use metrics::Metric;
pub use types::*;
