pub mod claude;
pub mod error;
pub mod schema;
pub mod traits;

pub use claude::Claude;
pub use error::ModelError;
pub use schema::StructuredOutput;
pub use traits::{ModelClient, ModelClientExt, ModelRequest};
