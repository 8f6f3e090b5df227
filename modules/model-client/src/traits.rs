use async_trait::async_trait;
use serde_json::Value;

use crate::error::ModelError;
use crate::schema::StructuredOutput;

/// One structured inference request: prompt pair plus the JSON schema the
/// reply must satisfy.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub system: String,
    pub user: String,
    pub schema: Value,
}

/// The single boundary through which the pipeline talks to an inference
/// service. Object-safe so the whole backend can be swapped for a scripted
/// double in tests.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Run one inference call and return the raw structured payload.
    ///
    /// Transport-level retries happen below this boundary and are invisible
    /// to callers; shape validation happens above it in
    /// [`ModelClientExt::extract`].
    async fn invoke(&self, request: ModelRequest) -> Result<Value, ModelError>;
}

/// Typed extraction on top of any [`ModelClient`].
#[async_trait]
pub trait ModelClientExt: ModelClient {
    /// Invoke the model demanding output shaped like `T`, then deserialize
    /// and run `T::validate`. Any mismatch surfaces as
    /// [`ModelError::Shape`]; nothing is retried here.
    async fn extract<T>(&self, system: &str, user: &str) -> Result<T, ModelError>
    where
        T: StructuredOutput + Send + 'static;
}

#[async_trait]
impl<C: ModelClient + ?Sized> ModelClientExt for C {
    async fn extract<T>(&self, system: &str, user: &str) -> Result<T, ModelError>
    where
        T: StructuredOutput + Send + 'static,
    {
        let request = ModelRequest {
            system: system.to_string(),
            user: user.to_string(),
            schema: T::tool_schema(),
        };
        let raw = self.invoke(request).await?;
        let parsed: T = serde_json::from_value(raw).map_err(|e| {
            ModelError::Shape(format!("response does not match {}: {e}", T::type_name()))
        })?;
        parsed.validate().map_err(ModelError::Shape)?;
        Ok(parsed)
    }
}
