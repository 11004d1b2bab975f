//! Model service abstraction.
//!
//! The model is an opaque text-completion service. Nothing about the shape of
//! its answer is trusted; parsing happens in the extractor.

mod openai;

pub use openai::ChatCompletionsClient;

use async_trait::async_trait;

use crate::error::ModelError;

/// A text-completion service taking a system instruction and one user message.
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Return the raw completion text.
    async fn complete(&self, system: &str, user: &str) -> Result<String, ModelError>;
}

#[async_trait]
impl<T: ModelService + ?Sized> ModelService for std::sync::Arc<T> {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ModelError> {
        (**self).complete(system, user).await
    }
}
