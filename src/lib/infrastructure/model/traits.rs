//! Model traits

use super::types::ModelError;
use crate::types::ChatMessage;
use async_trait::async_trait;
use std::sync::Arc;

/// A language model reachable over a request/response call.
///
/// Implementations must not retry; failures are reported to the caller as-is.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Send the ordered message list and return the reply text.
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, ModelError>;
}

#[async_trait]
impl<T: ModelProvider + ?Sized> ModelProvider for Arc<T> {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
        (**self).invoke(messages).await
    }
}
