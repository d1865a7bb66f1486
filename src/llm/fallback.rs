use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use super::{InvokeRequest, LlmClient, LlmError};

/// Tries `primary`, then `secondary` once if the primary fails.
pub struct FallbackLlm {
    primary: Arc<dyn LlmClient>,
    secondary: Arc<dyn LlmClient>,
}

impl FallbackLlm {
    pub fn new(primary: Arc<dyn LlmClient>, secondary: Arc<dyn LlmClient>) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl LlmClient for FallbackLlm {
    async fn invoke(&self, request: &InvokeRequest) -> Result<Value, LlmError> {
        match self.primary.invoke(request).await {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(
                    primary = self.primary.name(),
                    secondary = self.secondary.name(),
                    error = %e,
                    "primary llm failed, falling back"
                );
                self.secondary.invoke(request).await
            }
        }
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}
