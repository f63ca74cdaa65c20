//! Chat model seam.

pub mod http;

#[cfg(feature = "gemini")]
pub mod google;

use async_trait::async_trait;

use crate::error::AideError;
use crate::types::{Message, ToolDefinition};

#[cfg(feature = "gemini")]
pub use google::GeminiModel;

/// A chat model with function calling.
///
/// `invoke` returns a `Message::Ai`, optionally carrying tool-call requests.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_id(&self) -> &str;

    async fn invoke(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Message, AideError>;
}
