//! Draft generation collaborator contract and the OpenAI-backed default.

use async_trait::async_trait;
use openai_client::{ChatRequest, Message, OpenAIClient};
use tracing::debug;

use crate::error::JobError;

/// Turns a fully built prompt into free text containing candidate emails.
///
/// May fail on auth/quota/network problems; the caller decides whether that
/// fails a row or is swallowed (sender enrichment).
#[async_trait]
pub trait DraftGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, JobError>;
}

/// `DraftGenerator` backed by the OpenAI chat-completions API.
pub struct OpenAiDraftGenerator {
    client: OpenAIClient,
    model: String,
}

impl OpenAiDraftGenerator {
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl DraftGenerator for OpenAiDraftGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, JobError> {
        let request = ChatRequest::new(&self.model)
            .message(Message::system(
                "You are an expert cold-outreach copywriter. Follow the \
                 instructions exactly and output only the requested format.",
            ))
            .message(Message::user(prompt))
            .temperature(0.8);

        let response = self
            .client
            .chat_completion(request)
            .await
            .map_err(|e| JobError::Generation(e.to_string()))?;

        debug!(
            model = %self.model,
            chars = response.content.len(),
            "draft generation response received"
        );

        Ok(response.content)
    }
}
