//! Generative backend client

mod client;
pub mod types;

use anyhow::Result;
use async_trait::async_trait;

pub use client::{GeminiClient, DEFAULT_BASE_URL};
pub use types::{Content, GenerateContentRequest, GenerateContentResponse, Role};

/// A model that turns a conversation into a response.
///
/// Implementations must be shareable across tasks: the chat session moves an
/// `Arc<dyn ChatBackend>` into a spawned task for every call.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn generate(&self, request: GenerateContentRequest) -> Result<GenerateContentResponse>;
}
