//! Capability traits consumed at the seam to external collaborators.
//!
//! The core never talks to the network itself. It consumes two
//! capabilities: a plain-text LLM invocation and a documentation search.
//! Concrete implementations live in `ciq-interaction`.

use async_trait::async_trait;

use crate::error::Result;

/// Synchronous-looking LLM invocation: prompt in, text out.
#[async_trait]
pub trait LlmInvoke: Send + Sync {
    /// Sends a system prompt and a single user message, returning the
    /// model's plain-text reply.
    ///
    /// # Arguments
    /// * `system_prompt` - Instruction framing for the model
    /// * `user_message` - The user-visible message body
    /// * `max_tokens` - Hard cap on generated tokens
    async fn invoke(
        &self,
        system_prompt: &str,
        user_message: &str,
        max_tokens: u32,
    ) -> Result<String>;
}

/// Free-text documentation search against the knowledge base.
#[async_trait]
pub trait DocsSearch: Send + Sync {
    /// Executes a search and returns a natural-language answer.
    ///
    /// Implementations retry transient failures internally; a returned
    /// `Ok` may still carry a user-facing degraded message when the
    /// upstream stayed unavailable.
    async fn search(&self, query: &str) -> Result<String>;
}
