//! Network collaborators for the CIQ Copilot.
//!
//! This crate implements the capability traits declared in `ciq-core`:
//! the Claude Messages API agent behind [`ciq_core::capability::LlmInvoke`]
//! and the documentation-search client behind
//! [`ciq_core::capability::DocsSearch`], plus the model-backed intent
//! classifier and parameter resolver built on top of them.

pub mod agent;
pub mod claude_api_agent;
pub mod classifier;
pub mod docs_search;

pub use agent::AgentError;
pub use claude_api_agent::ClaudeApiAgent;
pub use classifier::{LlmClassifier, LlmParamResolver};
pub use docs_search::{DocsSearchClient, DocsSearchConfig};
