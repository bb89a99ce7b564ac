//! Session domain: conversation model, progress and the in-memory store.

pub mod message;
pub mod model;
pub mod store;

pub use message::{ConversationMessage, MessageRole};
pub use model::{Session, SessionProgress};
pub use store::SessionStore;
