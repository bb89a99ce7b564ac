pub mod chat;
pub mod render;
pub mod schema;
