pub mod blueprint;
pub mod capability;
pub mod config;
pub mod error;
pub mod intent;
pub mod prompt;
pub mod session;

// Re-export common error type
pub use error::{CiqError, Result};
