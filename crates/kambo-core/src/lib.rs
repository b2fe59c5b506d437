pub mod config;
pub mod error;
pub mod generation;
pub mod guard;
pub mod messages;
pub mod moderation;
pub mod repository;
pub mod retrieval;
pub mod secret;
pub mod state;
pub mod verdict;

// Re-export common error types
pub use error::{KamboError, PipelineError};
