//! Pipeline stages and the orchestrating state machine.

pub mod pipeline;
pub mod stages;

pub use pipeline::{Orchestrator, ProcessResponse, ResponseMetadata};
