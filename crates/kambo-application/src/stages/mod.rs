//! Generation-backed pipeline stages.

mod responder;
mod topic_classifier;
mod verifier;

pub use responder::ResponseGenerator;
pub use topic_classifier::{TopicClassifier, TopicVerdict};
pub use verifier::ComplianceVerifier;
