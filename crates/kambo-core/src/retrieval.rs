//! Context retrieval collaborator contract.

use async_trait::async_trait;

/// Supplies a short informational passage for a question.
///
/// Best-effort: implementations may fail, and callers substitute empty
/// context when they do.
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    async fn retrieve_context(&self, question: &str) -> Result<String, String>;
}

/// Retriever that never has anything to add.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyRetriever;

#[async_trait]
impl ContextRetriever for EmptyRetriever {
    async fn retrieve_context(&self, _question: &str) -> Result<String, String> {
        Ok(String::new())
    }
}
