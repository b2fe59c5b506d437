//! Static knowledge base used as the context retriever.

use async_trait::async_trait;
use kambo_core::retrieval::ContextRetriever;

const MAX_PASSAGES: usize = 3;

const DEFAULT_PASSAGES: &[&str] = &[
    "Kambo is a traditional Amazonian practice in which the secretion of the giant monkey frog (Phyllomedusa bicolor) is used in ceremonial contexts.",
    "Kambo ceremonies are traditionally led by trained practitioners, and safety screening and a suitable environment are emphasized in most traditions.",
    "Indigenous groups such as the Matses and Katukina have long histories with Kambo, where it plays cultural and spiritual roles.",
    "Scientific research on the peptides found in the secretion is ongoing, and the available studies are limited.",
    "The legal status of Kambo differs between countries, and some regulators have issued public warnings about its use.",
];

/// Fixed passages filtered by word overlap with the question.
#[derive(Debug, Clone)]
pub struct StaticKnowledgeBase {
    passages: Vec<String>,
}

impl Default for StaticKnowledgeBase {
    fn default() -> Self {
        Self::new(DEFAULT_PASSAGES.iter().map(|p| p.to_string()).collect())
    }
}

impl StaticKnowledgeBase {
    pub fn new(passages: Vec<String>) -> Self {
        Self { passages }
    }

    /// Passages sharing at least one word with `question`, at most three.
    pub fn relevant_passages(&self, question: &str) -> Vec<&str> {
        let words: Vec<String> = tokenize(question).collect();
        if words.is_empty() {
            return Vec::new();
        }

        self.passages
            .iter()
            .filter(|passage| tokenize(passage).any(|token| words.contains(&token)))
            .map(String::as_str)
            .take(MAX_PASSAGES)
            .collect()
    }
}

/// Lowercased alphanumeric words; very short words are ignored.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() > 2)
        .map(str::to_lowercase)
}

#[async_trait]
impl ContextRetriever for StaticKnowledgeBase {
    async fn retrieve_context(&self, question: &str) -> Result<String, String> {
        Ok(self.relevant_passages(question).join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_selects_passages() {
        let kb = StaticKnowledgeBase::default();
        let passages = kb.relevant_passages("What is the legal status of Kambo?");
        assert!(!passages.is_empty());
        assert!(passages.len() <= MAX_PASSAGES);
        assert!(passages.iter().all(|p| p.to_lowercase().contains("kambo")
            || p.to_lowercase().contains("legal")
            || p.to_lowercase().contains("status")));
    }

    #[test]
    fn test_no_overlap_is_empty() {
        let kb = StaticKnowledgeBase::new(vec!["Frogs live in trees.".to_string()]);
        assert!(kb.relevant_passages("weather today?").is_empty());
        assert!(kb.relevant_passages("").is_empty());
    }

    #[tokio::test]
    async fn test_context_is_joined_with_blank_lines() {
        let kb = StaticKnowledgeBase::new(vec![
            "Kambo one.".to_string(),
            "Kambo two.".to_string(),
        ]);
        let context = kb.retrieve_context("kambo").await.unwrap();
        assert_eq!(context, "Kambo one.\n\nKambo two.");
    }
}
