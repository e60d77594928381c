//! LLM-backed card generation

use super::CardGenerator;
use crate::llm::{parse_card_response, CardPrompt, CompletionProvider};
use crate::storage::NewCard;
use anyhow::Result;
use tracing::debug;

/// Characters of source text sent to the model
const MAX_PROMPT_CHARS: usize = 12_000;

/// Asks a language model to write cards for the text
pub struct LlmGenerator<P: CompletionProvider> {
    provider: P,
    max_cards: usize,
}

impl<P: CompletionProvider> LlmGenerator<P> {
    /// Create a new LLM generator
    pub fn new(provider: P, max_cards: usize) -> Self {
        Self {
            provider,
            max_cards,
        }
    }
}

#[async_trait::async_trait]
impl<P: CompletionProvider> CardGenerator for LlmGenerator<P> {
    async fn generate(&self, text: &str) -> Result<Vec<NewCard>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let prompt = CardPrompt::generate(text, self.max_cards, MAX_PROMPT_CHARS);
        let response = self.provider.complete(&prompt).await?;

        debug!(
            model = self.provider.model(),
            tokens = ?response.tokens_used,
            "LLM card response received"
        );

        let cards: Vec<NewCard> = parse_card_response(&response.content)?
            .into_iter()
            .take(self.max_cards)
            .enumerate()
            .map(|(i, card)| NewCard {
                question: card.question,
                answer: card.answer,
                source_ref: Some(format!("llm:{}", i + 1)),
            })
            .collect();

        if cards.is_empty() {
            anyhow::bail!("LLM returned no usable cards");
        }

        Ok(cards)
    }

    fn name(&self) -> &str {
        "llm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    #[tokio::test]
    async fn test_cards_from_model_answer() {
        let mut client = MockLlmClient::new();
        client.add_response(
            "Mitochondria",
            r#"[{"question": "What produces ATP?", "answer": "Mitochondria"},
                {"question": "Where is DNA stored?", "answer": "The nucleus"},
                {"question": "Extra", "answer": "Dropped by the cap"}]"#,
        );

        let generator = LlmGenerator::new(client, 2);
        let cards = generator
            .generate("Mitochondria are the powerhouse of the cell.")
            .await
            .unwrap();

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].answer, "Mitochondria");
        assert_eq!(cards[1].source_ref.as_deref(), Some("llm:2"));
    }

    #[tokio::test]
    async fn test_empty_answer_is_a_failure() {
        let generator = LlmGenerator::new(MockLlmClient::new(), 5);
        assert!(generator.generate("Some text").await.is_err());
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let generator = LlmGenerator::new(MockLlmClient::failing("connection refused"), 5);
        let err = generator.generate("Some text").await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_blank_text_skips_the_model() {
        let generator = LlmGenerator::new(MockLlmClient::failing("should not be called"), 5);
        assert!(generator.generate("   ").await.unwrap().is_empty());
    }
}
