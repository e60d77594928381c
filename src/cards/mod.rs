//! Card generation from extracted text
//!
//! Two strategies sit behind the [`CardGenerator`] capability:
//! - [`HeuristicGenerator`]: one "main idea" card per paragraph
//! - [`LlmGenerator`]: cards written by a language model
//!
//! [`FallbackGenerator`] chains them: if the primary strategy fails or comes
//! back empty, the heuristic result is used instead and a warning is logged.

mod assisted;
mod heuristic;

pub use assisted::LlmGenerator;
pub use heuristic::HeuristicGenerator;

use crate::config::LearnConfig;
use crate::llm::LlmClient;
use crate::storage::NewCard;
use anyhow::Result;
use tracing::{info, warn};

/// Something that can turn source text into cards
#[async_trait::async_trait]
pub trait CardGenerator: Send + Sync {
    /// Generate cards for `text`
    async fn generate(&self, text: &str) -> Result<Vec<NewCard>>;

    /// Short strategy name for diagnostics
    fn name(&self) -> &str;
}

/// Tries a primary generator and falls back to the heuristic one
pub struct FallbackGenerator {
    primary: Box<dyn CardGenerator>,
    fallback: HeuristicGenerator,
}

impl FallbackGenerator {
    /// Create a new fallback chain
    pub fn new(primary: Box<dyn CardGenerator>, fallback: HeuristicGenerator) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait::async_trait]
impl CardGenerator for FallbackGenerator {
    async fn generate(&self, text: &str) -> Result<Vec<NewCard>> {
        match self.primary.generate(text).await {
            Ok(cards) if !cards.is_empty() => {
                info!(
                    generator = self.primary.name(),
                    count = cards.len(),
                    "Generated cards"
                );
                Ok(cards)
            }
            Ok(_) => {
                warn!(
                    generator = self.primary.name(),
                    "Generator produced no cards, falling back to heuristic cards"
                );
                self.fallback.generate(text).await
            }
            Err(e) => {
                warn!(
                    generator = self.primary.name(),
                    "Card generation failed, falling back to heuristic cards: {:#}", e
                );
                self.fallback.generate(text).await
            }
        }
    }

    fn name(&self) -> &str {
        self.primary.name()
    }
}

/// Build the generator for an ingest run
///
/// Without `use_llm` this is the plain heuristic generator. With it, an LLM
/// generator wrapped in a [`FallbackGenerator`]; a client that cannot even be
/// constructed also falls back.
pub fn build_generator(config: &LearnConfig, use_llm: bool) -> Box<dyn CardGenerator> {
    let heuristic = HeuristicGenerator::from_settings(&config.cards);

    if !use_llm {
        return Box::new(heuristic);
    }

    match LlmClient::new(config.llm.client_config()) {
        Ok(client) => {
            let client = client.with_retries(config.llm.max_retries);
            let primary = LlmGenerator::new(client, config.cards.max_cards);
            Box::new(FallbackGenerator::new(Box::new(primary), heuristic))
        }
        Err(e) => {
            warn!("LLM client unavailable, using heuristic cards: {:#}", e);
            Box::new(heuristic)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    const TEXT: &str = "Hello world.\n\nThis is a paragraph.";

    #[tokio::test]
    async fn test_failing_primary_falls_back() {
        let primary = LlmGenerator::new(MockLlmClient::failing("LLM unavailable"), 10);
        let generator = FallbackGenerator::new(Box::new(primary), HeuristicGenerator::new());

        let cards = generator.generate(TEXT).await.unwrap();
        assert_eq!(cards, HeuristicGenerator::new().cards_from_text(TEXT));
        assert!(!cards.is_empty());
    }

    #[tokio::test]
    async fn test_successful_primary_is_used() {
        let mut client = MockLlmClient::new();
        client.add_response(
            "Hello world",
            r#"[{"question": "Greeting?", "answer": "Hello"}]"#,
        );
        let generator = FallbackGenerator::new(
            Box::new(LlmGenerator::new(client, 10)),
            HeuristicGenerator::new(),
        );

        let cards = generator.generate(TEXT).await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].question, "Greeting?");
        assert_eq!(generator.name(), "llm");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_falls_back() {
        let mut config = LearnConfig::default();
        config.llm.endpoint = Some("http://127.0.0.1:9".to_string());
        config.llm.max_retries = 1;

        let generator = build_generator(&config, true);
        let cards = generator.generate(TEXT).await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].question, "What is the main idea?");
    }

    #[tokio::test]
    async fn test_heuristic_without_llm() {
        let generator = build_generator(&LearnConfig::default(), false);
        assert_eq!(generator.name(), "heuristic");
        assert_eq!(generator.generate(TEXT).await.unwrap().len(), 1);
    }
}
