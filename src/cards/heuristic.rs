//! Paragraph-based card generation

use super::CardGenerator;
use crate::config::CardSettings;
use crate::storage::NewCard;
use anyhow::Result;

const WHOLE_TEXT_QUESTION: &str = "What is the main idea?";

/// Turns each sufficiently long paragraph into a "main idea" card
#[derive(Debug, Clone)]
pub struct HeuristicGenerator {
    min_paragraph_len: usize,
    max_answer_len: usize,
    max_cards: usize,
}

impl HeuristicGenerator {
    /// Create a generator with the default limits
    pub fn new() -> Self {
        Self::from_settings(&CardSettings::default())
    }

    /// Create a generator from configuration
    pub fn from_settings(settings: &CardSettings) -> Self {
        Self {
            min_paragraph_len: settings.min_paragraph_len,
            max_answer_len: settings.max_answer_len,
            max_cards: settings.max_cards,
        }
    }

    /// Paragraphs long enough to become cards, in document order
    pub fn split_paragraphs<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .filter(|p| p.chars().count() >= self.min_paragraph_len)
            .collect()
    }

    /// Synchronous card generation
    pub fn cards_from_text(&self, text: &str) -> Vec<NewCard> {
        let mut cards: Vec<NewCard> = self
            .split_paragraphs(text)
            .into_iter()
            .take(self.max_cards)
            .enumerate()
            .map(|(i, para)| {
                let index = i + 1;
                NewCard {
                    question: format!("What is the main idea of paragraph {}?", index),
                    answer: self.shorten(para),
                    source_ref: Some(format!("para:{}", index)),
                }
            })
            .collect();

        let trimmed = text.trim();
        if cards.is_empty() && !trimmed.is_empty() && self.max_cards > 0 {
            cards.push(NewCard {
                question: WHOLE_TEXT_QUESTION.to_string(),
                answer: trimmed.chars().take(self.max_answer_len).collect(),
                source_ref: None,
            });
        }

        cards
    }

    fn shorten(&self, para: &str) -> String {
        if para.chars().count() > self.max_answer_len {
            let mut answer: String = para.chars().take(self.max_answer_len).collect();
            answer.push_str("...");
            answer
        } else {
            para.to_string()
        }
    }
}

impl Default for HeuristicGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CardGenerator for HeuristicGenerator {
    async fn generate(&self, text: &str) -> Result<Vec<NewCard>> {
        Ok(self.cards_from_text(text))
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}
