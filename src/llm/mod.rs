//! LLM-assisted card writing
//!
//! This module handles:
//! - Talking to Ollama or OpenAI-compatible endpoints
//! - The card-writing prompt
//! - Parsing the model's JSON answer into question/answer pairs

mod client;
mod prompts;

pub use client::{CompletionProvider, LlmClient, LlmConfig, LlmResponse, MockLlmClient};
pub use prompts::CardPrompt;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One card as written by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCard {
    pub question: String,
    pub answer: String,
}

/// Parse a model response into cards
///
/// Accepts a bare JSON array or one wrapped in prose or a fenced code
/// block. Entries with a blank question or answer are dropped.
pub fn parse_card_response(content: &str) -> Result<Vec<GeneratedCard>> {
    let start = content
        .find('[')
        .ok_or_else(|| anyhow::anyhow!("No JSON array in LLM response"))?;
    let end = content
        .rfind(']')
        .filter(|&end| end > start)
        .ok_or_else(|| anyhow::anyhow!("Unterminated JSON array in LLM response"))?;

    let cards: Vec<GeneratedCard> = serde_json::from_str(&content[start..=end])
        .context("Failed to parse LLM response")?;

    Ok(cards
        .into_iter()
        .map(|card| GeneratedCard {
            question: card.question.trim().to_string(),
            answer: card.answer.trim().to_string(),
        })
        .filter(|card| !card.question.is_empty() && !card.answer.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_array() {
        let cards = parse_card_response(
            r#"[{"question": "What is 2+2?", "answer": "4"}, {"question": "Capital of France?", "answer": "Paris"}]"#,
        )
        .unwrap();

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[1].answer, "Paris");
    }

    #[test]
    fn test_parse_fenced_array_and_drop_blanks() {
        let content = "Here you go:\n```json\n[\n  {\"question\": \" Why? \", \"answer\": \"Because.\"},\n  {\"question\": \"\", \"answer\": \"orphan\"}\n]\n```";
        let cards = parse_card_response(content).unwrap();

        assert_eq!(
            cards,
            vec![GeneratedCard {
                question: "Why?".to_string(),
                answer: "Because.".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_card_response("I cannot help with that.").is_err());
        assert!(parse_card_response("[not json]").is_err());
        assert!(parse_card_response(r#"{"question": "q"}"#).is_err());
    }
}
