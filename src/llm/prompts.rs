//! Prompt templates for LLM interactions

/// Prompt for turning source text into flashcards
pub struct CardPrompt;

impl CardPrompt {
    /// Generate a card-writing prompt for `text`
    ///
    /// Long inputs are cut at `max_chars` characters so the prompt stays
    /// within the model's context window.
    pub fn generate(text: &str, max_cards: usize, max_chars: usize) -> String {
        let mut prompt = String::new();

        prompt.push_str(CARD_SYSTEM_PROMPT);
        prompt.push('\n');

        prompt.push_str(&format!("Write at most {} flashcards.\n\n", max_cards));

        let excerpt: String = text.chars().take(max_chars).collect();
        prompt.push_str("## Source Text\n\n");
        prompt.push_str(&format!("```text\n{}\n```\n\n", excerpt));

        prompt.push_str(CARD_INSTRUCTIONS);

        prompt
    }
}

const CARD_SYSTEM_PROMPT: &str = r#"You are a study assistant who writes spaced-repetition flashcards.

You will be given a passage of source text. Your job is to pick out the facts
and ideas worth remembering and turn each into one question with a short,
self-contained answer.
"#;

const CARD_INSTRUCTIONS: &str = r#"## Instructions

Respond with a JSON array of objects, each with exactly these fields:

```json
[
  {
    "question": "A question that can be answered from the text",
    "answer": "The concise answer"
  }
]
```

Guidelines:
- One idea per card
- Questions must make sense without seeing the source text
- Answers should be a sentence or two, never a whole paragraph
- Do not invent facts that are not in the text

Respond ONLY with the JSON array, no additional text.
"#;
