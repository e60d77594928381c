//! Markdown to plain text
//!
//! Drops markup and keeps the prose. Every block element (heading,
//! paragraph, list item, code block) ends with a blank line so it becomes
//! its own paragraph after normalization.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};

/// Render Markdown content as plain text paragraphs
pub fn to_plain_text(content: &str) -> String {
    let mut out = String::with_capacity(content.len());

    for event in Parser::new(content) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak => out.push(' '),
            Event::HardBreak => out.push('\n'),
            Event::Start(Tag::List(_)) | Event::Start(Tag::Item) => break_block(&mut out),
            Event::End(TagEnd::Paragraph)
            | Event::End(TagEnd::Heading(_))
            | Event::End(TagEnd::Item)
            | Event::End(TagEnd::CodeBlock) => break_block(&mut out),
            _ => {}
        }
    }

    out
}

fn break_block(out: &mut String) {
    if !out.is_empty() && !out.ends_with("\n\n") {
        out.push_str("\n\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_and_paragraphs() {
        let content = r#"# Main Title

This is the introduction
spread over two lines.

## Usage

Call `run` to start.
"#;

        let text = to_plain_text(content);
        let paragraphs: Vec<&str> = text.split("\n\n").filter(|p| !p.is_empty()).collect();

        assert_eq!(
            paragraphs,
            vec![
                "Main Title",
                "This is the introduction spread over two lines.",
                "Usage",
                "Call run to start.",
            ]
        );
    }

    #[test]
    fn test_nested_lists_split_items() {
        let content = "- outer\n  - inner\n- last\n";
        let text = to_plain_text(content);
        let paragraphs: Vec<&str> = text.split("\n\n").filter(|p| !p.is_empty()).collect();

        assert_eq!(paragraphs, vec!["outer", "inner", "last"]);
    }

    #[test]
    fn test_code_block_is_kept() {
        let content = "Intro.\n\n```rust\nfn main() {}\n```\n";
        let text = to_plain_text(content);
        assert!(text.contains("fn main() {}"));
        assert!(text.starts_with("Intro.\n\n"));
    }
}
