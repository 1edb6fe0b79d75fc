//! Whitespace tokenizer for page text

use serde::{Deserialize, Serialize};

/// A maximal run of non-whitespace chars
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextToken {
    pub value: String,

    /// Char offset of the first char
    pub start: usize,

    /// Char offset one past the last char
    pub end: usize,
}

/// Split `text` into whitespace-delimited tokens with their char offsets
pub fn tokenize(text: &str) -> Vec<TextToken> {
    let mut tokens = Vec::new();
    let mut current: Option<(usize, String)> = None;
    let mut position = 0;

    for ch in text.chars() {
        if is_token_separator(ch) {
            if let Some((start, value)) = current.take() {
                tokens.push(TextToken { value, start, end: position });
            }
        } else {
            current.get_or_insert_with(|| (position, String::new())).1.push(ch);
        }
        position += 1;
    }

    if let Some((start, value)) = current {
        tokens.push(TextToken { value, start, end: position });
    }

    tokens
}

/// Whitespace as text extracted from PDFs sees it
///
/// Unicode `White_Space` plus U+FEFF, which shows up as a separator in extracted text, minus
/// U+0085, which does not.
fn is_token_separator(ch: char) -> bool {
    (ch.is_whitespace() && ch != '\u{85}') || ch == '\u{feff}'
}
