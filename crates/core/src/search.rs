//! Substring search over page text
//!
//! Search shares the layout and projection primitives with the diff highlights: hits are
//! char offsets into the page text, and on-screen highlights come from
//! [`rects_for_range`](crate::projection::rects_for_range).

use crate::geometry::NormalizedRect;
use crate::projection::rects_for_range;
use crate::text_layout::PageTextLayout;
use serde::{Deserialize, Serialize};

/// Default number of chars of context kept on each side of a hit
pub const DEFAULT_CONTEXT_CHARS: usize = 40;

/// Search behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Chars of surrounding text captured on each side of a hit
    pub context_chars: usize,

    /// Match case exactly instead of comparing lowercased chars
    pub case_sensitive: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { context_chars: DEFAULT_CONTEXT_CHARS, case_sensitive: false }
    }
}

/// A single occurrence of the query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// 1-based page number
    pub page: u32,

    /// 1-based position of the hit across all searched pages
    pub index: usize,

    /// Char offset of the hit in the page text
    pub start: usize,

    /// Char offset one past the hit
    pub end: usize,

    /// The hit with up to `context_chars` chars on either side
    pub context: String,
}

/// Search page texts in order
///
/// `pages` yields `(page_number, text)` pairs. Occurrences on a page do not overlap: scanning
/// resumes after the end of each hit. A blank query finds nothing.
pub fn search_pages<'a, I>(pages: I, query: &str, config: &SearchConfig) -> Vec<SearchHit>
where
    I: IntoIterator<Item = (u32, &'a str)>,
{
    let Some(needle) = fold_query(query, config) else {
        return Vec::new();
    };

    let mut hits = Vec::new();
    for (page, text) in pages {
        let chars: Vec<char> = text.chars().collect();
        let haystack = fold_chars(&chars, config);

        for start in find_occurrences(&haystack, &needle) {
            let end = start + needle.len();
            let context_start = start.saturating_sub(config.context_chars);
            let context_end = (end + config.context_chars).min(chars.len());

            hits.push(SearchHit {
                page,
                index: hits.len() + 1,
                start,
                end,
                context: chars[context_start..context_end].iter().collect(),
            });
        }
    }

    hits
}

/// Highlight rectangles for every occurrence of `query` in a captured layout
pub fn rects_for_query(
    layout: &PageTextLayout,
    query: &str,
    config: &SearchConfig,
) -> Vec<NormalizedRect> {
    let Some(needle) = fold_query(query, config) else {
        return Vec::new();
    };

    let chars: Vec<char> = layout.text.chars().collect();
    let haystack = fold_chars(&chars, config);

    find_occurrences(&haystack, &needle)
        .into_iter()
        .flat_map(|start| rects_for_range(layout, start, start + needle.len()))
        .collect()
}

fn fold_query(query: &str, config: &SearchConfig) -> Option<Vec<char>> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return None;
    }

    let chars: Vec<char> = trimmed.chars().collect();
    Some(fold_chars(&chars, config))
}

/// Case-fold char by char so offsets in the folded text line up with the unfolded text
fn fold_chars(chars: &[char], config: &SearchConfig) -> Vec<char> {
    if config.case_sensitive {
        return chars.to_vec();
    }

    chars.iter().map(|&ch| fold_char(ch)).collect()
}

fn fold_char(ch: char) -> char {
    let mut lower = ch.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(single), None) => single,
        _ => ch,
    }
}

fn find_occurrences(haystack: &[char], needle: &[char]) -> Vec<usize> {
    let mut found = Vec::new();
    if needle.is_empty() || needle.len() > haystack.len() {
        return found;
    }

    let mut position = 0;
    while position + needle.len() <= haystack.len() {
        if haystack[position..position + needle.len()] == *needle {
            found.push(position);
            position += needle.len();
        } else {
            position += 1;
        }
    }

    found
}
