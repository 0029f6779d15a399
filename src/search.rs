//! Case-insensitive substring search over page-indexed text.
//!
//! Matching happens on a lowercased copy of each page while the reported
//! match and context are sliced from the original text, so output keeps the
//! document's casing. Lowercasing folds every character to exactly one
//! character, which keeps offsets in both copies aligned.

use serde::{Deserialize, Serialize};

use crate::ocr::PageTexts;

/// Characters of surrounding text kept on each side of a match.
pub const CONTEXT_CHARS: usize = 20;

/// A single occurrence of the query on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// 1-based page number.
    pub page: u32,
    /// The matched text in its original casing.
    #[serde(rename = "match")]
    pub matched_text: String,
    /// Up to [`CONTEXT_CHARS`] characters either side of the match, line
    /// breaks flattened to spaces and trimmed.
    pub context: String,
    /// Character offset of the match within the page text.
    pub position: usize,
}

/// A search query, lowercased once and reused across pages.
#[derive(Debug, Clone)]
pub struct Query {
    original: String,
    folded: String,
    char_len: usize,
}

impl Query {
    pub fn new(query: &str) -> Self {
        let folded = fold_case(query);
        let char_len = folded.chars().count();
        Self {
            original: query.to_string(),
            folded,
            char_len,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.original
    }

    pub fn is_empty(&self) -> bool {
        self.folded.is_empty()
    }

    /// Find every non-overlapping occurrence on one page, left to right.
    pub fn find_in_page(&self, page: u32, text: &str) -> Vec<MatchRecord> {
        if self.is_empty() || text.is_empty() {
            return Vec::new();
        }

        let haystack = fold_case(text);
        let original: Vec<char> = text.chars().collect();
        let mut matches = Vec::new();

        // byte cursor into `haystack`, char cursor into `original`
        let mut byte_pos = 0;
        let mut char_pos = 0;

        while let Some(found) = haystack[byte_pos..].find(&self.folded) {
            let start_byte = byte_pos + found;
            let start = char_pos + haystack[byte_pos..start_byte].chars().count();
            let end = start + self.char_len;

            matches.push(MatchRecord {
                page,
                matched_text: original[start..end].iter().collect(),
                context: context_window(&original, start, end),
                position: start,
            });

            byte_pos = start_byte + self.folded.len();
            char_pos = end;
        }

        matches
    }

    /// Search every page in ascending page order.
    pub fn find_in_pages(&self, pages: &PageTexts) -> Vec<MatchRecord> {
        pages
            .iter()
            .flat_map(|(&page, text)| self.find_in_page(page, text))
            .collect()
    }
}

/// Search extracted pages for `query`.
///
/// Empty queries and empty pages produce no matches.
pub fn search(pages: &PageTexts, query: &str) -> Vec<MatchRecord> {
    Query::new(query).find_in_pages(pages)
}

/// Search a single page's text for `query`.
pub fn search_page(page: u32, text: &str, query: &str) -> Vec<MatchRecord> {
    Query::new(query).find_in_page(page, text)
}

/// Lowercase `s` one character at a time, keeping the character count.
fn fold_case(s: &str) -> String {
    s.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}

fn context_window(text: &[char], start: usize, end: usize) -> String {
    let from = start.saturating_sub(CONTEXT_CHARS);
    let to = (end + CONTEXT_CHARS).min(text.len());
    let window: String = text[from..to].iter().collect();
    window.replace(['\r', '\n'], " ").trim().to_string()
}
