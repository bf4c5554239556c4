//! Journal markdown parsing.
//!
//! Uploaded journals are plain markdown. The parser extracts the title
//! (first `#` heading, or the first non-empty line), inline `#tags`, and
//! the body text that feeds the prompt builder.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors that can occur while parsing a journal upload.
#[derive(Debug, Error)]
pub enum JournalError {
    /// The upload contained no usable text.
    #[error("journal is empty")]
    Empty,
}

/// A parsed developer journal entry.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    /// Title from the first heading, or the first non-empty line.
    pub title: String,

    /// Full markdown body, as uploaded.
    pub body: String,

    /// Inline hashtags found in the text, lowercased, without the `#`.
    pub tags: BTreeSet<String>,
}

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^#\s+(.+?)\s*$").expect("valid heading regex"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // A tag is #word outside headings; headings are `# ` with a space.
    RE.get_or_init(|| Regex::new(r"#([A-Za-z][A-Za-z0-9_-]*)").expect("valid tag regex"))
}

impl JournalEntry {
    /// Parse a markdown journal into title, tags, and body.
    pub fn parse(markdown: &str) -> Result<Self, JournalError> {
        let body = markdown.trim();
        if body.is_empty() {
            return Err(JournalError::Empty);
        }

        let title = heading_re()
            .captures(body)
            .map(|c| c[1].to_string())
            .or_else(|| {
                body.lines()
                    .map(str::trim)
                    .find(|l| !l.is_empty())
                    .map(|l| l.trim_start_matches('#').trim().to_string())
            })
            .unwrap_or_else(|| "Untitled".to_string());

        let tags: BTreeSet<String> = tag_re()
            .captures_iter(body)
            .map(|c| c[1].to_lowercase())
            .collect();

        tracing::debug!(title = %title, tags = tags.len(), "Journal parsed");

        Ok(Self {
            title,
            body: body.to_string(),
            tags,
        })
    }

    /// A short preview of the body for status messages.
    pub fn preview(&self, max_chars: usize) -> String {
        if self.body.chars().count() <= max_chars {
            self.body.clone()
        } else {
            let truncated: String = self.body.chars().take(max_chars).collect();
            format!("{truncated}…")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_heading() {
        let entry = JournalEntry::parse("# Shipping week\n\nWrote the parser today. #rust #parsing")
            .unwrap();
        assert_eq!(entry.title, "Shipping week");
        assert!(entry.tags.contains("rust"));
        assert!(entry.tags.contains("parsing"));
    }

    #[test]
    fn test_parse_without_heading_uses_first_line() {
        let entry = JournalEntry::parse("Debugging all day.\n\nMore text.").unwrap();
        assert_eq!(entry.title, "Debugging all day.");
    }

    #[test]
    fn test_heading_not_a_tag() {
        let entry = JournalEntry::parse("# Title Here\n\nbody #real-tag").unwrap();
        assert!(entry.tags.contains("real-tag"));
        // "Title" must not leak in as a tag.
        assert!(!entry.tags.contains("title"));
    }

    #[test]
    fn test_empty_journal_rejected() {
        assert!(matches!(JournalEntry::parse("   \n \n"), Err(JournalError::Empty)));
    }

    #[test]
    fn test_tags_lowercased_and_deduped() {
        let entry = JournalEntry::parse("notes #Rust #rust #Async").unwrap();
        assert_eq!(entry.tags.len(), 2);
        assert!(entry.tags.contains("rust"));
        assert!(entry.tags.contains("async"));
    }

    #[test]
    fn test_preview_truncates() {
        let entry = JournalEntry::parse("0123456789").unwrap();
        assert_eq!(entry.preview(4), "0123…");
        assert_eq!(entry.preview(100), "0123456789");
    }
}
