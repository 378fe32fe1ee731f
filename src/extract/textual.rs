use anyhow::{Context, Result};
use regex::Regex;

use super::Span;
use crate::util::{normalize_whitespace, truncate_chars};

const ENUM_TEXT_TOKEN_LIMIT: usize = 5;
const ENUM_TEXT_CHAR_LIMIT: usize = 50;
const LIST_TEXT_CHAR_LIMIT: usize = 100;
const TEXT_CHAR_LIMIT: usize = 300;

/// Section markers in the order they are consulted. The first family with
/// two or more hits decides where the first section ends.
const SECTION_BOUNDARIES: &[&str] = &[
    r"[一二三四五六七八九十]+、",
    r"\d+(?:、|\.(?:[^\d]|$))",
    r"[（(][一二三四五六七八九十\d]+[)）]",
    r"\n\s*\n",
];

#[derive(Debug)]
pub(super) struct TextPatterns {
    enum_tokens: Regex,
    list_separators: Regex,
    leading_enumerator: Regex,
    section_boundaries: Vec<Regex>,
}

impl TextPatterns {
    pub(super) fn new() -> Result<Self> {
        let section_boundaries = SECTION_BOUNDARIES
            .iter()
            .map(|pattern| {
                Regex::new(pattern)
                    .with_context(|| format!("failed to compile section boundary: {pattern}"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            enum_tokens: Regex::new(r"[\u{4e00}-\u{9fa5}]+|[a-zA-Z0-9]+")
                .context("failed to compile enum token regex")?,
            list_separators: Regex::new(r"[,，、;；\n]")
                .context("failed to compile list separator regex")?,
            leading_enumerator: Regex::new(r"^[\d.、)）\s]+")
                .context("failed to compile leading enumerator regex")?,
            section_boundaries,
        })
    }

    /// Case-insensitive containment against the allowed values; the first
    /// allowed value present wins.
    pub(super) fn parse_enum(&self, span: &Span<'_>, enums: &[String]) -> Option<String> {
        span.regions()
            .into_iter()
            .find_map(|region| match_enum(region, enums))
    }

    /// Enum values are searched tail first, then the whole window. The
    /// free-text fallback reads the tail only; it always holds the keyword.
    pub(super) fn parse_enum_or_text(&self, span: &Span<'_>, enums: &[String]) -> Option<String> {
        if let Some(value) = self.parse_enum(span, enums) {
            return Some(value);
        }

        let tokens: Vec<&str> = self
            .enum_tokens
            .find_iter(span.tail)
            .take(ENUM_TEXT_TOKEN_LIMIT)
            .map(|token| token.as_str())
            .collect();

        let value = if tokens.is_empty() {
            truncate_chars(span.tail, ENUM_TEXT_CHAR_LIMIT).trim().to_string()
        } else {
            truncate_chars(&tokens.join(" "), ENUM_TEXT_CHAR_LIMIT).to_string()
        };

        non_empty(value)
    }

    /// A list when the tail splits into more than one item, otherwise the
    /// leading text. Text before the keyword belongs to other fields and is
    /// never read.
    pub(super) fn parse_list_or_text(&self, span: &Span<'_>) -> ListOrText {
        let items: Vec<String> = self
            .list_separators
            .split(span.tail)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();

        if items.len() > 1 {
            ListOrText::List(items)
        } else {
            ListOrText::Text(truncate_chars(span.tail, LIST_TEXT_CHAR_LIMIT).trim().to_string())
        }
    }

    pub(super) fn parse_text(&self, span: &Span<'_>) -> Option<String> {
        let stripped = self.leading_enumerator.replace(span.tail, "");
        let mut section: &str = &stripped;

        for boundary in &self.section_boundaries {
            let hits: Vec<usize> = boundary
                .find_iter(section)
                .take(2)
                .map(|hit| hit.start())
                .collect();
            if hits.len() > 1 {
                section = &section[..hits[1]];
                break;
            }
        }

        let normalized = normalize_whitespace(section);
        non_empty(truncate_chars(&normalized, TEXT_CHAR_LIMIT).trim().to_string())
    }
}

pub(super) enum ListOrText {
    List(Vec<String>),
    Text(String),
}

fn match_enum(region: &str, enums: &[String]) -> Option<String> {
    let lowered = region.to_lowercase();
    enums
        .iter()
        .filter(|value| !value.trim().is_empty())
        .find(|value| lowered.contains(&value.to_lowercase()))
        .cloned()
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
