use std::collections::BTreeMap;

use anyhow::{Context, Result};
use regex::Regex;

use crate::model::{
    ExtractionResult, FieldDefinition, FieldType, FieldValue, NumberMention, SpanPosition,
};
use crate::rules::UnitTable;
use crate::util::{char_count, char_offset, find_literal, truncate_chars};

mod numeric;
#[cfg(test)]
mod tests;
mod textual;

use numeric::NumericPatterns;
use textual::{ListOrText, TextPatterns};

/// Characters kept in front of a keyword so "64GB 内存" style values are
/// still inside the span.
pub const BACKWARD_MARGIN: usize = 20;
pub const DEFAULT_WINDOW: usize = 80;

const SPAN_TEXT_LIMIT: usize = 200;
const NUMBER_CONTEXT_CHARS: usize = 30;

/// Text window around the first keyword hit. `start`/`end` are character
/// offsets into the document; `tail` is the part from the keyword onward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'a> {
    pub text: &'a str,
    pub tail: &'a str,
    pub start: usize,
    pub end: usize,
}

impl<'a> Span<'a> {
    /// Value search order: after the keyword first, then the whole window.
    pub fn regions(&self) -> [&'a str; 2] {
        [self.tail, self.text]
    }
}

fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

/// First keyword (in list order) present in `text`, expanded
/// `BACKWARD_MARGIN` characters back and `window` characters past the
/// keyword.
pub fn locate_span<'a, 'k>(
    text: &'a str,
    keywords: impl IntoIterator<Item = &'k str>,
    window: usize,
) -> Option<Span<'a>> {
    let lowered = text.to_ascii_lowercase();

    keywords.into_iter().find_map(|keyword| {
        let hit = find_literal(text, &lowered, keyword)?;

        let keyword_start = char_offset(text, hit);
        let start = keyword_start.saturating_sub(BACKWARD_MARGIN);
        let end = (keyword_start + char_count(keyword) + window).min(char_count(text));

        let start_byte = byte_index(text, start);
        let end_byte = byte_index(text, end);

        Some(Span {
            text: &text[start_byte..end_byte],
            tail: &text[hit..end_byte],
            start,
            end,
        })
    })
}

/// Discrete confidence for a parsed value.
pub fn confidence(value: Option<&FieldValue>, field_type: FieldType) -> f64 {
    let Some(value) = value.filter(|value| !value.is_empty()) else {
        return 0.0;
    };

    if field_type.is_numeric() {
        return match value.numeric() {
            Some(magnitude) if magnitude != 0.0 => 0.8,
            _ => 0.5,
        };
    }

    match field_type {
        FieldType::Enum => 0.9,
        FieldType::StorageSpec => match value {
            FieldValue::Storage(spec) => match (spec.media.is_some(), spec.magnitude.is_some()) {
                (true, true) => 0.85,
                (true, false) | (false, true) => 0.7,
                (false, false) => 0.5,
            },
            _ => 0.5,
        },
        _ if char_count(&value.display()) > 20 => 0.7,
        _ => 0.5,
    }
}

/// Stateless per-field value extraction. All patterns are compiled once in
/// `new`.
#[derive(Debug)]
pub struct FieldExtractor {
    numeric: NumericPatterns,
    text: TextPatterns,
    numbers: Regex,
    units: UnitTable,
}

impl FieldExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            numeric: NumericPatterns::new()?,
            text: TextPatterns::new()?,
            numbers: Regex::new(
                r"(?i)(\d+(?:\.\d+)?)\s*(GHz|GB|TB|G|T|W|瓦|核|台|套|个|mm|英寸|kg|h|小时)?",
            )
            .context("failed to compile number mention regex")?,
            units: UnitTable::builtin(),
        })
    }

    pub fn extract_field(
        &self,
        text: &str,
        definition: &FieldDefinition,
        units: &UnitTable,
    ) -> ExtractionResult {
        let Some(span) = locate_span(text, definition.keywords(), DEFAULT_WINDOW) else {
            return ExtractionResult::not_found(definition);
        };

        let value = self
            .parse_value(&span, definition, units)
            .filter(|value| !value.is_empty());

        ExtractionResult {
            field_id: definition.field_id.clone(),
            label: definition.display_label().to_string(),
            confidence: confidence(value.as_ref(), definition.field_type),
            found: value.is_some(),
            value,
            span_text: Some(truncate_chars(span.text, SPAN_TEXT_LIMIT).to_string()),
            position: Some(SpanPosition {
                start: span.start,
                end: span.end,
            }),
        }
    }

    /// One independent extraction per definition, keyed by `field_id`.
    pub fn extract_all_fields(
        &self,
        text: &str,
        fields: &[FieldDefinition],
        units: &UnitTable,
    ) -> BTreeMap<String, ExtractionResult> {
        fields
            .iter()
            .map(|definition| {
                (
                    definition.field_id.clone(),
                    self.extract_field(text, definition, units),
                )
            })
            .collect()
    }

    fn parse_value(
        &self,
        span: &Span<'_>,
        definition: &FieldDefinition,
        units: &UnitTable,
    ) -> Option<FieldValue> {
        match definition.field_type {
            FieldType::Integer => self
                .numeric
                .parse_integer(span, definition.hint)
                .map(FieldValue::Integer),
            FieldType::Float => self
                .numeric
                .parse_float(span, definition.hint)
                .map(FieldValue::Float),
            FieldType::IntegerWithComparator | FieldType::FloatWithComparator => self
                .numeric
                .parse_measure(span, definition, units)
                .map(FieldValue::Measure),
            FieldType::StorageSpec => self.numeric.parse_storage(span).map(FieldValue::Storage),
            FieldType::Enum => self
                .text
                .parse_enum(span, &definition.enums)
                .map(FieldValue::Text),
            FieldType::EnumOrText => self
                .text
                .parse_enum_or_text(span, &definition.enums)
                .map(FieldValue::Text),
            FieldType::ListOrText => match self.text.parse_list_or_text(span) {
                ListOrText::List(items) => Some(FieldValue::List(items)),
                ListOrText::Text(text) => Some(FieldValue::Text(text)),
            },
            FieldType::Text => self.text.parse_text(span).map(FieldValue::Text),
        }
    }

    /// Every numeric literal in `text` with its unit and surrounding
    /// context. Positions are character offsets.
    pub fn extract_numbers(&self, text: &str) -> Vec<NumberMention> {
        self.numbers
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let raw = caps.get(1)?.as_str();
                let value = raw.parse::<f64>().ok()?;

                let unit = caps.get(2).map(|unit| {
                    self.units
                        .normalize(unit.as_str())
                        .unwrap_or_else(|| unit.as_str().to_string())
                });

                let position = char_offset(text, whole.start());
                let end = char_offset(text, whole.end());
                let context_start = byte_index(text, position.saturating_sub(NUMBER_CONTEXT_CHARS));
                let context_end = byte_index(text, end + NUMBER_CONTEXT_CHARS);

                Some(NumberMention {
                    raw: raw.to_string(),
                    value,
                    unit,
                    context: text[context_start..context_end].to_string(),
                    position,
                })
            })
            .collect()
    }
}
