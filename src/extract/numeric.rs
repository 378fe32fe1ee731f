use anyhow::{Context, Result};
use regex::{Captures, Regex};
use tracing::debug;

use super::Span;
use crate::model::{Comparator, FieldDefinition, Measure, SemanticHint, StorageSpec};
use crate::rules::UnitTable;

/// Leading comparator tokens. Multi-word English tokens match across any
/// whitespace run.
const COMPARATOR_TOKENS: &[(&str, Comparator)] = &[
    ("≥", Comparator::Gte),
    (">=", Comparator::Gte),
    ("不少于", Comparator::Gte),
    ("不低于", Comparator::Gte),
    ("不小于", Comparator::Gte),
    ("至少", Comparator::Gte),
    ("大于等于", Comparator::Gte),
    ("at least", Comparator::Gte),
    ("no less than", Comparator::Gte),
    ("not less than", Comparator::Gte),
    ("≤", Comparator::Lte),
    ("<=", Comparator::Lte),
    ("不高于", Comparator::Lte),
    ("不超过", Comparator::Lte),
    ("不大于", Comparator::Lte),
    ("至多", Comparator::Lte),
    ("小于等于", Comparator::Lte),
    ("at most", Comparator::Lte),
    ("no more than", Comparator::Lte),
    ("not more than", Comparator::Lte),
    (">", Comparator::Gt),
    ("大于", Comparator::Gt),
    ("超过", Comparator::Gt),
    ("more than", Comparator::Gt),
    ("greater than", Comparator::Gt),
    ("<", Comparator::Lt),
    ("小于", Comparator::Lt),
    ("less than", Comparator::Lt),
];

const TRAILING_GTE: &[&str] = &["及以上", "以上", "or more", "or above", "or higher"];
const TRAILING_LTE: &[&str] = &["及以下", "以下", "or less", "or below", "or lower"];

const NUMBER: &str = r"\d+(?:\.\d+)?";

const CORE_COUNT_PATTERNS: &[&str] = &[
    r"(?:不少于|不低于|至少|≥|>=)\s*(\d+)\s*核(?:心)?(?:以上|以下)?",
    r"(\d+)\s*核(?:心)?(?:以上|以下)?(?:，|,|\s|$)",
    r"(?:核心数|核数)\s*[:：]?\s*(\d+)",
    r"(?i)(\d+)\s*(?:physical\s+)?cores?\b",
    r"(?i)cores?\s*[:：]?\s*(\d+)",
];

const MEMORY_CAPACITY_PATTERNS: &[&str] = &[
    r"(?i)内存(?:容量)?\s*[:：]?\s*(\d+)\s*(?:GB|TB)",
    r"(?i)容量\s*[:：]?\s*(\d+)\s*(?:GB|TB)",
    r"(?i)(?:memory|ram)\s*[:：]?\s*(?:≥|>=)?\s*(\d+)\s*(?:GB|TB)",
    r"(?i)(\d+)\s*(?:GB|TB)\s*(?:内存|memory|RAM)",
];

const QUANTITY_PATTERNS: &[&str] = &[
    r"(?:采购)?数量\s*[:：]?\s*(\d+)\s*(?:台|套|节点|个)?",
    r"(\d+)\s*(?:台|套|节点|个)(?:\s|$|,|，)",
    r"(?i)quantity\s*[:：]?\s*(\d+)",
    r"(?i)(\d+)\s*(?:units|sets|nodes)\b",
];

const BATTERY_LIFE_PATTERNS: &[&str] = &[
    r"(?i)(?:续航|电池(?:续航)?)\s*[:：]?\s*(\d+)\s*(?:小时|h)",
    r"(?i)battery(?:\s+life)?\s*[:：]?\s*(\d+)\s*(?:hours?|h)",
    r"(?i)(\d+)\s*(?:小时|hours?|h)",
];

const STORAGE_CAPACITY_PATTERNS: &[&str] = &[
    r"(?i)(?:硬盘|SSD|存储)\s*[:：]?\s*(\d+)\s*(?:GB|TB)",
    r"(?i)(?:disk|storage)\s*[:：]?\s*(\d+)\s*(?:GB|TB)",
    r"(?i)(\d+)\s*(?:GB|TB)",
];

const GENERIC_INTEGER_PATTERNS: &[&str] = &[
    r"(\d+)\s*核(?:心)?(?:以上|以下)?",
    r"(?i)内存(?:容量)?\s*[:：]?\s*(\d+)\s*(?:GB|TB)",
    r"(?:采购)?数量\s*[:：]?\s*(\d+)",
    r"(\d+)",
];

const FALLBACK_INTEGER_PATTERNS: &[&str] = &[
    r"(\d+)\s*核(?:心)?(?:以上|以下)?(?:，|,|\s|$)",
    r"(?:不少于|不低于|至少|≥|>=)\s*(\d+)\s*核(?:心)?",
    r"(?i)内存(?:容量)?\s*[:：]?\s*(\d+)\s*(?:GB|TB)",
    r"(?:采购)?数量\s*[:：]?\s*(\d+)\s*(?:台|套|节点|个)",
    r"(\d+)\s*(?:台|套|节点)(?:\s|$|,|，)",
];

const FREQUENCY_PATTERNS: &[&str] = &[
    r"(?i)(\d+(?:\.\d+)?)\s*GHz",
    r"主频\s*[:：]?\s*(\d+(?:\.\d+)?)",
    r"(?i)(?:frequency|clock)\s*[:：]?\s*(\d+(?:\.\d+)?)",
];

const WEIGHT_PATTERNS: &[&str] = &[r"(?i)(\d+(?:\.\d+)?)\s*(?:kg|千克|公斤)"];

const SCREEN_SIZE_PATTERNS: &[&str] = &[r#"(?i)(\d+(?:\.\d+)?)\s*(?:英寸|inches|inch|")"#];

const BATTERY_LIFE_FLOAT_PATTERNS: &[&str] =
    &[r"(?i)(?:续航|电池|battery)?\s*(\d+(?:\.\d+)?)\s*(?:小时|hours?|h)"];

const GENERIC_FLOAT_PATTERNS: &[&str] = &[
    r"(?i)(\d+(?:\.\d+)?)\s*(?:GHz|GB|TB|kg|mm|inch|小时|h)",
    r"(\d+(?:\.\d+)?)",
];

fn compile_family(family: &str, patterns: &[&str]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern)
                .with_context(|| format!("failed to compile {family} pattern: {pattern}"))
        })
        .collect()
}

fn comparator_alternation() -> String {
    let mut tokens: Vec<&str> = COMPARATOR_TOKENS.iter().map(|(token, _)| *token).collect();
    tokens.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));

    tokens
        .iter()
        .map(|token| {
            token
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<String>>()
                .join(r"\s+")
        })
        .collect::<Vec<String>>()
        .join("|")
}

fn lookup_comparator(raw: &str) -> Option<Comparator> {
    let normalized = crate::util::normalize_whitespace(raw).to_lowercase();
    COMPARATOR_TOKENS
        .iter()
        .find(|(token, _)| *token == normalized)
        .map(|(_, comparator)| *comparator)
}

fn trailing_comparator(rest: &str) -> Option<Comparator> {
    let rest = rest.trim_start().to_lowercase();
    if TRAILING_GTE.iter().any(|token| rest.starts_with(token)) {
        Some(Comparator::Gte)
    } else if TRAILING_LTE.iter().any(|token| rest.starts_with(token)) {
        Some(Comparator::Lte)
    } else {
        None
    }
}

fn parse_number<T: std::str::FromStr>(caps: &Captures<'_>, group: usize) -> Option<T> {
    let raw = caps.get(group)?.as_str();
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            debug!(token = %raw, "skipping unparsable numeric token");
            None
        }
    }
}

/// Compiled numeric pattern families, one per semantic hint plus the
/// generic chains.
#[derive(Debug)]
pub(super) struct NumericPatterns {
    core_count: Vec<Regex>,
    memory_capacity: Vec<Regex>,
    quantity: Vec<Regex>,
    battery_life: Vec<Regex>,
    storage_capacity: Vec<Regex>,
    generic_integer: Vec<Regex>,
    fallback_integer: Vec<Regex>,
    frequency: Vec<Regex>,
    weight: Vec<Regex>,
    screen_size: Vec<Regex>,
    battery_life_float: Vec<Regex>,
    generic_float: Vec<Regex>,
    measure: Regex,
    storage_media: Vec<(Regex, &'static str)>,
    storage_capacity_forms: Vec<Regex>,
}

impl NumericPatterns {
    pub(super) fn new() -> Result<Self> {
        let comparators = comparator_alternation();
        let measure = Regex::new(&format!(r"(?i)(?P<cmp>{comparators})?\s*(?P<num>{NUMBER})"))
            .context("failed to compile comparator pattern")?;

        let capacity_unit = r"(?P<unit>TB|GB|T|G)";
        let capacity_forms = [
            format!(
                r"(?i)(?P<cmp>{comparators})?\s*(?P<num>{NUMBER})\s*{capacity_unit}\s*(?:SSD|NVMe|固态)"
            ),
            format!(
                r"(?i)(?:硬盘|系统盘|数据盘|存储|SSD|NVMe|disk|storage)\s*[:：]?\s*(?P<cmp>{comparators})?\s*(?P<num>{NUMBER})\s*{capacity_unit}(?:[^a-zA-Z]|$)"
            ),
            format!(
                r"(?i)(?P<cmp>{comparators})?\s*(?P<num>{NUMBER})\s*{capacity_unit}(?:[^a-zA-Z]|$)"
            ),
        ];
        let capacity_forms: Vec<&str> = capacity_forms.iter().map(String::as_str).collect();
        let storage_capacity_forms = compile_family("storage capacity", &capacity_forms)?;

        let storage_media = vec![
            (
                Regex::new(r"(?i)nvme").context("failed to compile NVMe media pattern")?,
                "NVMe",
            ),
            (
                Regex::new(r"(?i)ssd|固态").context("failed to compile SSD media pattern")?,
                "SSD",
            ),
            (
                Regex::new(r"(?i)hdd|机械|sata").context("failed to compile HDD media pattern")?,
                "HDD",
            ),
        ];

        Ok(Self {
            core_count: compile_family("core count", CORE_COUNT_PATTERNS)?,
            memory_capacity: compile_family("memory capacity", MEMORY_CAPACITY_PATTERNS)?,
            quantity: compile_family("quantity", QUANTITY_PATTERNS)?,
            battery_life: compile_family("battery life", BATTERY_LIFE_PATTERNS)?,
            storage_capacity: compile_family("storage capacity", STORAGE_CAPACITY_PATTERNS)?,
            generic_integer: compile_family("generic integer", GENERIC_INTEGER_PATTERNS)?,
            fallback_integer: compile_family("fallback integer", FALLBACK_INTEGER_PATTERNS)?,
            frequency: compile_family("frequency", FREQUENCY_PATTERNS)?,
            weight: compile_family("weight", WEIGHT_PATTERNS)?,
            screen_size: compile_family("screen size", SCREEN_SIZE_PATTERNS)?,
            battery_life_float: compile_family("battery life", BATTERY_LIFE_FLOAT_PATTERNS)?,
            generic_float: compile_family("generic float", GENERIC_FLOAT_PATTERNS)?,
            measure,
            storage_media,
            storage_capacity_forms,
        })
    }

    fn integer_family(&self, hint: SemanticHint) -> &[Regex] {
        match hint {
            SemanticHint::CoreCount => &self.core_count,
            SemanticHint::MemoryCapacity => &self.memory_capacity,
            SemanticHint::Quantity => &self.quantity,
            SemanticHint::BatteryLife => &self.battery_life,
            SemanticHint::StorageCapacity => &self.storage_capacity,
            SemanticHint::None
            | SemanticHint::Frequency
            | SemanticHint::Weight
            | SemanticHint::ScreenSize => &self.generic_integer,
        }
    }

    fn float_family(&self, hint: SemanticHint) -> &[Regex] {
        match hint {
            SemanticHint::Frequency => &self.frequency,
            SemanticHint::Weight => &self.weight,
            SemanticHint::ScreenSize => &self.screen_size,
            SemanticHint::BatteryLife => &self.battery_life_float,
            SemanticHint::None
            | SemanticHint::CoreCount
            | SemanticHint::MemoryCapacity
            | SemanticHint::Quantity
            | SemanticHint::StorageCapacity => &[],
        }
    }

    pub(super) fn parse_integer(&self, span: &Span<'_>, hint: SemanticHint) -> Option<i64> {
        let chain: Vec<&Regex> = self
            .integer_family(hint)
            .iter()
            .chain(self.fallback_integer.iter())
            .collect();

        first_capture(span, &chain)
    }

    pub(super) fn parse_float(&self, span: &Span<'_>, hint: SemanticHint) -> Option<f64> {
        let chain: Vec<&Regex> = self
            .float_family(hint)
            .iter()
            .chain(self.generic_float.iter())
            .collect();

        first_capture(span, &chain)
    }

    /// Comparator value for `*_with_comparator` fields. A candidate carrying
    /// the field's unit wins over one that does not; candidates after the
    /// keyword win over ones in the backward margin.
    pub(super) fn parse_measure(
        &self,
        span: &Span<'_>,
        definition: &FieldDefinition,
        units: &UnitTable,
    ) -> Option<Measure> {
        let declared_unit = definition
            .unit
            .as_deref()
            .filter(|unit| !unit.trim().is_empty())
            .map(|unit| units.normalize(unit).unwrap_or_else(|| unit.to_string()));
        let preferred_unit = declared_unit
            .clone()
            .or_else(|| definition.hint.default_unit().map(str::to_string));

        let per_region: Vec<Vec<Measure>> = span
            .regions()
            .into_iter()
            .map(|region| self.measure_candidates(region, units))
            .collect();

        let by_unit = preferred_unit.as_deref().and_then(|preferred| {
            per_region
                .iter()
                .flatten()
                .find(|candidate| candidate.unit.as_deref() == Some(preferred))
        });

        let mut chosen = by_unit
            .or_else(|| per_region.iter().flatten().next())
            .cloned()?;

        if chosen.unit.is_none() {
            chosen.unit = preferred_unit;
        }
        Some(chosen)
    }

    fn measure_candidates(&self, region: &str, units: &UnitTable) -> Vec<Measure> {
        self.measure
            .captures_iter(region)
            .filter_map(|caps| {
                let magnitude: f64 = parse_number(&caps, 2)?;
                let number_end = caps.name("num")?.end();

                let after_number = &region[number_end..];
                let unit_start = after_number.len() - after_number.trim_start().len();
                let (unit, rest) = match units.match_prefix(&after_number[unit_start..]) {
                    Some((canonical, consumed)) => {
                        (Some(canonical), &after_number[unit_start + consumed..])
                    }
                    None => (None, after_number),
                };

                let comparator = match caps.name("cmp") {
                    Some(token) => lookup_comparator(token.as_str()).unwrap_or_default(),
                    None => trailing_comparator(rest).unwrap_or_default(),
                };

                Some(Measure {
                    comparator,
                    magnitude,
                    unit,
                })
            })
            .collect()
    }

    /// Medium and capacity are matched independently; either alone is a
    /// usable value.
    pub(super) fn parse_storage(&self, span: &Span<'_>) -> Option<StorageSpec> {
        let media = span.regions().into_iter().find_map(|region| {
            self.storage_media
                .iter()
                .find(|(regex, _)| regex.is_match(region))
                .map(|(_, media)| media.to_string())
        });

        let mut spec = StorageSpec {
            media,
            ..StorageSpec::default()
        };

        let capacity = span.regions().into_iter().find_map(|region| {
            self.storage_capacity_forms
                .iter()
                .find_map(|regex| regex.captures(region))
        });

        if let Some(caps) = capacity {
            if let Some(magnitude) = caps
                .name("num")
                .and_then(|value| value.as_str().parse::<f64>().ok())
            {
                let unit = caps
                    .name("unit")
                    .map(|unit| unit.as_str().to_ascii_uppercase())
                    .map(|unit| match unit.as_str() {
                        "G" => "GB".to_string(),
                        "T" => "TB".to_string(),
                        _ => unit,
                    });

                spec.comparator = Some(
                    caps.name("cmp")
                        .and_then(|token| lookup_comparator(token.as_str()))
                        .unwrap_or_default(),
                );
                spec.magnitude = Some(magnitude);
                spec.unit = unit;
            }
        }

        if spec.is_empty() { None } else { Some(spec) }
    }
}

fn first_capture<T: std::str::FromStr>(span: &Span<'_>, chain: &[&Regex]) -> Option<T> {
    for region in span.regions() {
        for regex in chain {
            let Some(caps) = regex.captures(region) else {
                continue;
            };
            if let Some(value) = parse_number(&caps, 1) {
                return Some(value);
            }
        }
    }

    None
}
