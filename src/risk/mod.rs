use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, warn};

use crate::model::{ComplianceReport, DetectedRisk, DetectionType, Priority, RiskSummary};
use crate::rules::{CompiledRiskRule, SchemaProvider, suggestion_for_rule};
use crate::util::{char_offset, find_literal};

mod lexicon;

pub use lexicon::{RiskLexicon, VagueTiers};

const BRAND_RULE_ID: &str = "risk.brand_directivity";
const MODEL_RULE_ID: &str = "risk.model_designation";
const VAGUE_RULE_ID: &str = "risk.vague_expression";
const BENCHMARK_RULE_ID: &str = "risk.benchmark_reference";

/// Lexicon supplied by the provider, or the built-in one when the provider
/// has none or it cannot be parsed.
pub fn load_lexicon(provider: &dyn SchemaProvider) -> RiskLexicon {
    match read_lexicon(provider) {
        Ok(Some(lexicon)) => {
            debug!(source = %provider.describe(), version = ?lexicon.version, "loaded risk lexicon");
            lexicon
        }
        Ok(None) => RiskLexicon::builtin(),
        Err(err) => {
            let reason = format!("{err:#}");
            warn!(source = %provider.describe(), error = %reason, "risk lexicon unavailable, using built-in lexicon");
            RiskLexicon::builtin()
        }
    }
}

fn read_lexicon(provider: &dyn SchemaProvider) -> Result<Option<RiskLexicon>> {
    let Some(raw) = provider.read_lexicon()? else {
        return Ok(None);
    };
    let lexicon = serde_json::from_str(&raw).context("failed to parse risk lexicon")?;
    Ok(Some(lexicon))
}

fn compile_patterns(family: &str, patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(regex) => Some(regex),
            Err(err) => {
                warn!(family = %family, pattern = %pattern, error = %err, "skipping invalid lexicon pattern");
                None
            }
        })
        .collect()
}

/// True when neither neighbour of `text[start..end]` is an ASCII letter or
/// digit.
fn on_ascii_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();

    !before.is_some_and(|c| c.is_ascii_alphanumeric())
        && !after.is_some_and(|c| c.is_ascii_alphanumeric())
}

fn is_likely_model(candidate: &str) -> bool {
    candidate.chars().count() >= 3
        && !candidate.chars().all(|c| c.is_ascii_digit())
        && candidate.chars().any(char::is_alphabetic)
}

/// Scans whole documents for directivity and vagueness signals.
#[derive(Debug, Clone)]
pub struct RiskDetector {
    lexicon_version: Option<String>,
    brands_localized: Vec<String>,
    brands_romanized: Vec<String>,
    model_patterns: Vec<Regex>,
    vague: Vec<(Priority, String)>,
    benchmark_patterns: Vec<Regex>,
}

impl Default for RiskDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskDetector {
    pub fn new() -> Self {
        Self::with_lexicon(&RiskLexicon::builtin())
    }

    pub fn with_lexicon(lexicon: &RiskLexicon) -> Self {
        let tiers = [
            (Priority::P0, &lexicon.vague.p0),
            (Priority::P1, &lexicon.vague.p1),
            (Priority::P2, &lexicon.vague.p2),
        ];
        let vague = tiers
            .into_iter()
            .flat_map(|(priority, phrases)| {
                phrases
                    .iter()
                    .filter(|phrase| !phrase.is_empty())
                    .map(move |phrase| (priority, phrase.clone()))
            })
            .collect();

        Self {
            lexicon_version: lexicon.version.clone(),
            brands_localized: lexicon.brands_localized.clone(),
            brands_romanized: lexicon.brands_romanized.clone(),
            model_patterns: compile_patterns("model", &lexicon.model_patterns),
            vague,
            benchmark_patterns: compile_patterns("benchmark", &lexicon.benchmark_patterns),
        }
    }

    pub fn lexicon_version(&self) -> Option<&str> {
        self.lexicon_version.as_deref()
    }

    /// Rule-driven matches first, then the brand, model, vague and
    /// benchmark passes; deduplicated on (rule_id, matched text) keeping the
    /// first occurrence.
    pub fn detect_risks(&self, text: &str, rules: &[CompiledRiskRule]) -> Vec<DetectedRisk> {
        let lowered = text.to_ascii_lowercase();

        let mut risks = Vec::new();
        for rule in rules {
            apply_rule(text, &lowered, rule, &mut risks);
        }
        self.detect_brands(text, &lowered, &mut risks);
        self.detect_models(text, &mut risks);
        self.detect_vague(text, &lowered, &mut risks);
        self.detect_benchmarks(text, &mut risks);

        let mut seen = HashSet::new();
        risks.retain(|risk| seen.insert((risk.rule_id.clone(), risk.matched.clone())));
        risks
    }

    pub fn check_text_compliance(
        &self,
        text: &str,
        rules: &[CompiledRiskRule],
    ) -> ComplianceReport {
        let risks = self.detect_risks(text, rules);
        let summary = risk_summary(&risks);

        let (blocking_risks, warning_risks): (Vec<DetectedRisk>, Vec<DetectedRisk>) = risks
            .into_iter()
            .partition(|risk| risk.priority == Priority::P0);

        ComplianceReport {
            is_compliant: !summary.has_blocking_risks,
            risk_count: summary.total,
            blocking_risks,
            warning_risks,
            summary,
        }
    }

    fn detect_brands(&self, text: &str, lowered: &str, risks: &mut Vec<DetectedRisk>) {
        for brand in &self.brands_localized {
            if brand.is_empty() {
                continue;
            }
            if let Some(index) = text.find(brand.as_str()) {
                risks.push(brand_risk(brand, char_offset(text, index)));
            }
        }

        for brand in &self.brands_romanized {
            let needle = brand.to_ascii_lowercase();
            if needle.is_empty() {
                continue;
            }
            let hit = lowered
                .match_indices(needle.as_str())
                .map(|(index, _)| index)
                .find(|index| on_ascii_boundary(text, *index, index + needle.len()));

            if let Some(index) = hit {
                let matched = &text[index..index + needle.len()];
                risks.push(brand_risk(matched, char_offset(text, index)));
            }
        }
    }

    fn detect_models(&self, text: &str, risks: &mut Vec<DetectedRisk>) {
        for pattern in &self.model_patterns {
            for found in pattern.find_iter(text) {
                // Patterns may run into trailing whitespace ("Radeon Pro");
                // the boundary is checked on the trimmed match.
                let raw = found.as_str();
                let matched = raw.trim();
                let start = found.start() + (raw.len() - raw.trim_start().len());
                let end = start + matched.len();
                if matched.is_empty()
                    || !on_ascii_boundary(text, start, end)
                    || !is_likely_model(matched)
                {
                    continue;
                }

                risks.push(DetectedRisk {
                    rule_id: MODEL_RULE_ID.to_string(),
                    detection: DetectionType::Model,
                    priority: Priority::P0,
                    matched: matched.to_string(),
                    message: format!(
                        "model designation \"{matched}\" points the requirement at a specific product"
                    ),
                    suggestion: suggestion_for_rule(MODEL_RULE_ID).to_string(),
                    position: Some(char_offset(text, start)),
                });
            }
        }
    }

    fn detect_vague(&self, text: &str, lowered: &str, risks: &mut Vec<DetectedRisk>) {
        for (priority, phrase) in &self.vague {
            let Some(index) = find_literal(text, lowered, phrase) else {
                continue;
            };

            risks.push(DetectedRisk {
                rule_id: VAGUE_RULE_ID.to_string(),
                detection: DetectionType::Vague,
                priority: *priority,
                matched: phrase.clone(),
                message: format!("vague wording \"{phrase}\""),
                suggestion: suggestion_for_rule(VAGUE_RULE_ID).to_string(),
                position: Some(char_offset(text, index)),
            });
        }
    }

    fn detect_benchmarks(&self, text: &str, risks: &mut Vec<DetectedRisk>) {
        for pattern in &self.benchmark_patterns {
            for found in pattern.find_iter(text) {
                let matched = found.as_str();
                risks.push(DetectedRisk {
                    rule_id: BENCHMARK_RULE_ID.to_string(),
                    detection: DetectionType::Benchmark,
                    priority: Priority::P1,
                    matched: matched.to_string(),
                    message: format!(
                        "benchmark reference \"{matched}\" points the requirement at a specific product"
                    ),
                    suggestion: suggestion_for_rule(BENCHMARK_RULE_ID).to_string(),
                    position: Some(char_offset(text, found.start())),
                });
            }
        }
    }
}

fn brand_risk(matched: &str, position: usize) -> DetectedRisk {
    DetectedRisk {
        rule_id: BRAND_RULE_ID.to_string(),
        detection: DetectionType::Brand,
        priority: Priority::P0,
        matched: matched.to_string(),
        message: format!("brand name \"{matched}\" points the requirement at a specific vendor"),
        suggestion: suggestion_for_rule(BRAND_RULE_ID).to_string(),
        position: Some(position),
    }
}

fn apply_rule(text: &str, lowered: &str, compiled: &CompiledRiskRule, risks: &mut Vec<DetectedRisk>) {
    let rule = &compiled.rule;
    let suggestion = rule
        .remediation
        .clone()
        .unwrap_or_else(|| suggestion_for_rule(&rule.rule_id).to_string());

    let literal_families = [
        (DetectionType::Keyword, "keyword", &rule.trigger.keywords),
        (DetectionType::Phrase, "phrase", &rule.trigger.phrases),
    ];
    for (detection, label, literals) in literal_families {
        for literal in literals {
            let Some(index) = find_literal(text, lowered, literal) else {
                continue;
            };
            risks.push(DetectedRisk {
                rule_id: rule.rule_id.clone(),
                detection,
                priority: rule.priority,
                matched: literal.clone(),
                message: format!("{} ({label}: {literal})", rule.report_message()),
                suggestion: suggestion.clone(),
                position: Some(char_offset(text, index)),
            });
        }
    }

    for regex in &compiled.regexes {
        for found in regex.find_iter(text) {
            if found.as_str().is_empty() {
                continue;
            }
            risks.push(DetectedRisk {
                rule_id: rule.rule_id.clone(),
                detection: DetectionType::Pattern,
                priority: rule.priority,
                matched: found.as_str().to_string(),
                message: format!("{} (matched: {})", rule.report_message(), found.as_str()),
                suggestion: suggestion.clone(),
                position: Some(char_offset(text, found.start())),
            });
        }
    }
}

/// Counts by priority and detection type.
pub fn risk_summary(risks: &[DetectedRisk]) -> RiskSummary {
    let mut summary = RiskSummary {
        total: risks.len(),
        ..RiskSummary::default()
    };

    for risk in risks {
        match risk.priority {
            Priority::P0 => summary.p0_count += 1,
            Priority::P1 => summary.p1_count += 1,
            Priority::P2 => summary.p2_count += 1,
        }
        *summary.by_type.entry(risk.detection).or_insert(0) += 1;
    }

    summary.has_blocking_risks = summary.p0_count > 0;
    summary
}
