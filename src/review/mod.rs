use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::extract::FieldExtractor;
use crate::model::{
    CategoryInfo, ComplianceReport, DetectionType, ExtractedField, FieldDefinition, FieldSummary,
    FieldValidation, FieldValue, Issue, IssueKind, IssueLevel, ReviewMode, ReviewReport,
    SeverityCounts,
};
use crate::risk::{RiskDetector, load_lexicon, risk_summary};
use crate::rules::{BundledProvider, RuleEngine, SchemaProvider};
use crate::util::{char_count, contains_literal};

mod generic;
#[cfg(test)]
mod tests;

use generic::{GenericChecks, generic_score};

const SLOGAN_MAX_CHARS: usize = 50;
const MISSING_LABELS_IN_SUGGESTION: usize = 3;

const SUGGEST_VAGUE: &str = "replace vague or absolute wording with concrete, measurable descriptions";
const SUGGEST_VERIFIABILITY: &str =
    "add concrete numeric indicators and acceptance criteria so the requirement can be verified";
const SUGGEST_RISK: &str =
    "rewrite brand, model and benchmark references as neutral performance parameters";
const SUGGEST_ADEQUATE: &str =
    "document quality is adequate; consider adding implementation and acceptance details";

/// Runs complete reviews over rule data from one schema provider.
#[derive(Debug)]
pub struct Reviewer {
    engine: RuleEngine,
    extractor: FieldExtractor,
    detector: RiskDetector,
    generic: GenericChecks,
}

impl Reviewer {
    pub fn new(provider: Arc<dyn SchemaProvider>) -> Result<Self> {
        let lexicon = load_lexicon(provider.as_ref());
        Ok(Self {
            engine: RuleEngine::new(provider),
            extractor: FieldExtractor::new()?,
            detector: RiskDetector::with_lexicon(&lexicon),
            generic: GenericChecks::new()?,
        })
    }

    /// Reviewer over the rule data compiled into the binary.
    pub fn bundled() -> Result<Self> {
        Self::new(Arc::new(BundledProvider))
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn lexicon_version(&self) -> Option<&str> {
        self.detector.lexicon_version()
    }

    pub fn available_categories(&self) -> Vec<CategoryInfo> {
        self.engine.available_categories()
    }

    pub fn category_fields(&self, category: &str, subtype: Option<&str>) -> Vec<FieldSummary> {
        self.engine
            .get_fields(category, subtype)
            .iter()
            .map(FieldSummary::from)
            .collect()
    }

    /// Risk scan alone, with the rules a review of the same category uses.
    pub fn check_compliance(&self, text: &str, category: Option<&str>) -> ComplianceReport {
        let rules = match category {
            Some(category) => self.engine.get_risk_rules(category),
            None => self.engine.default_risk_rules(),
        };
        self.detector.check_text_compliance(text, &rules)
    }

    /// Category-guided when a category is given and it defines fields for
    /// the subtype, generic otherwise. Never fails.
    pub fn review(&self, text: &str, category: Option<&str>, subtype: Option<&str>) -> ReviewReport {
        let report = match category {
            Some(category) => self.review_category(text, category, subtype),
            None => self.review_generic(text),
        };

        debug!(
            mode = ?report.mode,
            category = ?report.category,
            issues = report.counts.total,
            score = report.completeness_score,
            "review finished"
        );
        report
    }

    fn review_category(&self, text: &str, category: &str, subtype: Option<&str>) -> ReviewReport {
        let rule_set = self.engine.rule_set(category);
        let fields = rule_set.fields_for(subtype);
        if fields.is_empty() {
            debug!(category = %rule_set.category_id, subtype = ?subtype, "no fields configured, using generic review");
            return self.review_generic(text);
        }

        let results = self
            .extractor
            .extract_all_fields(text, &fields, &rule_set.units);

        let mut issues = Vec::new();
        let mut missing_labels = Vec::new();
        let mut p0_total = 0usize;
        let mut p0_found = 0usize;

        for definition in fields.iter().filter(|field| field.applies_to(subtype)) {
            let value = results
                .get(&definition.field_id)
                .filter(|result| result.found)
                .and_then(|result| result.value.as_ref());

            if definition.is_mandatory() {
                p0_total += 1;
            }

            let Some(value) = value else {
                if definition.is_mandatory() {
                    issues.push(missing_field_issue(definition));
                    missing_labels.push(definition.display_label().to_string());
                }
                continue;
            };

            if definition.is_mandatory() {
                p0_found += 1;
            }
            if let Some(validation) = &definition.validation {
                validate_value(definition, validation, value, &mut issues);
            }
        }

        let risks = self.detector.detect_risks(text, &rule_set.risk_rules);
        issues.extend(risks.iter().map(Issue::from_risk));

        let extracted_fields: BTreeMap<String, ExtractedField> = results
            .into_iter()
            .filter_map(|(field_id, result)| {
                let value = result.value.filter(|_| result.found)?;
                Some((
                    field_id,
                    ExtractedField {
                        label: result.label,
                        value,
                        confidence: result.confidence,
                    },
                ))
            })
            .collect();

        let counts = SeverityCounts::from_issues(&issues);
        ReviewReport {
            mode: ReviewMode::Category,
            category: Some(category.to_string()),
            subtype: subtype.map(str::to_string),
            suggestions: synthesize_suggestions(&issues, &missing_labels),
            completeness_score: category_score(p0_found, p0_total, &counts),
            counts,
            issues,
            extracted_fields,
            missing_p0_count: missing_labels.len(),
            risk_summary: risk_summary(&risks),
            ruleset: rule_set.stamp.clone(),
        }
    }

    fn review_generic(&self, text: &str) -> ReviewReport {
        let numeric_literals = self.extractor.extract_numbers(text).len();
        let mut issues = self.generic.issues(text, numeric_literals);

        let risks = self
            .detector
            .detect_risks(text, &self.engine.default_risk_rules());
        issues.extend(risks.iter().map(Issue::from_risk));

        ReviewReport {
            mode: ReviewMode::Generic,
            category: None,
            subtype: None,
            suggestions: synthesize_suggestions(&issues, &[]),
            completeness_score: generic_score(&issues, text),
            counts: SeverityCounts::from_issues(&issues),
            issues,
            extracted_fields: BTreeMap::new(),
            missing_p0_count: 0,
            risk_summary: risk_summary(&risks),
            ruleset: None,
        }
    }
}

fn missing_field_issue(definition: &FieldDefinition) -> Issue {
    let label = definition.display_label();
    let suggestion = definition
        .validation
        .as_ref()
        .and_then(|validation| validation.message.clone())
        .unwrap_or_else(|| format!("add {label} to the requirement"));

    Issue::new(
        IssueKind::MissingField,
        IssueLevel::Error,
        format!("missing field: {label}"),
        suggestion,
    )
    .for_field(&definition.field_id)
}

fn validate_value(
    definition: &FieldDefinition,
    validation: &FieldValidation,
    value: &FieldValue,
    issues: &mut Vec<Issue>,
) {
    let label = definition.display_label();
    let hint = validation.message.as_deref();

    if let Some(text) = value.as_text() {
        let lowered = text.to_ascii_lowercase();

        for word in &validation.reject_if_contains {
            if word.is_empty() || !contains_literal(text, &lowered, word) {
                continue;
            }
            let mut issue = Issue::new(
                IssueKind::InvalidContent,
                IssueLevel::Warning,
                format!("{label} contains unmeasurable wording: {word}"),
                hint.unwrap_or("describe it with measurable content"),
            )
            .for_field(&definition.field_id);
            issue.matched = Some(word.clone());
            issues.push(issue);
        }

        // Short values built around a stock phrase carry no real content.
        if char_count(text) < SLOGAN_MAX_CHARS {
            let slogan = validation
                .reject_if_only_contains
                .iter()
                .find(|phrase| !phrase.is_empty() && contains_literal(text, &lowered, phrase));
            if let Some(phrase) = slogan {
                let mut issue = Issue::new(
                    IssueKind::SloganContent,
                    IssueLevel::Warning,
                    format!("{label} reads like a slogan without concrete content"),
                    hint.unwrap_or("state the concrete content behind it"),
                )
                .for_field(&definition.field_id);
                issue.matched = Some(phrase.clone());
                issues.push(issue);
            }
        }
    }

    if let (Some(min_value), Some(actual)) = (validation.min_value, value.numeric()) {
        if actual < min_value {
            issues.push(
                Issue::new(
                    IssueKind::InvalidValue,
                    IssueLevel::Warning,
                    format!("{label} value {actual} is below the minimum of {min_value}"),
                    format!("confirm {label} meets the minimum of {min_value}"),
                )
                .for_field(&definition.field_id),
            );
        }
    }
}

/// Half the score comes from P0 coverage, the rest is lost to issues.
fn category_score(p0_found: usize, p0_total: usize, counts: &SeverityCounts) -> f64 {
    let ratio = if p0_total == 0 {
        1.0
    } else {
        p0_found as f64 / p0_total as f64
    };

    let penalty =
        10.0 * counts.error as f64 + 5.0 * counts.warning as f64 + 2.0 * counts.info as f64;
    (100.0 * (0.5 + 0.5 * ratio) - penalty).clamp(0.0, 100.0)
}

/// One suggestion per triggered issue family, in a fixed order.
fn synthesize_suggestions(issues: &[Issue], missing_labels: &[String]) -> Vec<String> {
    let mut suggestions: Vec<String> = Vec::new();
    let mut push = |suggestion: String| {
        if !suggestions.contains(&suggestion) {
            suggestions.push(suggestion);
        }
    };

    if issues
        .iter()
        .any(|issue| matches!(issue.kind, IssueKind::MissingField | IssueKind::MissingElement))
    {
        if missing_labels.is_empty() {
            push("add the missing required elements".to_string());
        } else {
            let shown: Vec<&str> = missing_labels
                .iter()
                .take(MISSING_LABELS_IN_SUGGESTION)
                .map(String::as_str)
                .collect();
            push(format!("add the missing required fields: {}", shown.join(", ")));
        }
    }

    if issues.iter().any(|issue| {
        matches!(
            issue.kind,
            IssueKind::VagueExpression | IssueKind::AbsoluteExpression
        ) || issue.detection == Some(DetectionType::Vague)
    }) {
        push(SUGGEST_VAGUE.to_string());
    }

    if issues.iter().any(|issue| {
        issue.level == IssueLevel::Warning
            && matches!(
                issue.kind,
                IssueKind::Verifiability
                    | IssueKind::Completeness
                    | IssueKind::InvalidContent
                    | IssueKind::SloganContent
            )
    }) {
        push(SUGGEST_VERIFIABILITY.to_string());
    }

    if issues.iter().any(|issue| issue.kind == IssueKind::Risk) {
        push(SUGGEST_RISK.to_string());
    }

    if suggestions.is_empty() {
        suggestions.push(SUGGEST_ADEQUATE.to_string());
    }
    suggestions
}
