use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Priority {
    P0,
    P1,
    #[default]
    P2,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::P0 => "P0",
            Self::P1 => "P1",
            Self::P2 => "P2",
        }
    }

    pub fn issue_level(self) -> IssueLevel {
        match self {
            Self::P0 => IssueLevel::Error,
            Self::P1 => IssueLevel::Warning,
            Self::P2 => IssueLevel::Info,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Integer,
    IntegerWithComparator,
    Float,
    FloatWithComparator,
    Enum,
    EnumOrText,
    StorageSpec,
    ListOrText,
    #[default]
    Text,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::IntegerWithComparator => "integer_with_comparator",
            Self::Float => "float",
            Self::FloatWithComparator => "float_with_comparator",
            Self::Enum => "enum",
            Self::EnumOrText => "enum_or_text",
            Self::StorageSpec => "storage_spec",
            Self::ListOrText => "list_or_text",
            Self::Text => "text",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Integer | Self::IntegerWithComparator | Self::Float | Self::FloatWithComparator
        )
    }
}

/// Declared role of a field; selects the numeric pattern family the
/// extractor tries first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticHint {
    #[default]
    None,
    CoreCount,
    MemoryCapacity,
    Quantity,
    BatteryLife,
    StorageCapacity,
    Frequency,
    Weight,
    ScreenSize,
}

impl SemanticHint {
    /// Unit assumed for a comparator value when neither the text nor the
    /// field definition names one.
    pub fn default_unit(self) -> Option<&'static str> {
        match self {
            Self::CoreCount => Some("cores"),
            Self::MemoryCapacity | Self::StorageCapacity => Some("GB"),
            Self::BatteryLife => Some("h"),
            Self::Frequency => Some("GHz"),
            Self::Weight => Some("kg"),
            Self::ScreenSize => Some("inch"),
            Self::None | Self::Quantity => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldValidation {
    #[serde(default, alias = "reject_if_contains_cn")]
    pub reject_if_contains: Vec<String>,
    #[serde(default, alias = "reject_if_only_contains_cn")]
    pub reject_if_only_contains: Vec<String>,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default, alias = "message_cn")]
    pub message: Option<String>,
}

impl FieldValidation {
    pub fn is_empty(&self) -> bool {
        self.reject_if_contains.is_empty()
            && self.reject_if_only_contains.is_empty()
            && self.min_value.is_none()
    }
}

fn default_required_for() -> Vec<String> {
    vec!["all".to_string()]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub field_id: String,
    #[serde(default, alias = "label_cn")]
    pub label: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub hint: SemanticHint,
    #[serde(default)]
    pub keywords_cn: Vec<String>,
    #[serde(default)]
    pub keywords_en: Vec<String>,
    #[serde(default = "default_required_for")]
    pub required_for: Vec<String>,
    #[serde(default)]
    pub validation: Option<FieldValidation>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub enums: Vec<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub group_label: Option<String>,
}

impl FieldDefinition {
    pub fn new(field_id: &str, field_type: FieldType) -> Self {
        Self {
            field_id: field_id.to_string(),
            label: field_id.to_string(),
            priority: Priority::default(),
            field_type,
            hint: SemanticHint::default(),
            keywords_cn: Vec::new(),
            keywords_en: Vec::new(),
            required_for: default_required_for(),
            validation: None,
            unit: None,
            enums: Vec::new(),
            group_id: None,
            group_label: None,
        }
    }

    /// Localized keywords first, then romanized ones.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.keywords_cn
            .iter()
            .chain(self.keywords_en.iter())
            .map(String::as_str)
    }

    /// Shared by the rule engine and the reviewer so field-set membership
    /// for a subtype is decided in one place.
    pub fn applies_to(&self, subtype: Option<&str>) -> bool {
        let Some(subtype) = subtype else {
            return true;
        };

        self.required_for
            .iter()
            .any(|value| value == "all" || value == subtype)
    }

    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.field_id
        } else {
            &self.label
        }
    }

    pub fn is_mandatory(&self) -> bool {
        self.priority == Priority::P0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    #[default]
    Eq,
    Gte,
    Lte,
    Gt,
    Lt,
}

impl Comparator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Lt => "<",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measure {
    pub comparator: Comparator,
    pub magnitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StorageSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparator: Option<Comparator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl StorageSpec {
    pub fn is_empty(&self) -> bool {
        self.media.is_none() && self.magnitude.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Measure(Measure),
    Storage(StorageSpec),
    List(Vec<String>),
    Text(String),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Storage(spec) => spec.is_empty(),
            Self::Integer(_) | Self::Float(_) | Self::Measure(_) => false,
        }
    }

    /// Direct numeric value, or the magnitude nested in a measure or
    /// storage value.
    pub fn numeric(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            Self::Measure(measure) => Some(measure.magnitude),
            Self::Storage(spec) => spec.magnitude,
            Self::List(_) | Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Integer(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Measure(measure) => format!(
                "{} {}{}",
                measure.comparator.symbol(),
                measure.magnitude,
                measure.unit.as_deref().unwrap_or("")
            ),
            Self::Storage(spec) => {
                let mut parts = Vec::new();
                if let Some(magnitude) = spec.magnitude {
                    parts.push(format!(
                        "{} {}{}",
                        spec.comparator.unwrap_or_default().symbol(),
                        magnitude,
                        spec.unit.as_deref().unwrap_or("")
                    ));
                }
                if let Some(media) = &spec.media {
                    parts.push(media.clone());
                }
                parts.join(" ")
            }
            Self::List(items) => items.join("; "),
            Self::Text(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpanPosition {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub field_id: String,
    pub label: String,
    pub value: Option<FieldValue>,
    pub confidence: f64,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<SpanPosition>,
}

impl ExtractionResult {
    pub fn not_found(definition: &FieldDefinition) -> Self {
        Self {
            field_id: definition.field_id.clone(),
            label: definition.display_label().to_string(),
            value: None,
            confidence: 0.0,
            found: false,
            span_text: None,
            position: None,
        }
    }
}

/// One numeric literal found anywhere in a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberMention {
    pub raw: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub context: String,
    pub position: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerPatterns {
    #[serde(default, alias = "cn_keywords")]
    pub keywords: Vec<String>,
    #[serde(default, alias = "cn_phrases")]
    pub phrases: Vec<String>,
    #[serde(default)]
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRule {
    pub rule_id: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, alias = "description_cn")]
    pub description: String,
    #[serde(default, alias = "trigger_patterns")]
    pub trigger: TriggerPatterns,
    #[serde(default, alias = "report_message_cn")]
    pub message: Option<String>,
    #[serde(default)]
    pub remediation: Option<String>,
}

impl RiskRule {
    pub fn report_message(&self) -> &str {
        self.message.as_deref().unwrap_or(&self.description)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionType {
    Brand,
    Model,
    Vague,
    Benchmark,
    Keyword,
    Phrase,
    Pattern,
}

impl DetectionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Brand => "brand",
            Self::Model => "model",
            Self::Vague => "vague",
            Self::Benchmark => "benchmark",
            Self::Keyword => "keyword",
            Self::Phrase => "phrase",
            Self::Pattern => "pattern",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedRisk {
    pub rule_id: String,
    #[serde(rename = "type")]
    pub detection: DetectionType,
    pub priority: Priority,
    pub matched: String,
    pub message: String,
    pub suggestion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiskSummary {
    pub total: usize,
    pub p0_count: usize,
    pub p1_count: usize,
    pub p2_count: usize,
    pub by_type: BTreeMap<DetectionType, usize>,
    pub has_blocking_risks: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceReport {
    pub is_compliant: bool,
    pub risk_count: usize,
    pub blocking_risks: Vec<DetectedRisk>,
    pub warning_risks: Vec<DetectedRisk>,
    pub summary: RiskSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueLevel {
    Error,
    Warning,
    Info,
}

impl IssueLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingField,
    MissingElement,
    InvalidContent,
    SloganContent,
    InvalidValue,
    VagueExpression,
    AbsoluteExpression,
    Completeness,
    Clarity,
    Verifiability,
    Risk,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub level: IssueLevel,
    pub message: String,
    pub suggestion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection: Option<DetectionType>,
}

impl Issue {
    pub fn new(
        kind: IssueKind,
        level: IssueLevel,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            level,
            message: message.into(),
            suggestion: suggestion.into(),
            field_id: None,
            rule_id: None,
            matched: None,
            detection: None,
        }
    }

    pub fn for_field(mut self, field_id: &str) -> Self {
        self.field_id = Some(field_id.to_string());
        self
    }

    pub fn from_risk(risk: &DetectedRisk) -> Self {
        Self {
            kind: IssueKind::Risk,
            level: risk.priority.issue_level(),
            message: risk.message.clone(),
            suggestion: risk.suggestion.clone(),
            field_id: None,
            rule_id: Some(risk.rule_id.clone()),
            matched: Some(risk.matched.clone()),
            detection: Some(risk.detection),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub total: usize,
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let mut counts = Self {
            total: issues.len(),
            ..Self::default()
        };
        for issue in issues {
            match issue.level {
                IssueLevel::Error => counts.error += 1,
                IssueLevel::Warning => counts.warning += 1,
                IssueLevel::Info => counts.info += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedField {
    pub label: String,
    pub value: FieldValue,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewMode {
    Category,
    Generic,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RulesetStamp {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewReport {
    pub mode: ReviewMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    pub issues: Vec<Issue>,
    pub suggestions: Vec<String>,
    pub completeness_score: f64,
    pub counts: SeverityCounts,
    pub extracted_fields: BTreeMap<String, ExtractedField>,
    pub missing_p0_count: usize,
    pub risk_summary: RiskSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ruleset: Option<RulesetStamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtypeInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub subtypes: Vec<SubtypeInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSummary {
    pub field_id: String,
    pub label: String,
    pub priority: Priority,
    pub field_type: FieldType,
    pub required: bool,
}

impl From<&FieldDefinition> for FieldSummary {
    fn from(definition: &FieldDefinition) -> Self {
        Self {
            field_id: definition.field_id.clone(),
            label: definition.display_label().to_string(),
            priority: definition.priority,
            field_type: definition.field_type,
            required: definition.is_mandatory(),
        }
    }
}
