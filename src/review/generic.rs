use anyhow::{Context, Result};
use regex::Regex;

use crate::model::{Issue, IssueKind, IssueLevel};
use crate::util::{char_count, contains_literal, find_literal};

const MIN_DOCUMENT_CHARS: usize = 100;
const LONG_SENTENCE_CHARS: usize = 100;
const MIN_NUMERIC_LITERALS: usize = 3;
const SHORT_INCOMPLETE_CAP: f64 = 59.0;

/// (element name, keywords). An element is present when any keyword is.
const REQUIRED_ELEMENTS: &[(&str, &[&str])] = &[
    (
        "purpose",
        &[
            "用途",
            "应用场景",
            "使用场景",
            "应用于",
            "用于",
            "purpose",
            "use case",
            "intended use",
        ],
    ),
    (
        "functional scope",
        &[
            "功能",
            "功能模块",
            "功能描述",
            "功能要求",
            "功能说明",
            "function",
            "feature",
        ],
    ),
    (
        "key performance indicators",
        &[
            "性能",
            "指标",
            "参数",
            "响应时间",
            "处理能力",
            "吞吐量",
            "performance",
            "indicator",
            "throughput",
            "response time",
            "kpi",
        ],
    ),
];

const VAGUE_PHRASES: &[&str] = &[
    "大约",
    "大概",
    "左右",
    "尽可能",
    "尽量",
    "高性能",
    "approximately",
    "as much as possible",
];

const ABSOLUTE_PHRASES: &[&str] = &["必须", "绝对", "一定", "确保", "保证", "absolutely", "guarantee"];

const TECH_KEYWORDS: &[&str] = &[
    "参数",
    "规格",
    "配置",
    "技术要求",
    "specification",
    "configuration",
    "technical requirement",
];

/// Category-less heuristics: required elements, phrasing and document
/// structure.
#[derive(Debug)]
pub(super) struct GenericChecks {
    sentence_split: Regex,
}

impl GenericChecks {
    pub(super) fn new() -> Result<Self> {
        Ok(Self {
            sentence_split: Regex::new(r"[。！？；!?;]|\.(?:\s|$)")
                .context("failed to compile sentence split regex")?,
        })
    }

    /// Issues from every generic check, in report order. `numeric_literals`
    /// is the number of numbers found in `text`.
    pub(super) fn issues(&self, text: &str, numeric_literals: usize) -> Vec<Issue> {
        let lowered = text.to_ascii_lowercase();
        let mut issues = Vec::new();

        let missing: Vec<&str> = REQUIRED_ELEMENTS
            .iter()
            .filter(|(_, keywords)| {
                !keywords
                    .iter()
                    .any(|keyword| contains_literal(text, &lowered, keyword))
            })
            .map(|(element, _)| *element)
            .collect();
        if !missing.is_empty() {
            let names = missing.join(", ");
            issues.push(Issue::new(
                IssueKind::MissingElement,
                IssueLevel::Error,
                format!("missing required elements: {names}"),
                format!("describe the {names} in detail"),
            ));
        }

        let phrase_families = [
            (IssueKind::VagueExpression, "vague", VAGUE_PHRASES),
            (IssueKind::AbsoluteExpression, "absolute", ABSOLUTE_PHRASES),
        ];
        for (kind, label, phrases) in phrase_families {
            for phrase in phrases {
                if find_literal(text, &lowered, phrase).is_none() {
                    continue;
                }
                let mut issue = Issue::new(
                    kind,
                    IssueLevel::Warning,
                    format!("{label} wording: \"{phrase}\""),
                    "use concrete, measurable wording",
                );
                issue.matched = Some(phrase.to_string());
                issues.push(issue);
            }
        }

        if char_count(text) < MIN_DOCUMENT_CHARS {
            issues.push(Issue::new(
                IssueKind::Completeness,
                IssueLevel::Error,
                "requirement document is too short",
                "add more requirement detail",
            ));
        }

        if !TECH_KEYWORDS
            .iter()
            .any(|keyword| contains_literal(text, &lowered, keyword))
        {
            issues.push(Issue::new(
                IssueKind::Completeness,
                IssueLevel::Info,
                "no technical parameters are described",
                "add concrete technical parameters",
            ));
        }

        let long_sentences = self
            .sentence_split
            .split(text)
            .filter(|sentence| char_count(sentence.trim()) > LONG_SENTENCE_CHARS)
            .count();
        if long_sentences > 0 {
            issues.push(Issue::new(
                IssueKind::Clarity,
                IssueLevel::Info,
                format!("found {long_sentences} overly long sentences"),
                "split long sentences into shorter ones",
            ));
        }

        if numeric_literals < MIN_NUMERIC_LITERALS {
            issues.push(Issue::new(
                IssueKind::Verifiability,
                IssueLevel::Warning,
                "few quantifiable indicators",
                "add concrete numeric indicators to support acceptance testing",
            ));
        }

        issues
    }
}

/// 100 minus 15/8/3 per error/warning/info, with a small bonus for longer
/// documents. A document under `MIN_DOCUMENT_CHARS` that misses required
/// elements never reaches `SHORT_INCOMPLETE_CAP`, however many numbers or
/// technical keywords it carries.
pub(super) fn generic_score(issues: &[Issue], text: &str) -> f64 {
    let mut score = 100.0;
    for issue in issues {
        score -= match issue.level {
            IssueLevel::Error => 15.0,
            IssueLevel::Warning => 8.0,
            IssueLevel::Info => 3.0,
        };
    }

    let length = char_count(text);
    if length > 500 {
        score = f64::min(100.0, score + 5.0);
    } else if length > 200 {
        score = f64::min(100.0, score + 3.0);
    }

    let missing_elements = issues
        .iter()
        .any(|issue| issue.kind == IssueKind::MissingElement);
    if length < MIN_DOCUMENT_CHARS && missing_elements {
        score = f64::min(score, SHORT_INCOMPLETE_CAP);
    }

    score.clamp(0.0, 100.0)
}
