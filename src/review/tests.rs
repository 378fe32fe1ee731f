use std::collections::HashMap;

use super::*;
use crate::model::{Comparator, Measure};

fn reviewer() -> Reviewer {
    Reviewer::bundled().expect("bundled reviewer")
}

fn issues_of(report: &ReviewReport, kind: IssueKind) -> Vec<&Issue> {
    report
        .issues
        .iter()
        .filter(|issue| issue.kind == kind)
        .collect()
}

#[test]
fn reviewer_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Reviewer>();
}

#[test]
fn bundled_reviewer_uses_builtin_lexicon() {
    assert_eq!(reviewer().lexicon_version(), Some("builtin-2026.1"));
}

#[test]
fn every_absent_p0_field_is_reported_once() {
    let reviewer = reviewer();
    let report = reviewer.review("", Some("server"), None);

    assert_eq!(report.mode, ReviewMode::Category);
    assert_eq!(report.category.as_deref(), Some("server"));

    let mut per_field: HashMap<&str, usize> = HashMap::new();
    for issue in issues_of(&report, IssueKind::MissingField) {
        assert_eq!(issue.level, IssueLevel::Error);
        let field_id = issue.field_id.as_deref().expect("field id");
        *per_field.entry(field_id).or_insert(0) += 1;
    }

    let required: Vec<String> = reviewer
        .category_fields("server", None)
        .into_iter()
        .filter(|field| field.required)
        .map(|field| field.field_id)
        .collect();
    assert_eq!(per_field.len(), required.len());
    assert!(per_field.values().all(|count| *count == 1));
    assert!(required.iter().all(|id| per_field.contains_key(id.as_str())));
    assert_eq!(report.missing_p0_count, required.len());
    assert_eq!(report.completeness_score, 0.0);
}

#[test]
fn missing_field_suggestion_names_first_three_labels() {
    let report = reviewer().review("", Some("server"), None);

    assert_eq!(
        report.suggestions,
        vec!["add the missing required fields: 采购数量, 用途说明, CPU核心数".to_string()]
    );

    let purpose = report
        .issues
        .iter()
        .find(|issue| issue.field_id.as_deref() == Some("purpose"))
        .expect("purpose issue");
    assert_eq!(purpose.message, "missing field: 用途说明");
    assert_eq!(purpose.suggestion, "请说明具体业务场景与负载特征");
}

#[test]
fn category_fields_agree_with_review_filter() {
    let reviewer = reviewer();

    for subtype in [None, Some("general_server"), Some("gpu_ai_server"), Some("storage_server")] {
        let report = reviewer.review("", Some("server"), subtype);
        let mut missing: Vec<&str> = issues_of(&report, IssueKind::MissingField)
            .into_iter()
            .filter_map(|issue| issue.field_id.as_deref())
            .collect();
        missing.sort_unstable();

        let summaries = reviewer.category_fields("server", subtype);
        let mut required: Vec<&str> = summaries
            .iter()
            .filter(|field| field.required)
            .map(|field| field.field_id.as_str())
            .collect();
        required.sort_unstable();

        assert_eq!(missing, required, "subtype {subtype:?}");
    }
}

#[test]
fn gpu_subtype_requires_gpu_memory() {
    let reviewer = reviewer();

    let gpu = reviewer.review("", Some("server"), Some("gpu_ai_server"));
    assert!(gpu
        .issues
        .iter()
        .any(|issue| issue.field_id.as_deref() == Some("gpu_memory")));
    assert_eq!(gpu.subtype.as_deref(), Some("gpu_ai_server"));

    let general = reviewer.review("", Some("server"), Some("general_server"));
    assert!(!general
        .issues
        .iter()
        .any(|issue| issue.field_id.as_deref() == Some("gpu_memory")));
}

#[test]
fn unknown_category_falls_back_to_generic_review() {
    let reviewer = reviewer();
    let text = "采购一批电脑设备，尽快交付。";

    let fallback = reviewer.review(text, Some("printer"), None);
    assert_eq!(fallback.mode, ReviewMode::Generic);
    assert!(fallback.category.is_none());
    assert_eq!(fallback, reviewer.review(text, None, None));
}

#[test]
fn short_generic_document_scores_below_sixty() {
    let report = reviewer().review("采购一批电脑设备，尽快交付。", None, None);

    assert_eq!(report.mode, ReviewMode::Generic);
    let missing = issues_of(&report, IssueKind::MissingElement);
    assert_eq!(missing.len(), 1);
    for element in ["purpose", "functional scope", "key performance indicators"] {
        assert!(missing[0].message.contains(element), "{element}");
    }

    assert!(issues_of(&report, IssueKind::Completeness)
        .iter()
        .any(|issue| issue.level == IssueLevel::Error));
    assert!(report.completeness_score < 60.0);
    assert_eq!(report.completeness_score, 59.0);
}

#[test]
fn short_incomplete_document_stays_below_sixty_with_numbers() {
    let reviewer = reviewer();

    for text in ["规格：1U，2个，3台", "Specification: 2 units, 4 ports, 8 cores"] {
        let report = reviewer.review(text, None, None);

        assert!(issues_of(&report, IssueKind::Verifiability).is_empty(), "{text}");
        assert_eq!(issues_of(&report, IssueKind::MissingElement).len(), 1, "{text}");
        assert!(report.completeness_score < 60.0, "{text}: {}", report.completeness_score);
    }
}

#[test]
fn generic_document_with_required_elements_and_numbers() {
    let text = "本次采购服务器用于数据分析平台，功能包括离线计算与报表，性能指标：内存 256GB，主频 2.6GHz，数量 4 台，技术要求见附件参数表。";
    let report = reviewer().review(text, None, None);

    assert!(issues_of(&report, IssueKind::MissingElement).is_empty());
    assert!(issues_of(&report, IssueKind::Verifiability).is_empty());
    assert!(report.risk_summary.total == 0);
    assert!(report.completeness_score > 80.0);
}

#[test]
fn suggestions_follow_issue_family_order_without_duplicates() {
    let report = reviewer().review("采购戴尔服务器，大约10台。", None, None);

    assert_eq!(
        report.suggestions,
        vec![
            "add the missing required elements".to_string(),
            SUGGEST_VAGUE.to_string(),
            SUGGEST_VERIFIABILITY.to_string(),
            SUGGEST_RISK.to_string(),
        ]
    );
}

#[test]
fn clean_issue_list_gets_the_default_suggestion() {
    assert_eq!(
        synthesize_suggestions(&[], &[]),
        vec![SUGGEST_ADEQUATE.to_string()]
    );
}

#[test]
fn slogan_purpose_is_flagged_once() {
    let report = reviewer().review("采购数量：2台。用途：满足需求", Some("server"), None);

    let slogans = issues_of(&report, IssueKind::SloganContent);
    assert_eq!(slogans.len(), 1);
    assert_eq!(slogans[0].field_id.as_deref(), Some("purpose"));
    assert_eq!(slogans[0].matched.as_deref(), Some("满足需求"));
    assert_eq!(slogans[0].level, IssueLevel::Warning);
}

#[test]
fn rejected_wording_in_purpose_is_flagged() {
    let report = reviewer().review("用途：科研计算，达到国际领先水平", Some("server"), None);

    let invalid = issues_of(&report, IssueKind::InvalidContent);
    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0].matched.as_deref(), Some("国际领先"));
    assert!(invalid[0].message.contains("用途说明"));
}

#[test]
fn value_below_minimum_is_flagged() {
    let report = reviewer().review("内存：8GB", Some("server"), None);

    let memory = report
        .extracted_fields
        .get("memory_capacity")
        .expect("memory extracted");
    assert_eq!(
        memory.value,
        FieldValue::Measure(Measure {
            comparator: Comparator::Eq,
            magnitude: 8.0,
            unit: Some("GB".to_string()),
        })
    );

    let invalid = issues_of(&report, IssueKind::InvalidValue);
    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0].field_id.as_deref(), Some("memory_capacity"));
}

#[test]
fn category_risks_become_issues_by_priority() {
    let report = reviewer().review("采购戴尔服务器，内存大约 64GB", Some("server"), None);

    let risks = issues_of(&report, IssueKind::Risk);
    assert_eq!(risks.len(), report.risk_summary.total);
    assert!(report.risk_summary.has_blocking_risks);
    assert!(risks
        .iter()
        .any(|issue| issue.level == IssueLevel::Error && issue.matched.as_deref() == Some("戴尔")));
    assert!(risks
        .iter()
        .any(|issue| issue.level == IssueLevel::Warning && issue.matched.as_deref() == Some("大约")));
}

#[test]
fn category_report_carries_ruleset_stamp() {
    let report = reviewer().review("", Some("server"), None);
    let stamp = report.ruleset.expect("ruleset stamp");

    assert_eq!(stamp.version.as_deref(), Some("2026.1-server"));
    assert_eq!(stamp.checksum.map(|checksum| checksum.len()), Some(64));
}

#[test]
fn scores_stay_in_range() {
    let reviewer = reviewer();
    let long = "高性能 大约 必须 绝对 戴尔 惠普 RTX4090 ".repeat(40);
    let inputs = ["", "采购", long.as_str(), "内存 64GB，主频 2.5GHz，数量 2 台"];

    for text in inputs {
        for category in [None, Some("server"), Some("laptop"), Some("unknown")] {
            let score = reviewer.review(text, category, None).completeness_score;
            assert!((0.0..=100.0).contains(&score), "{category:?}: {score}");
        }
    }
}

#[test]
fn category_score_weights_p0_coverage() {
    let none = SeverityCounts::default();
    assert_eq!(category_score(0, 0, &none), 100.0);
    assert_eq!(category_score(0, 4, &none), 50.0);

    let counts = SeverityCounts {
        total: 3,
        error: 1,
        warning: 1,
        info: 1,
    };
    assert_eq!(category_score(1, 2, &counts), 58.0);
}

#[test]
fn compliance_check_uses_category_rules() {
    let reviewer = reviewer();
    let text = "需提供原厂授权，采购戴尔服务器";

    let server = reviewer.check_compliance(text, Some("server"));
    assert!(!server.is_compliant);
    assert!(server
        .warning_risks
        .iter()
        .any(|risk| risk.rule_id == "risk.certification_lock"));

    let generic = reviewer.check_compliance(text, None);
    assert!(!generic
        .warning_risks
        .iter()
        .any(|risk| risk.rule_id == "risk.certification_lock"));
}

#[test]
fn categories_are_listed_with_subtypes() {
    let categories = reviewer().available_categories();
    let server = categories
        .iter()
        .find(|category| category.id == "server")
        .expect("server category");

    assert!(server
        .subtypes
        .iter()
        .any(|subtype| subtype.id == "gpu_ai_server"));
}
