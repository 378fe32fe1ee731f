use super::*;
use crate::model::{Comparator, Measure, SemanticHint};

fn extractor() -> FieldExtractor {
    FieldExtractor::new().expect("built-in patterns compile")
}

fn field(id: &str, field_type: FieldType, hint: SemanticHint, keywords: &[&str]) -> FieldDefinition {
    let mut definition = FieldDefinition::new(id, field_type);
    definition.hint = hint;
    definition.keywords_cn = keywords.iter().map(|k| k.to_string()).collect();
    definition
}

fn extract(text: &str, definition: &FieldDefinition) -> ExtractionResult {
    extractor().extract_field(text, definition, &UnitTable::builtin())
}

#[test]
fn locate_span_uses_first_keyword_in_list_order() {
    let text = "服务器采购数量：10台，数量以合同为准";
    let span = locate_span(text, ["采购数量", "数量"], DEFAULT_WINDOW).expect("span");

    assert_eq!(span.start, 0);
    assert_eq!(span.end, char_count(text));
    assert!(span.tail.starts_with("采购数量"));
    assert_eq!(span.text, text);
}

#[test]
fn locate_span_keeps_a_backward_margin() {
    let text = format!("{}内存64GB", "x".repeat(30));
    let span = locate_span(&text, ["内存"], 5).expect("span");

    assert_eq!(span.start, 10);
    assert_eq!(span.end, 30 + 2 + 4);
    assert_eq!(span.text, format!("{}内存64GB", "x".repeat(20)));
    assert_eq!(span.tail, "内存64GB");
}

#[test]
fn locate_span_matches_ascii_keywords_case_insensitively() {
    let span = locate_span("Total MEMORY: 32 GB", ["memory"], DEFAULT_WINDOW).expect("span");
    assert_eq!(span.tail, "MEMORY: 32 GB");
    assert!(locate_span("no keyword here", ["内存", "ram"], DEFAULT_WINDOW).is_none());
}

#[test]
fn memory_comparator_is_parsed_with_unit() {
    let mut definition = field(
        "memory_capacity",
        FieldType::IntegerWithComparator,
        SemanticHint::MemoryCapacity,
        &[],
    );
    definition.keywords_en = vec!["memory".to_string()];

    let result = extract("memory ≥ 64GB", &definition);

    assert!(result.found);
    assert_eq!(
        result.value,
        Some(FieldValue::Measure(Measure {
            comparator: Comparator::Gte,
            magnitude: 64.0,
            unit: Some("GB".to_string()),
        }))
    );
    assert_eq!(result.confidence, 0.8);
}

#[test]
fn trailing_qualifier_sets_comparator() {
    let mut definition = field(
        "memory_capacity",
        FieldType::IntegerWithComparator,
        SemanticHint::MemoryCapacity,
        &["内存"],
    );
    definition.unit = Some("GB".to_string());

    let result = extract("内存64GB及以上", &definition);
    let Some(FieldValue::Measure(measure)) = &result.value else {
        panic!("expected a measure, got {:?}", result.value);
    };
    assert_eq!(measure.comparator, Comparator::Gte);
    assert_eq!(measure.magnitude, 64.0);
    assert_eq!(measure.unit.as_deref(), Some("GB"));
}

#[test]
fn comparator_prefers_candidate_with_declared_unit() {
    let mut definition = field(
        "memory_capacity",
        FieldType::IntegerWithComparator,
        SemanticHint::MemoryCapacity,
        &["内存"],
    );
    definition.unit = Some("GB".to_string());

    let result = extract("内存：DDR5 4800MHz，容量不少于128GB", &definition);
    let Some(FieldValue::Measure(measure)) = &result.value else {
        panic!("expected a measure, got {:?}", result.value);
    };
    assert_eq!(measure.magnitude, 128.0);
    assert_eq!(measure.comparator, Comparator::Gte);
}

#[test]
fn comparator_falls_back_to_hint_unit() {
    let definition = field(
        "cpu_cores",
        FieldType::IntegerWithComparator,
        SemanticHint::CoreCount,
        &["核心数"],
    );

    let result = extract("核心数至少 32", &definition);
    assert_eq!(
        result.value,
        Some(FieldValue::Measure(Measure {
            comparator: Comparator::Gte,
            magnitude: 32.0,
            unit: Some("cores".to_string()),
        }))
    );
}

#[test]
fn float_comparator_parses_decimal_frequency() {
    let mut definition = field(
        "cpu_frequency",
        FieldType::FloatWithComparator,
        SemanticHint::Frequency,
        &["主频"],
    );
    definition.unit = Some("GHz".to_string());

    let result = extract("处理器主频≥2.5GHz", &definition);
    assert_eq!(
        result.value,
        Some(FieldValue::Measure(Measure {
            comparator: Comparator::Gte,
            magnitude: 2.5,
            unit: Some("GHz".to_string()),
        }))
    );
}

#[test]
fn integer_core_count_uses_hint_family() {
    let definition = field("cpu_cores", FieldType::Integer, SemanticHint::CoreCount, &["核心数"]);
    let result = extract("数量2台；处理器核心数不少于16核", &definition);

    assert_eq!(result.value, Some(FieldValue::Integer(16)));
    assert_eq!(result.confidence, 0.8);
}

#[test]
fn integer_searches_after_keyword_before_margin() {
    let definition = field(
        "memory_capacity",
        FieldType::Integer,
        SemanticHint::MemoryCapacity,
        &["内存"],
    );

    let after = extract("硬盘 512GB，内存 32GB", &definition);
    assert_eq!(after.value, Some(FieldValue::Integer(32)));

    let before = extract("每台配置64GB内存", &definition);
    assert_eq!(before.value, Some(FieldValue::Integer(64)));
}

#[test]
fn integer_without_hint_ends_in_bare_number() {
    let definition = field("rack_units", FieldType::Integer, SemanticHint::None, &["机柜空间"]);
    let result = extract("机柜空间预留 42", &definition);
    assert_eq!(result.value, Some(FieldValue::Integer(42)));
}

#[test]
fn float_uses_hint_family() {
    let definition = field("weight", FieldType::Float, SemanticHint::Weight, &["重量"]);
    let result = extract("整机重量约1.35kg，电池 60Wh", &definition);
    assert_eq!(result.value, Some(FieldValue::Float(1.35)));
}

#[test]
fn storage_spec_reads_media_and_capacity() {
    let definition = field(
        "system_disk",
        FieldType::StorageSpec,
        SemanticHint::StorageCapacity,
        &["系统盘"],
    );

    let result = extract("系统盘：≥480GB SSD，RAID1", &definition);
    let Some(FieldValue::Storage(spec)) = &result.value else {
        panic!("expected storage, got {:?}", result.value);
    };
    assert_eq!(spec.media.as_deref(), Some("SSD"));
    assert_eq!(spec.comparator, Some(Comparator::Gte));
    assert_eq!(spec.magnitude, Some(480.0));
    assert_eq!(spec.unit.as_deref(), Some("GB"));
    assert_eq!(result.confidence, 0.85);

    let nvme = extract("系统盘 2T NVMe", &definition);
    let Some(FieldValue::Storage(spec)) = &nvme.value else {
        panic!("expected storage, got {:?}", nvme.value);
    };
    assert_eq!(spec.media.as_deref(), Some("NVMe"));
    assert_eq!(spec.unit.as_deref(), Some("TB"));
    assert_eq!(spec.comparator, Some(Comparator::Eq));
}

#[test]
fn storage_spec_with_media_only_is_still_found() {
    let definition = field("system_disk", FieldType::StorageSpec, SemanticHint::None, &["系统盘"]);
    let result = extract("系统盘采用固态硬盘", &definition);

    assert!(result.found);
    assert_eq!(result.confidence, 0.7);
}

#[test]
fn enum_matches_case_insensitively() {
    let mut definition = field("form_factor", FieldType::Enum, SemanticHint::None, &["机箱"]);
    definition.enums = vec!["1U".to_string(), "2U".to_string(), "4U".to_string()];

    let result = extract("机箱形态：2u机架式", &definition);
    assert_eq!(result.value, Some(FieldValue::Text("2U".to_string())));
    assert_eq!(result.confidence, 0.9);
}

#[test]
fn enum_or_text_falls_back_to_tokens() {
    let mut definition = field("os", FieldType::EnumOrText, SemanticHint::None, &["操作系统"]);
    definition.enums = vec!["Linux".to_string()];

    let result = extract("操作系统：预装 kylin V10 桌面版 授权 一年", &definition);
    assert_eq!(
        result.value,
        Some(FieldValue::Text("操作系统 预装 kylin V10 桌面版".to_string()))
    );
}

#[test]
fn enum_or_text_checks_margin_for_enum_values() {
    let mut definition = field("cpu_architecture", FieldType::EnumOrText, SemanticHint::None, &["架构"]);
    definition.enums = vec!["x86".to_string(), "ARM".to_string()];

    let after = extract("处理器架构：ARM 64位", &definition);
    assert_eq!(after.value, Some(FieldValue::Text("ARM".to_string())));

    let before = extract("采用 x86 架构服务器", &definition);
    assert_eq!(before.value, Some(FieldValue::Text("x86".to_string())));
}

#[test]
fn text_like_values_ignore_text_before_the_keyword() {
    let purpose = field("purpose", FieldType::Text, SemanticHint::None, &["用途"]);
    let result = extract("内存 64GB，硬盘 1TB。用途：科研计算", &purpose);
    assert_eq!(result.value, Some(FieldValue::Text("用途：科研计算".to_string())));

    let ports = field("network_ports", FieldType::ListOrText, SemanticHint::None, &["网络接口"]);
    let result = extract("电源冗余，风扇冗余；网络接口：双万兆光口", &ports);
    assert_eq!(result.value, Some(FieldValue::Text("网络接口：双万兆光口".to_string())));
}

#[test]
fn list_or_text_splits_on_separators() {
    let definition = field("network_ports", FieldType::ListOrText, SemanticHint::None, &["网络接口"]);

    let result = extract("网络接口：4个千兆电口，2个万兆光口", &definition);
    assert_eq!(
        result.value,
        Some(FieldValue::List(vec![
            "网络接口：4个千兆电口".to_string(),
            "2个万兆光口".to_string(),
        ]))
    );

    let single = extract("网络接口：双万兆光口", &definition);
    assert_eq!(single.value, Some(FieldValue::Text("网络接口：双万兆光口".to_string())));
}

#[test]
fn text_stops_at_second_section_marker() {
    let definition = field("purpose", FieldType::Text, SemanticHint::None, &["用途"]);

    let result = extract("用途：1. 虚拟化平台\n2. 数据库服务\n3. 备份", &definition);
    assert_eq!(result.value, Some(FieldValue::Text("用途：1. 虚拟化平台".to_string())));
    assert_eq!(result.confidence, 0.5);
}

#[test]
fn text_ignores_decimal_numbers_as_markers() {
    let definition = field("purpose", FieldType::Text, SemanticHint::None, &["用途"]);

    let result = extract("用途：承载 2.5 万并发用户的门户与 3.0 版接口服务", &definition);
    let Some(FieldValue::Text(text)) = result.value else {
        panic!("expected text");
    };
    assert!(text.ends_with("接口服务"));
    assert_eq!(result.confidence, 0.7);
}

#[test]
fn missing_keyword_is_not_found() {
    let definition = field("warranty", FieldType::Text, SemanticHint::None, &["质保"]);
    let result = extract("采购服务器两台", &definition);

    assert!(!result.found);
    assert_eq!(result.value, None);
    assert_eq!(result.confidence, 0.0);
    assert_eq!(result.position, None);
}

#[test]
fn span_text_and_position_are_reported() {
    let definition = field("quantity", FieldType::Integer, SemanticHint::Quantity, &["数量"]);
    let result = extract("采购数量：10台", &definition);

    assert_eq!(result.value, Some(FieldValue::Integer(10)));
    assert_eq!(result.span_text.as_deref(), Some("采购数量：10台"));
    assert_eq!(result.position, Some(SpanPosition { start: 0, end: 8 }));
}

#[test]
fn extract_all_fields_is_keyed_by_field_id() {
    let fields = vec![
        field("quantity", FieldType::Integer, SemanticHint::Quantity, &["数量"]),
        field("warranty", FieldType::Text, SemanticHint::None, &["质保"]),
    ];

    let results = extractor().extract_all_fields("采购数量：3台", &fields, &UnitTable::builtin());
    assert_eq!(results.len(), 2);
    assert!(results["quantity"].found);
    assert!(!results["warranty"].found);
}

#[test]
fn confidence_follows_value_shape() {
    assert_eq!(confidence(None, FieldType::Text), 0.0);
    assert_eq!(confidence(Some(&FieldValue::Integer(0)), FieldType::Integer), 0.5);
    assert_eq!(confidence(Some(&FieldValue::Float(2.4)), FieldType::Float), 0.8);
    assert_eq!(
        confidence(Some(&FieldValue::Text(String::new())), FieldType::Text),
        0.0
    );
    assert_eq!(
        confidence(Some(&FieldValue::Text("短文本".to_string())), FieldType::Text),
        0.5
    );
}

#[test]
fn extract_numbers_reports_units_and_positions() {
    let mentions = extractor().extract_numbers("CPU 2.5GHz，内存64G，数量10台");

    assert_eq!(mentions.len(), 3);
    assert_eq!(mentions[0].value, 2.5);
    assert_eq!(mentions[0].unit.as_deref(), Some("GHz"));
    assert_eq!(mentions[0].position, 4);
    assert_eq!(mentions[1].unit.as_deref(), Some("GB"));
    assert_eq!(mentions[2].unit.as_deref(), Some("台"));
    assert!(mentions[2].context.contains("数量10台"));
}
