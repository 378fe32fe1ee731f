use crate::model::{Priority, RiskRule, TriggerPatterns};

/// (canonical unit, aliases). Aliases are matched ASCII-case-insensitively.
pub const BUILTIN_UNIT_ALIASES: &[(&str, &[&str])] = &[
    ("GHz", &["GHz", "吉赫兹"]),
    ("MHz", &["MHz", "兆赫兹"]),
    ("GB", &["GB", "G", "GiB", "吉字节"]),
    ("TB", &["TB", "T", "TiB", "太字节"]),
    ("GbE", &["GbE", "千兆以太"]),
    ("W", &["W", "瓦", "瓦特"]),
    ("Wh", &["Wh", "瓦时"]),
    ("U", &["U", "U高"]),
    ("cores", &["cores", "core", "核", "核心"]),
    ("mm", &["mm", "毫米"]),
    ("inch", &["inch", "inches", "英寸", "寸"]),
    ("kg", &["kg", "千克", "公斤"]),
    ("h", &["h", "hr", "hours", "hour", "小时"]),
];

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// Used for unknown categories, category files without `risk_rules`, and
/// generic reviews.
pub fn default_risk_rules() -> Vec<RiskRule> {
    vec![
        RiskRule {
            rule_id: "risk.explicit_brand".to_string(),
            priority: Priority::P0,
            description: "explicit brand name points procurement at a vendor".to_string(),
            trigger: TriggerPatterns {
                keywords: strings(&["戴尔", "惠普", "联想", "华为", "浪潮"]),
                phrases: Vec::new(),
                regex: strings(&[r"(?i)\b(dell|hp|hpe|lenovo|huawei|inspur|ibm|cisco)\b"]),
            },
            message: Some(
                "brand names are high-risk wording; describe performance and capability instead"
                    .to_string(),
            ),
            remediation: None,
        },
        RiskRule {
            rule_id: "risk.explicit_model".to_string(),
            priority: Priority::P0,
            description: "explicit model designation points procurement at a product".to_string(),
            trigger: TriggerPatterns {
                keywords: Vec::new(),
                phrases: Vec::new(),
                regex: strings(&[
                    r"(?i)\b(geforce|quadro|rtx|tesla|radeon|instinct|xeon|epyc|threadripper)\b",
                    r"(?i)\b(poweredge|proliant|thinksystem|altros|fusionserver)\b",
                    r"(?i)\b(a\d{2,4}|h\d{2,4}|v\d{2,4}|mi\d{2,4})\b",
                ]),
            },
            message: Some(
                "model designations are high-risk wording; describe performance and capability instead"
                    .to_string(),
            ),
            remediation: None,
        },
        RiskRule {
            rule_id: "risk.benchmark_model_reference".to_string(),
            priority: Priority::P1,
            description: "\"performance not lower than <model>\" style wording".to_string(),
            trigger: TriggerPatterns {
                keywords: Vec::new(),
                phrases: strings(&["性能不低于", "不弱于", "不差于", "与XX同等"]),
                regex: Vec::new(),
            },
            message: Some(
                "replace benchmark-style model references with parameterised requirements"
                    .to_string(),
            ),
            remediation: None,
        },
        RiskRule {
            rule_id: "risk.vague_expression".to_string(),
            priority: Priority::P1,
            description: "vague wording".to_string(),
            trigger: TriggerPatterns {
                keywords: strings(&[
                    "大约",
                    "大概",
                    "左右",
                    "尽可能",
                    "尽量",
                    "高性能",
                    "高性能计算机",
                    "先进水平",
                    "国际领先",
                    "国内领先",
                    "性能优异",
                    "高端",
                ]),
                phrases: Vec::new(),
                regex: Vec::new(),
            },
            message: Some("replace vague wording with concrete, measurable statements".to_string()),
            remediation: None,
        },
    ]
}

/// Remediation text for rules that do not carry their own.
pub fn suggestion_for_rule(rule_id: &str) -> &'static str {
    match rule_id {
        "risk.explicit_model_or_brand" | "risk.explicit_brand" | "risk.explicit_model" => {
            "use performance parameters (core count, frequency, capacity) instead of brand or model names"
        }
        "risk.benchmark_model_reference" | "risk.benchmark_reference" => {
            "state concrete parameters (memory, compute, bandwidth) instead of a benchmark model"
        }
        "risk.vague_expression" => "use concrete numbers and measurable indicators instead of vague wording",
        "risk.brand_directivity" => "remove the brand name and describe generic performance instead",
        "risk.model_designation" => "remove the model designation and describe performance parameters instead",
        _ => "revise the wording to lower procurement risk",
    }
}
