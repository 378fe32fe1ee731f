use serde::{Deserialize, Serialize};

/// Curated word lists and pattern families behind the built-in detection
/// passes. A rules directory may replace it with its own
/// `risk_lexicon.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskLexicon {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub brands_localized: Vec<String>,
    #[serde(default)]
    pub brands_romanized: Vec<String>,
    #[serde(default)]
    pub model_patterns: Vec<String>,
    #[serde(default)]
    pub vague: VagueTiers,
    #[serde(default)]
    pub benchmark_patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VagueTiers {
    #[serde(default, rename = "P0", alias = "p0")]
    pub p0: Vec<String>,
    #[serde(default, rename = "P1", alias = "p1")]
    pub p1: Vec<String>,
    #[serde(default, rename = "P2", alias = "p2")]
    pub p2: Vec<String>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

impl RiskLexicon {
    pub fn builtin() -> Self {
        Self {
            version: Some("builtin-2026.1".to_string()),
            brands_localized: strings(&[
                "戴尔", "惠普", "联想", "华为", "浪潮", "曙光", "思科", "英伟达", "英特尔", "超微",
                "技嘉", "华硕",
            ]),
            brands_romanized: strings(&[
                "Dell",
                "HP",
                "HPE",
                "Lenovo",
                "Huawei",
                "Inspur",
                "Sugon",
                "IBM",
                "Cisco",
                "NVIDIA",
                "AMD",
                "Intel",
                "Supermicro",
                "Gigabyte",
                "ASUS",
            ]),
            // Matches are additionally required to sit on ASCII word
            // boundaries, so these carry no `\b` of their own.
            model_patterns: strings(&[
                r"(?i)(?:geforce|quadro|rtx|gtx|tesla|titan|radeon|instinct|arc)\s*\d*",
                r"(?i)(?:rt\s*40|rt\s*30|gtx\s*16|rx\s*\d+|mi\s*\d+)",
                r"(?i)(?:xeon|epyc|threadripper|core\s*i\d|ryzen)\s*\d+",
                r"(?i)i\d-\d{4,5}[a-z]*",
                r"(?i)(?:poweredge|proliant|thinksystem|altros|fusionserver|gen10|gen9)",
                r"(?i)(?:r\d{3,4}|dl\d{3,4}|ml\d{3,4}|sr\d{3,4})",
                r"(?i)(?:a\d{2,4}|h\d{2,4}|v\d{2,4}|mi\d{2,4}|nx\d{3,4})",
            ]),
            vague: VagueTiers {
                p0: strings(&[
                    "指定品牌",
                    "指定型号",
                    "仅限",
                    "必须使用",
                    "只能采购",
                    "brand-specified",
                    "model-specified",
                    "limited to",
                    "must use",
                    "only purchase",
                ]),
                p1: strings(&[
                    "大约",
                    "大概",
                    "左右",
                    "尽可能",
                    "尽量",
                    "高性能计算机",
                    "高端服务器",
                    "先进水平",
                    "国际领先",
                    "国内领先",
                    "性能优异",
                    "行业标杆",
                    "approximately",
                    "as far as possible",
                    "industry-leading",
                    "state-of-the-art",
                    "world-class",
                ]),
                p2: strings(&[
                    "高性能",
                    "高配置",
                    "主流配置",
                    "通用型",
                    "标准型",
                    "high performance",
                    "high-end",
                    "mainstream configuration",
                ]),
            },
            benchmark_patterns: strings(&[
                r"性能不低于\s*[a-zA-Z0-9\-]+",
                r"不弱于\s*[a-zA-Z0-9\-]+",
                r"不差于\s*[a-zA-Z0-9\-]+",
                r"与\s*[a-zA-Z0-9\-]+\s*同等",
                r"相当于\s*[a-zA-Z0-9\-]+",
                r"对标\s*[a-zA-Z0-9\-]+",
                r"(?i)performance\s+not\s+(?:lower|worse)\s+than\s+[a-zA-Z0-9\-]+",
                r"(?i)no\s+(?:worse|weaker)\s+than\s+[a-zA-Z0-9\-]+",
                r"(?i)benchmarked\s+against\s+[a-zA-Z0-9\-]+",
                r"(?i)comparable\s+to\s+[a-zA-Z0-9\-]+",
            ]),
        }
    }
}
