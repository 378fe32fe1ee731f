use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::model::{FieldDefinition, RiskRule};

pub const INDEX_FILE_NAME: &str = "category_rules.json";
pub const CATEGORY_DIR_NAME: &str = "categories";
pub const LEXICON_FILE_NAME: &str = "risk_lexicon.json";

/// Source of the raw rule documents. Parsing and caching stay in the
/// rule engine; a provider only hands out text.
pub trait SchemaProvider: Send + Sync {
    fn describe(&self) -> String;

    fn read_index(&self) -> Result<String>;

    fn read_rule_file(&self, rule_file: &str) -> Result<String>;

    /// `Ok(None)` when the provider carries no lexicon override.
    fn read_lexicon(&self) -> Result<Option<String>>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryIndex {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryEntry {
    #[serde(default, alias = "name_cn")]
    pub name: Option<String>,
    #[serde(default, alias = "description_cn")]
    pub description: Option<String>,
    #[serde(default)]
    pub rule_file: Option<String>,
    #[serde(default)]
    pub subtypes: BTreeMap<String, SubtypeEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubtypeEntry {
    #[serde(default, alias = "name_cn")]
    pub name: Option<String>,
    #[serde(default, alias = "description_cn")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryRuleFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub unit_normalization: BTreeMap<String, UnitAliasEntry>,
    #[serde(default)]
    pub fields: Vec<FieldGroup>,
    #[serde(default)]
    pub risk_rules: Option<Vec<RiskRule>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldGroup {
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default, alias = "group_label_cn")]
    pub group_label: Option<String>,
    #[serde(default)]
    pub items: Vec<FieldDefinition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnitAliasEntry {
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub normalize_to: Option<String>,
}

const BUNDLED_INDEX: &str = include_str!("../../rules/category_rules.json");
const BUNDLED_RULE_FILES: &[(&str, &str)] = &[
    (
        "server.json",
        include_str!("../../rules/categories/server.json"),
    ),
    (
        "workstation.json",
        include_str!("../../rules/categories/workstation.json"),
    ),
    (
        "laptop.json",
        include_str!("../../rules/categories/laptop.json"),
    ),
];

/// Rule documents compiled into the binary from the repository's `rules/`
/// directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledProvider;

impl SchemaProvider for BundledProvider {
    fn describe(&self) -> String {
        "bundled".to_string()
    }

    fn read_index(&self) -> Result<String> {
        Ok(BUNDLED_INDEX.to_string())
    }

    fn read_rule_file(&self, rule_file: &str) -> Result<String> {
        match BUNDLED_RULE_FILES
            .iter()
            .find(|(name, _)| *name == rule_file)
        {
            Some((_, raw)) => Ok((*raw).to_string()),
            None => bail!("bundled rules do not include {rule_file}"),
        }
    }

    fn read_lexicon(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Reads `category_rules.json`, `categories/<rule_file>` and an optional
/// `risk_lexicon.json` under `root`.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    root: PathBuf,
}

impl DirectoryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
    }
}

impl SchemaProvider for DirectoryProvider {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn read_index(&self) -> Result<String> {
        self.read(&self.root.join(INDEX_FILE_NAME))
    }

    fn read_rule_file(&self, rule_file: &str) -> Result<String> {
        let relative = Path::new(rule_file);
        if relative.is_absolute()
            || relative
                .components()
                .any(|component| matches!(component, std::path::Component::ParentDir))
        {
            bail!("rule file must stay inside the rules directory: {rule_file}");
        }

        self.read(&self.root.join(CATEGORY_DIR_NAME).join(relative))
    }

    fn read_lexicon(&self) -> Result<Option<String>> {
        let path = self.root.join(LEXICON_FILE_NAME);
        if !path.exists() {
            return Ok(None);
        }

        self.read(&path).map(Some)
    }
}
