use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result, bail};
use dashmap::DashMap;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::model::{CategoryInfo, FieldDefinition, RiskRule, RulesetStamp, SubtypeInfo};
use crate::util::sha256_hex;

mod defaults;
mod provider;

pub use defaults::{default_risk_rules, suggestion_for_rule};
pub use provider::{
    BundledProvider, CATEGORY_DIR_NAME, CategoryEntry, CategoryIndex, CategoryRuleFile,
    DirectoryProvider, FieldGroup, INDEX_FILE_NAME, LEXICON_FILE_NAME, SchemaProvider,
    SubtypeEntry, UnitAliasEntry,
};

/// A configured risk rule with its regex family compiled once.
#[derive(Debug, Clone)]
pub struct CompiledRiskRule {
    pub rule: RiskRule,
    pub regexes: Vec<Regex>,
}

impl CompiledRiskRule {
    /// Invalid patterns are dropped one by one; the rest of the rule stays
    /// active.
    pub fn compile(rule: RiskRule) -> Self {
        let regexes = rule
            .trigger
            .regex
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(err) => {
                    warn!(rule_id = %rule.rule_id, pattern = %pattern, error = %err, "skipping invalid risk pattern");
                    None
                }
            })
            .collect();

        Self { rule, regexes }
    }
}

/// Canonical unit lookup built from the built-in aliases plus category
/// overrides. Longest alias wins.
#[derive(Debug, Clone)]
pub struct UnitTable {
    aliases: Vec<(String, String)>,
}

impl Default for UnitTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl UnitTable {
    pub fn builtin() -> Self {
        let aliases = defaults::BUILTIN_UNIT_ALIASES
            .iter()
            .flat_map(|(canonical, aliases)| {
                aliases
                    .iter()
                    .map(move |alias| (alias.to_string(), canonical.to_string()))
            })
            .collect();

        let mut table = Self { aliases };
        table.sort();
        table
    }

    pub fn with_overrides(mut self, overrides: &BTreeMap<String, UnitAliasEntry>) -> Self {
        for (key, entry) in overrides {
            let canonical = entry
                .normalize_to
                .clone()
                .unwrap_or_else(|| key.to_string());
            for alias in &entry.aliases {
                if alias.is_empty() {
                    continue;
                }
                self.aliases.retain(|(existing, _)| existing != alias);
                self.aliases.push((alias.clone(), canonical.clone()));
            }
        }

        self.sort();
        self
    }

    fn sort(&mut self) {
        self.aliases
            .sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
    }

    /// Canonical form of a complete unit token.
    pub fn normalize(&self, token: &str) -> Option<String> {
        let token = token.trim();
        self.aliases
            .iter()
            .find(|(alias, _)| alias_matches(alias, token))
            .map(|(_, canonical)| canonical.clone())
    }

    /// Longest alias at the start of `text`, with the byte length it
    /// consumed. An ASCII alias must not run into further ASCII letters.
    pub fn match_prefix(&self, text: &str) -> Option<(String, usize)> {
        for (alias, canonical) in &self.aliases {
            let Some(head) = text.get(..alias.len()) else {
                continue;
            };
            if !alias_matches(alias, head) {
                continue;
            }

            if alias.is_ascii() {
                let runs_on = text[alias.len()..]
                    .chars()
                    .next()
                    .map(|next| next.is_ascii_alphabetic())
                    .unwrap_or(false);
                if runs_on {
                    continue;
                }
            }

            return Some((canonical.clone(), alias.len()));
        }

        None
    }
}

fn alias_matches(alias: &str, token: &str) -> bool {
    if alias.is_ascii() {
        alias.eq_ignore_ascii_case(token)
    } else {
        alias == token
    }
}

/// Everything the reviewer needs for one category, shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct CategoryRuleSet {
    pub category_id: String,
    pub fields: Vec<FieldDefinition>,
    pub risk_rules: Arc<[CompiledRiskRule]>,
    pub units: UnitTable,
    pub stamp: Option<RulesetStamp>,
}

impl CategoryRuleSet {
    fn empty(category_id: &str, defaults: Arc<[CompiledRiskRule]>) -> Self {
        Self {
            category_id: category_id.to_string(),
            fields: Vec::new(),
            risk_rules: defaults,
            units: UnitTable::builtin(),
            stamp: None,
        }
    }

    pub fn fields_for(&self, subtype: Option<&str>) -> Vec<FieldDefinition> {
        self.fields
            .iter()
            .filter(|field| field.applies_to(subtype))
            .cloned()
            .collect()
    }
}

pub struct RuleEngine {
    provider: Arc<dyn SchemaProvider>,
    index: OnceLock<CategoryIndex>,
    cache: DashMap<String, Arc<CategoryRuleSet>>,
    default_rules: Arc<[CompiledRiskRule]>,
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field("provider", &self.provider.describe())
            .field("cached_categories", &self.cached_categories())
            .finish()
    }
}

impl RuleEngine {
    pub fn new(provider: Arc<dyn SchemaProvider>) -> Self {
        let default_rules: Arc<[CompiledRiskRule]> = default_risk_rules()
            .into_iter()
            .map(CompiledRiskRule::compile)
            .collect::<Vec<_>>()
            .into();

        Self {
            provider,
            index: OnceLock::new(),
            cache: DashMap::new(),
            default_rules,
        }
    }

    pub fn bundled() -> Self {
        Self::new(Arc::new(BundledProvider))
    }

    /// Cached rule set for `category_id`. Loading happens outside the map
    /// lock; when two threads race, the first inserted value is kept and
    /// both see it. Ids missing from the index get a fresh empty set and
    /// are never cached.
    pub fn rule_set(&self, category_id: &str) -> Arc<CategoryRuleSet> {
        if let Some(cached) = self.cache.get(category_id).map(|entry| Arc::clone(entry.value())) {
            return cached;
        }

        if !self.index().categories.contains_key(category_id) {
            debug!(category = %category_id, "category not configured");
            return Arc::new(CategoryRuleSet::empty(
                category_id,
                Arc::clone(&self.default_rules),
            ));
        }

        let loaded = match self.load(category_id) {
            Ok(rule_set) => {
                info!(
                    category = %category_id,
                    fields = rule_set.fields.len(),
                    risk_rules = rule_set.risk_rules.len(),
                    "loaded category rules"
                );
                rule_set
            }
            Err(err) => {
                let reason = format!("{err:#}");
                warn!(category = %category_id, error = %reason, "category rules unavailable");
                CategoryRuleSet::empty(category_id, Arc::clone(&self.default_rules))
            }
        };

        Arc::clone(
            self.cache
                .entry(category_id.to_string())
                .or_insert_with(|| Arc::new(loaded))
                .value(),
        )
    }

    pub fn cached_categories(&self) -> usize {
        self.cache.len()
    }

    pub fn get_fields(&self, category_id: &str, subtype: Option<&str>) -> Vec<FieldDefinition> {
        self.rule_set(category_id).fields_for(subtype)
    }

    pub fn get_risk_rules(&self, category_id: &str) -> Arc<[CompiledRiskRule]> {
        Arc::clone(&self.rule_set(category_id).risk_rules)
    }

    pub fn default_risk_rules(&self) -> Arc<[CompiledRiskRule]> {
        Arc::clone(&self.default_rules)
    }

    pub fn available_categories(&self) -> Vec<CategoryInfo> {
        self.index()
            .categories
            .iter()
            .map(|(id, entry)| category_info_from_entry(id, entry))
            .collect()
    }

    pub fn category_info(&self, category_id: &str) -> Option<CategoryInfo> {
        self.index()
            .categories
            .get(category_id)
            .map(|entry| category_info_from_entry(category_id, entry))
    }

    pub fn index_version(&self) -> Option<&str> {
        self.index().version.as_deref()
    }

    fn index(&self) -> &CategoryIndex {
        self.index.get_or_init(|| match self.load_index() {
            Ok(index) => {
                debug!(
                    source = %self.provider.describe(),
                    categories = index.categories.len(),
                    "loaded category index"
                );
                index
            }
            Err(err) => {
                let reason = format!("{err:#}");
                warn!(source = %self.provider.describe(), error = %reason, "category index unavailable");
                CategoryIndex::default()
            }
        })
    }

    fn load_index(&self) -> Result<CategoryIndex> {
        let raw = self.provider.read_index()?;
        serde_json::from_str(&raw).context("failed to parse category index")
    }

    fn load(&self, category_id: &str) -> Result<CategoryRuleSet> {
        let index = self.index();
        let Some(entry) = index.categories.get(category_id) else {
            bail!("category {category_id} is not configured");
        };
        let Some(rule_file) = entry.rule_file.as_deref() else {
            bail!("category {category_id} has no rule file");
        };

        let raw = self.provider.read_rule_file(rule_file)?;
        let document: CategoryRuleFile = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse rule file {rule_file}"))?;

        let fields = flatten_fields(category_id, document.fields);
        let risk_rules: Arc<[CompiledRiskRule]> = match document.risk_rules {
            Some(rules) if !rules.is_empty() => rules
                .into_iter()
                .map(CompiledRiskRule::compile)
                .collect::<Vec<_>>()
                .into(),
            _ => Arc::clone(&self.default_rules),
        };

        Ok(CategoryRuleSet {
            category_id: category_id.to_string(),
            fields,
            risk_rules,
            units: UnitTable::builtin().with_overrides(&document.unit_normalization),
            stamp: Some(RulesetStamp {
                version: document
                    .version
                    .or_else(|| index.version.clone()),
                checksum: Some(sha256_hex(raw.as_bytes())),
            }),
        })
    }
}

fn flatten_fields(category_id: &str, groups: Vec<FieldGroup>) -> Vec<FieldDefinition> {
    let mut seen = HashSet::new();
    let mut fields = Vec::new();

    for group in groups {
        for mut item in group.items {
            if item.field_id.trim().is_empty() {
                warn!(category = %category_id, "skipping field without field_id");
                continue;
            }
            if !seen.insert(item.field_id.clone()) {
                warn!(category = %category_id, field_id = %item.field_id, "skipping duplicate field_id");
                continue;
            }

            if item.label.trim().is_empty() {
                item.label = item.field_id.clone();
            }
            if item.group_id.is_none() {
                item.group_id = group.group_id.clone();
            }
            if item.group_label.is_none() {
                item.group_label = group.group_label.clone();
            }
            fields.push(item);
        }
    }

    fields
}

fn category_info_from_entry(id: &str, entry: &CategoryEntry) -> CategoryInfo {
    CategoryInfo {
        id: id.to_string(),
        name: entry.name.clone().unwrap_or_else(|| id.to_string()),
        description: entry.description.clone().unwrap_or_default(),
        subtypes: entry
            .subtypes
            .iter()
            .map(|(sub_id, sub)| SubtypeInfo {
                id: sub_id.clone(),
                name: sub.name.clone().unwrap_or_else(|| sub_id.clone()),
                description: sub.description.clone().unwrap_or_default(),
            })
            .collect(),
    }
}
