use std::collections::HashMap;

use serde::Deserialize;

use super::symbol::{Sequence, Symbol, SymbolEncoding};
use crate::error::ConfigError;

/// A rule as written in a configuration table, before tokenizing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RuleRecord {
    pub predecessor: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
    pub replacement: String,
    #[serde(default = "default_weight")]
    pub weight: f32,
}

fn default_weight() -> f32 {
    1.0
}

impl RuleRecord {
    pub fn new(predecessor: &str, replacement: &str) -> Self {
        Self {
            predecessor: predecessor.to_string(),
            prefix: String::new(),
            suffix: String::new(),
            replacement: replacement.to_string(),
            weight: default_weight(),
        }
    }

    /// Rule that only applies when `prefix` precedes and `suffix` follows the
    /// predecessor. Either context may be empty.
    pub fn with_context(prefix: &str, predecessor: &str, suffix: &str, replacement: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            ..Self::new(predecessor, replacement)
        }
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }
}

/// A validated production with tokenized, repeat-expanded strings.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub predecessor: Symbol,
    pub prefix: Sequence,
    pub suffix: Sequence,
    pub replacement: Sequence,
    pub weight: f32,
}

impl Rule {
    pub fn from_record(record: &RuleRecord, encoding: SymbolEncoding) -> Result<Self, ConfigError> {
        let parsed = encoding.parse(&record.predecessor)?;
        let predecessor = match &parsed[..] {
            [symbol] => *symbol,
            _ => {
                return Err(ConfigError::InvalidPredecessor {
                    text: record.predecessor.clone(),
                })
            }
        };

        if !record.weight.is_finite() || record.weight <= 0.0 {
            return Err(ConfigError::InvalidWeight {
                predecessor: record.predecessor.clone(),
                weight: record.weight,
            });
        }

        Ok(Self {
            predecessor,
            prefix: parse_context(&record.prefix, encoding)?,
            suffix: parse_context(&record.suffix, encoding)?,
            replacement: encoding.parse(&record.replacement)?,
            weight: record.weight,
        })
    }

    /// Rules with more context are tried first.
    pub fn priority(&self) -> usize {
        self.prefix.len() + self.suffix.len()
    }

    /// Same predecessor and contexts: alternative outcomes of one production.
    pub fn same_kind(&self, other: &Rule) -> bool {
        self.predecessor == other.predecessor && self.prefix == other.prefix && self.suffix == other.suffix
    }
}

fn parse_context(text: &str, encoding: SymbolEncoding) -> Result<Sequence, ConfigError> {
    let pattern = encoding.parse(text)?;
    if pattern.iter().any(Symbol::is_bracket) {
        return Err(ConfigError::BracketInContext {
            text: text.to_string(),
        });
    }
    Ok(pattern)
}

/// Rules grouped by predecessor, each group ordered by descending priority
/// with declaration order kept among equal priorities.
#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    by_predecessor: HashMap<Symbol, Vec<usize>>,
}

impl RuleIndex {
    pub fn build(rules: &[Rule]) -> Self {
        let mut by_predecessor: HashMap<Symbol, Vec<usize>> = HashMap::new();
        for (i, rule) in rules.iter().enumerate() {
            by_predecessor.entry(rule.predecessor).or_default().push(i);
        }
        for candidates in by_predecessor.values_mut() {
            candidates.sort_by_key(|&i| std::cmp::Reverse(rules[i].priority()));
        }
        Self { by_predecessor }
    }

    /// Indices into the rule table, highest priority first. Empty when no
    /// rule rewrites `symbol`.
    pub fn candidates(&self, symbol: Symbol) -> &[usize] {
        self.by_predecessor
            .get(&symbol)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
