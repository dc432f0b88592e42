//! Error classification.
//!
//! A [`RuleTable`] maps the cause text of a log error to the [`ActionTree`]
//! of the first rule whose pattern occurs in it.

mod action;
mod hardcoded;
mod matcher;

pub use action::{
    ActionNode, ActionParseError, ActionTree, RawAction, RawBody, RawBranches, MAX_DEPTH,
};
pub use hardcoded::default_rules;
pub use matcher::Pattern;

use crate::config::{Config, RuleConfig};

/// A pattern and the actions to take when it matches.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub pattern: Pattern,
    pub action: ActionTree,
}

impl Rule {
    pub fn new(name: impl Into<String>, pattern: &str, action: ActionTree) -> Self {
        Self {
            name: name.into(),
            pattern: Pattern::compile(pattern),
            action,
        }
    }

    fn from_config(index: usize, config: &RuleConfig) -> Self {
        let name = config
            .name
            .clone()
            .unwrap_or_else(|| format!("rule-{}", index + 1));
        Self::new(name, &config.pattern, config.action.clone())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("rule '{name}' has a malformed pattern {pattern:?}: {source}")]
    MalformedPattern {
        name: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Ordered rules; immutable once built.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    /// Build a table, reporting malformed patterns. With `strict` the first
    /// malformed pattern is an error; otherwise the rule stays in the table
    /// and never matches.
    pub fn new(rules: Vec<Rule>, strict: bool) -> Result<Self, RuleError> {
        for rule in &rules {
            if let Some(error) = rule.pattern.error() {
                if strict {
                    return Err(RuleError::MalformedPattern {
                        name: rule.name.clone(),
                        pattern: rule.pattern.as_str().to_string(),
                        source: error.clone(),
                    });
                }
                tracing::warn!(
                    "Rule '{}' has a malformed pattern and will be skipped: {}",
                    rule.name,
                    error
                );
            }
        }

        Ok(Self { rules })
    }

    /// The built-in table.
    pub fn builtin() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// Rules from the config file, or the built-in table when it has none.
    pub fn from_config(config: &Config) -> Result<Self, RuleError> {
        if config.rules.is_empty() {
            tracing::debug!("Using built-in rule table");
            return Self::new(default_rules(), config.strict_patterns);
        }

        let rules = config
            .rules
            .iter()
            .enumerate()
            .map(|(i, rule)| Rule::from_config(i, rule))
            .collect();
        Self::new(rules, config.strict_patterns)
    }

    /// First rule whose pattern occurs in `cause`.
    pub fn matching_rule(&self, cause: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.pattern.matches(cause))
    }

    /// Actions for `cause`; `[Unmatched]` when no rule applies.
    pub fn classify(&self, cause: &str) -> ActionTree {
        match self.matching_rule(cause) {
            Some(rule) => rule.action.clone(),
            None => ActionTree::unmatched(),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}
