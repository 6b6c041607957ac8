//! Detection rules and ordered rule-set evaluation.

use crate::error::{WafError, WafResult};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Action taken when a rule's pattern matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    /// Deny the request and place the client on the block list.
    Block,

    /// Record the detection and keep evaluating; the request is not
    /// denied on this rule's account.
    Log,
}

impl RuleAction {
    /// Check if this action denies the request.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Block)
    }
}

/// A single detection rule: a compiled case-insensitive pattern plus the
/// action to take when it matches.
///
/// Rules are immutable once constructed. The pattern is compiled up
/// front; an uncompilable pattern is a construction error, never a
/// runtime one.
#[derive(Debug, Clone)]
pub struct Rule {
    id: String,
    pattern: Regex,
    action: RuleAction,
    description: String,
}

impl Rule {
    /// Compile a new rule. The pattern is matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`WafError::InvalidPattern`] if the pattern does not
    /// compile.
    pub fn new(
        id: impl Into<String>,
        pattern: &str,
        action: RuleAction,
        description: impl Into<String>,
    ) -> WafResult<Self> {
        let id = id.into();
        let compiled = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| WafError::InvalidPattern(format!("rule {id}: {e}")))?;

        Ok(Self {
            id,
            pattern: compiled,
            action,
            description: description.into(),
        })
    }

    /// Rule identifier, also used as the deny reason code.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Action taken on a match.
    #[must_use]
    pub fn action(&self) -> RuleAction {
        self.action
    }

    /// Human-readable description for audit output.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Check whether the pattern occurs anywhere in the signature.
    ///
    /// Pure: no side effects, same result for the same input.
    #[must_use]
    pub fn matches(&self, signature: &str) -> bool {
        self.pattern.is_match(signature)
    }
}

/// Outcome of evaluating a rule set against one signature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Id of the first blocking rule that matched, if any.
    pub blocked_by: Option<String>,

    /// Ids of log-action rules that matched before the decision.
    pub log_matches: Vec<String>,
}

impl Evaluation {
    /// Check if a blocking rule matched.
    #[must_use]
    pub fn triggered(&self) -> bool {
        self.blocked_by.is_some()
    }
}

/// An ordered set of rules. Insertion order is evaluation order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Create an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Build a rule set from an ordered list of rules.
    #[must_use]
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Append a rule. Later rules are evaluated after earlier ones.
    pub fn push(&mut self, rule: Rule) {
        info!(rule = %rule.id, description = %rule.description, "rule added");
        self.rules.push(rule);
    }

    /// Number of rules in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the set holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Evaluate a signature against the rules in insertion order.
    ///
    /// The first matching Block rule wins and evaluation stops there;
    /// matching Log rules are recorded and evaluation continues. The
    /// result is deterministic for a fixed set and signature.
    #[must_use]
    pub fn evaluate(&self, signature: &str) -> Evaluation {
        let mut evaluation = Evaluation::default();

        for rule in &self.rules {
            if !rule.matches(signature) {
                continue;
            }

            match rule.action {
                RuleAction::Block => {
                    evaluation.blocked_by = Some(rule.id.clone());
                    return evaluation;
                },
                RuleAction::Log => {
                    warn!(rule = %rule.id, description = %rule.description, "rule matched (log only)");
                    evaluation.log_matches.push(rule.id.clone());
                },
            }
        }

        evaluation
    }
}

/// Build the baseline rule set.
///
/// These five rules form the default policy and are always evaluated in
/// this order. The patterns are deliberately broad; hosts that need a
/// narrower policy can start from an empty set instead.
///
/// # Errors
///
/// Returns [`WafError::InvalidPattern`] if a pattern fails to compile.
pub fn default_rules() -> WafResult<Vec<Rule>> {
    Ok(vec![
        Rule::new(
            "SQL_INJECTION",
            r#"(\bunion\b.*\bselect\b|\bselect\b.*\bfrom\b.*\bwhere\b|\b(?:or|and)\s+['"]?\d+['"]?\s*=\s*['"]?\d+['"]?)"#,
            RuleAction::Block,
            "SQL Injection Detection",
        )?,
        Rule::new(
            "XSS",
            r"(<script|javascript:|onerror=|onload=)",
            RuleAction::Block,
            "Cross-Site Scripting Detection",
        )?,
        Rule::new(
            "PATH_TRAVERSAL",
            r"(\.\./|\.\.\\)",
            RuleAction::Block,
            "Path Traversal Detection",
        )?,
        Rule::new(
            "COMMAND_INJECTION",
            r"(;|\||&|`|\$\()",
            RuleAction::Block,
            "Command Injection Detection",
        )?,
        Rule::new(
            "LDAP_INJECTION",
            r"(\*\)|\(\|)",
            RuleAction::Block,
            "LDAP Injection Detection",
        )?,
    ])
}
