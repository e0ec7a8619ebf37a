//! Document validation.
//!
//! Validation is batched: every problem found in a rules document is
//! collected into one [`SchemaError`] so a caller sees all offending rules
//! at once instead of fixing them one at a time.

use thiserror::Error;

use crate::alphabet::Alphabet;
use crate::bundle::Bundle;
use crate::dsl::{self, OutExpr};
use crate::features::FeatureUniverse;
use crate::rules::{FeatureLiteral, Rule, RulesDocument};

/// A malformed rules, alphabet, or input document.
///
/// Carries every issue found in one validation pass.
#[derive(Debug, Clone, Error)]
#[error("{}", .issues.join("; "))]
pub struct SchemaError {
    /// The individual problems, in document order.
    pub issues: Vec<String>,
}

impl SchemaError {
    /// A schema error with a single issue.
    pub fn new(issue: impl Into<String>) -> Self {
        Self {
            issues: vec![issue.into()],
        }
    }

    /// Wrap collected issues; `None` when the list is empty.
    pub fn from_issues(issues: Vec<String>) -> Option<Self> {
        if issues.is_empty() {
            None
        } else {
            Some(Self { issues })
        }
    }
}

/// Validate a rules document against a feature universe.
///
/// Checks document and rule ids, rule-id uniqueness, natural-class feature
/// membership, and that every Out expression parses and evaluates against a
/// probe environment built from the rule's own `inr`/`trm` classes. All
/// problems are reported together.
pub fn validate_document(
    document: &RulesDocument,
    universe: &FeatureUniverse,
) -> Result<(), SchemaError> {
    let mut issues = Vec::new();

    if document.id.trim().is_empty() {
        issues.push("rules document id cannot be empty".to_string());
    }

    let mut seen = std::collections::BTreeSet::new();
    let mut dupes = Vec::new();
    for rule in &document.rules {
        if !seen.insert(rule.id.as_str()) && !dupes.contains(&rule.id.as_str()) {
            dupes.push(rule.id.as_str());
        }
    }
    if !dupes.is_empty() {
        issues.push(format!("duplicate rule ids: {}", dupes.join(", ")));
    }

    for rule in &document.rules {
        validate_rule(rule, universe, &mut issues);
    }

    match SchemaError::from_issues(issues) {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

fn validate_rule(rule: &Rule, universe: &FeatureUniverse, issues: &mut Vec<String>) {
    if rule.id.trim().is_empty() {
        issues.push("rule id cannot be empty".to_string());
    }
    if rule.out.trim().is_empty() {
        issues.push(format!("rule {} out expression cannot be empty", rule.id));
        return;
    }

    for (label, class) in [("inr", &rule.inr), ("trm", &rule.trm), ("cnd", &rule.cnd)] {
        for literal in class {
            let feature = literal.feature();
            if feature.trim().is_empty() {
                issues.push(format!("rule {} {label} has an empty feature name", rule.id));
            } else if universe.id(feature).is_none() {
                issues.push(format!(
                    "rule {} {label} has unknown feature: {feature:?}",
                    rule.id
                ));
            }
        }
    }

    let expr = match OutExpr::parse(&rule.out) {
        Ok(expr) => expr,
        Err(error) => {
            issues.push(format!("rule {} out is invalid: {error}", rule.id));
            return;
        }
    };

    // Probe evaluation with the rule's own classes bound as INR and TRM
    // surfaces unknown features and type errors before compilation.
    let inr = class_bundle(&rule.inr, universe);
    let trm = class_bundle(&rule.trm, universe);
    let context = dsl::OutContext {
        inr: &inr,
        trm: &trm,
        universe,
    };
    if let Err(error) = dsl::eval(&expr, &context) {
        issues.push(format!("rule {} out is invalid: {error}", rule.id));
    }
}

/// The bundle denoted by a natural class, for probe evaluation.
///
/// Unknown features are skipped here; class validation reports them.
fn class_bundle(class: &[FeatureLiteral], universe: &FeatureUniverse) -> Bundle {
    Bundle::from_entries(
        class
            .iter()
            .filter_map(|literal| universe.id(literal.feature()).map(|id| (id, literal.polarity()))),
    )
}

/// Validate an input word list against an alphabet.
///
/// Every word must be a sequence of known, non-empty symbol names.
pub fn validate_words(words: &[Vec<String>], alphabet: &Alphabet) -> Result<(), SchemaError> {
    let mut issues = Vec::new();
    for (index, word) in words.iter().enumerate() {
        for symbol in word {
            if symbol.trim().is_empty() {
                issues.push(format!("word {index} contains an empty symbol"));
            } else if alphabet.symbol_id(symbol).is_none() {
                issues.push(format!("word {index} has unknown symbol: {symbol:?}"));
            }
        }
    }
    match SchemaError::from_issues(issues) {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
