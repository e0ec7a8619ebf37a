//! The Search & Change rule model.
//!
//! A rule names three natural classes — the search initiator (`inr`), the
//! search terminator (`trm`), and an extra condition on the terminator
//! (`cnd`) — plus a direction and an Out expression computing the rewritten
//! bundle. Documents group rules under a shared id; within one document
//! rule ids are unique.
//!
//! These types mirror the wire shape of rules documents (JSON or TOML), so
//! they derive serde and defer semantic checks to [`crate::validate`].

use serde::{Deserialize, Serialize};

use crate::features::Polarity;

/// Scan direction of the search.
///
/// The compiled machine is canonical LEFT; RIGHT rules are evaluated by
/// reversing input and output around the machine.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
pub enum Direction {
    /// Scan left-to-right; memory carries the most recent terminator.
    #[serde(rename = "LEFT")]
    #[value(alias = "LEFT")]
    Left,
    /// Scan right-to-left.
    #[serde(rename = "RIGHT")]
    #[value(alias = "RIGHT")]
    Right,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Left => write!(f, "LEFT"),
            Direction::Right => write!(f, "RIGHT"),
        }
    }
}

/// One valued feature inside a natural class, e.g. `["+", "Voice"]`.
///
/// Serialized as a two-element array, matching the document format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureLiteral(Polarity, String);

impl FeatureLiteral {
    /// Create a literal from a polarity and feature name.
    pub fn new(polarity: Polarity, feature: impl Into<String>) -> Self {
        Self(polarity, feature.into())
    }

    /// The literal's polarity.
    pub fn polarity(&self) -> Polarity {
        self.0
    }

    /// The literal's feature name.
    pub fn feature(&self) -> &str {
        &self.1
    }
}

/// A natural class: a conjunction of feature literals.
///
/// An empty class matches every symbol.
pub type NaturalClass = Vec<FeatureLiteral>;

/// A validated Search & Change rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Rule identifier, unique within its document.
    pub id: String,
    /// Scan direction.
    pub dir: Direction,
    /// Search-initiator class: symbols whose features get rewritten.
    #[serde(default)]
    pub inr: NaturalClass,
    /// Terminator class: symbols that start (or restart) a live search.
    #[serde(default)]
    pub trm: NaturalClass,
    /// Extra condition a terminator must meet to arm the search.
    #[serde(default)]
    pub cnd: NaturalClass,
    /// The Out expression source text.
    pub out: String,
}

/// A rules document: an id plus rules in application order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesDocument {
    /// Document identifier.
    pub id: String,
    /// Rules in pipeline order.
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl RulesDocument {
    /// Find a rule by id.
    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }
}
