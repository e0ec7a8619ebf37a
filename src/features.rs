//! The feature universe and its ternary value domain.
//!
//! Every compilation unit fixes one [`FeatureUniverse`]: the ordered list of
//! feature names taken from the alphabet's feature table. The table order is
//! the canonical order for everything downstream — witness tuples, label
//! encoding, state numbering, and symbol-table layout all derive from it.

use rustc_hash::FxHashMap;

/// Index of a feature into its [`FeatureUniverse`].
///
/// Feature ids are assigned in table order, so sorting a set of ids recovers
/// the canonical feature order.
pub type FeatureId = usize;

/// A two-valued feature polarity, as written in rules and literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Polarity {
    /// The `+` polarity.
    #[serde(rename = "+")]
    Plus,
    /// The `-` polarity.
    #[serde(rename = "-")]
    Minus,
}

impl Polarity {
    /// Parse a polarity from its surface form.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "+" => Some(Polarity::Plus),
            "-" => Some(Polarity::Minus),
            _ => None,
        }
    }
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarity::Plus => write!(f, "+"),
            Polarity::Minus => write!(f, "-"),
        }
    }
}

/// A ternary feature value: unspecified, plus, or minus.
///
/// The discriminants are load-bearing: label encoding treats a witness tuple
/// as a base-3 number over these digits (see [`crate::transducer::encoding`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Ternary {
    /// The feature carries no value.
    Unspec = 0,
    /// The feature is `+`.
    Plus = 1,
    /// The feature is `-`.
    Minus = 2,
}

impl Ternary {
    /// All values in digit order. Iteration order matters for enumeration.
    pub const VALUES: [Ternary; 3] = [Ternary::Unspec, Ternary::Plus, Ternary::Minus];

    /// Convert a base-3 digit into a ternary value.
    ///
    /// # Panics
    ///
    /// Panics if `digit > 2`; callers decode digits with `% 3` so this is
    /// unreachable from label arithmetic.
    #[inline]
    pub fn from_digit(digit: u64) -> Self {
        match digit {
            0 => Ternary::Unspec,
            1 => Ternary::Plus,
            2 => Ternary::Minus,
            _ => unreachable!("base-3 digit out of range: {digit}"),
        }
    }

    /// The base-3 digit of this value.
    #[inline]
    pub fn digit(self) -> u64 {
        self as u64
    }

    /// Parse a table cell (`+`, `-`, `0`).
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "+" => Some(Ternary::Plus),
            "-" => Some(Ternary::Minus),
            "0" => Some(Ternary::Unspec),
            _ => None,
        }
    }

    /// The polarity carried by this value, if any.
    #[inline]
    pub fn polarity(self) -> Option<Polarity> {
        match self {
            Ternary::Unspec => None,
            Ternary::Plus => Some(Polarity::Plus),
            Ternary::Minus => Some(Polarity::Minus),
        }
    }

    /// The suffix character used in symbol-table names.
    #[inline]
    pub fn suffix(self) -> char {
        match self {
            Ternary::Unspec => '0',
            Ternary::Plus => '+',
            Ternary::Minus => '-',
        }
    }
}

impl From<Polarity> for Ternary {
    #[inline]
    fn from(polarity: Polarity) -> Self {
        match polarity {
            Polarity::Plus => Ternary::Plus,
            Polarity::Minus => Ternary::Minus,
        }
    }
}

impl From<Option<Polarity>> for Ternary {
    #[inline]
    fn from(polarity: Option<Polarity>) -> Self {
        match polarity {
            None => Ternary::Unspec,
            Some(p) => p.into(),
        }
    }
}

/// The ordered set of feature names for one compilation unit.
///
/// Immutable after construction and freely shareable; both the reference
/// evaluator and the transducer builder borrow it.
#[derive(Debug, Clone)]
pub struct FeatureUniverse {
    names: Vec<String>,
    index: FxHashMap<String, FeatureId>,
}

impl FeatureUniverse {
    /// Build a universe from feature names in table order.
    ///
    /// Duplicate names are rejected by alphabet validation before this is
    /// called; a duplicate here keeps the first id.
    pub fn new(names: Vec<String>) -> Self {
        let mut index = FxHashMap::default();
        for (id, name) in names.iter().enumerate() {
            index.entry(name.clone()).or_insert(id);
        }
        Self { names, index }
    }

    /// Look up a feature id by name.
    pub fn id(&self, name: &str) -> Option<FeatureId> {
        self.index.get(name).copied()
    }

    /// The name of a feature id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this universe.
    pub fn name(&self, id: FeatureId) -> &str {
        &self.names[id]
    }

    /// Number of features in the universe.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the universe is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate feature names in table order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// All feature ids in table order.
    pub fn all_ids(&self) -> Vec<FeatureId> {
        (0..self.names.len()).collect()
    }
}
