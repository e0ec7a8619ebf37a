//! Surface alphabets: symbols annotated with full feature bundles.
//!
//! An [`Alphabet`] is an ordered mapping from symbol name to a full bundle
//! over the feature universe. It is created once per compilation unit
//! (usually from a CSV/TSV feature table, see [`table`]) and immutable
//! thereafter, so the evaluator and the transducer builder can share it
//! freely.

pub mod table;

use rustc_hash::FxHashMap;

use crate::bundle::{Bundle, TernaryTuple};
use crate::features::{FeatureId, FeatureUniverse, Ternary};
use crate::validate::SchemaError;

/// An ordered set of surface symbols with their feature bundles.
#[derive(Debug, Clone)]
pub struct Alphabet {
    universe: FeatureUniverse,
    symbols: Vec<String>,
    /// Full ternary tuple over the universe, one per symbol.
    tuples: Vec<Box<[Ternary]>>,
    /// Partial-bundle view of each symbol, aligned with `tuples`.
    bundles: Vec<Bundle>,
    symbol_index: FxHashMap<String, usize>,
    /// Full tuple → (first symbol index, number of symbols sharing it).
    bundle_index: FxHashMap<Box<[Ternary]>, (usize, usize)>,
}

impl Alphabet {
    /// Build an alphabet from a feature matrix.
    ///
    /// `values` is row-per-feature: `values[f][s]` is the value of feature
    /// `f` on symbol `s`, mirroring the feature-table layout. Symbol and
    /// feature names must be non-empty and unique, and every row must have
    /// one cell per symbol.
    pub fn from_matrix(
        symbols: Vec<String>,
        features: Vec<String>,
        values: Vec<Vec<Ternary>>,
    ) -> Result<Self, SchemaError> {
        let mut issues = Vec::new();

        if symbols.is_empty() {
            issues.push("alphabet must contain at least one symbol".to_string());
        }
        if features.is_empty() {
            issues.push("alphabet must contain at least one feature".to_string());
        }
        for name in symbols.iter().filter(|name| name.trim().is_empty()) {
            issues.push(format!("symbol name cannot be blank: {name:?}"));
        }
        for name in features.iter().filter(|name| name.trim().is_empty()) {
            issues.push(format!("feature name cannot be blank: {name:?}"));
        }
        if let Some(dupes) = find_dupes(&symbols) {
            issues.push(format!("duplicate symbols: {}", dupes.join(", ")));
        }
        if let Some(dupes) = find_dupes(&features) {
            issues.push(format!("duplicate features: {}", dupes.join(", ")));
        }
        if values.len() != features.len() {
            issues.push(format!(
                "feature/value row count mismatch: {} rows for {} features",
                values.len(),
                features.len()
            ));
        }
        for (row, feature) in values.iter().zip(&features) {
            if row.len() != symbols.len() {
                issues.push(format!(
                    "row for feature {feature:?} has {} values; expected {}",
                    row.len(),
                    symbols.len()
                ));
            }
        }
        if let Some(error) = SchemaError::from_issues(issues) {
            return Err(error);
        }

        let universe = FeatureUniverse::new(features);
        let mut tuples = Vec::with_capacity(symbols.len());
        let mut bundles = Vec::with_capacity(symbols.len());
        for sym_idx in 0..symbols.len() {
            let tuple: Box<[Ternary]> = values.iter().map(|row| row[sym_idx]).collect();
            let bundle = Bundle::from_entries(
                tuple
                    .iter()
                    .enumerate()
                    .filter_map(|(id, value)| value.polarity().map(|p| (id, p))),
            );
            tuples.push(tuple);
            bundles.push(bundle);
        }

        let symbol_index = symbols
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();

        let mut bundle_index: FxHashMap<Box<[Ternary]>, (usize, usize)> = FxHashMap::default();
        for (idx, tuple) in tuples.iter().enumerate() {
            bundle_index
                .entry(tuple.clone())
                .and_modify(|(_, count)| *count += 1)
                .or_insert((idx, 1));
        }

        Ok(Self {
            universe,
            symbols,
            tuples,
            bundles,
            symbol_index,
            bundle_index,
        })
    }

    /// The feature universe derived from this alphabet's table.
    pub fn universe(&self) -> &FeatureUniverse {
        &self.universe
    }

    /// Symbol names in alphabet order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the alphabet has no symbols. Construction rejects an empty
    /// symbol list, so this is always false for a built alphabet.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Look up a symbol's index by name.
    pub fn symbol_id(&self, name: &str) -> Option<usize> {
        self.symbol_index.get(name).copied()
    }

    /// The name of symbol `id`.
    pub fn symbol_name(&self, id: usize) -> &str {
        &self.symbols[id]
    }

    /// The full bundle of symbol `id`.
    pub fn bundle(&self, id: usize) -> &Bundle {
        &self.bundles[id]
    }

    /// The full ternary tuple of symbol `id`, aligned with the universe.
    pub fn full_tuple(&self, id: usize) -> &[Ternary] {
        &self.tuples[id]
    }

    /// Project symbol `id` onto a feature order as a witness tuple.
    pub fn project(&self, id: usize, order: &[FeatureId]) -> TernaryTuple {
        let tuple = &self.tuples[id];
        order.iter().map(|&feature| tuple[feature]).collect()
    }

    /// Resolve a full tuple to a symbol by exact match.
    ///
    /// Returns the first matching symbol (alphabet order) and the number of
    /// symbols sharing the bundle; strict callers treat counts above one as
    /// ambiguous.
    pub fn resolve_exact(&self, tuple: &[Ternary]) -> Option<(usize, usize)> {
        self.bundle_index.get(tuple).copied()
    }

    /// The first symbol (alphabet order) consistent with a witness tuple:
    /// every specified coordinate of `tuple` must match the symbol's value
    /// for that feature, while `Unspec` coordinates constrain nothing.
    pub fn resolve_consistent(&self, tuple: &[Ternary], order: &[FeatureId]) -> Option<usize> {
        self.tuples.iter().position(|full| {
            order
                .iter()
                .zip(tuple)
                .all(|(&feature, &value)| value == Ternary::Unspec || full[feature] == value)
        })
    }
}

fn find_dupes(items: &[String]) -> Option<Vec<String>> {
    let mut seen = std::collections::BTreeSet::new();
    let mut dupes = Vec::new();
    for item in items {
        if !seen.insert(item.as_str()) && !dupes.contains(item) {
            dupes.push(item.clone());
        }
    }
    if dupes.is_empty() {
        None
    } else {
        Some(dupes)
    }
}
