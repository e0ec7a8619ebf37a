//! Partial feature bundles and their set operations.
//!
//! A [`Bundle`] is a partial assignment of polarities to features; absence
//! of a feature means "unspecified". Bundles are the semantic domain of the
//! Out DSL: `unify` and `subtract` are defined here and the DSL evaluator
//! drives them.
//!
//! Entries are kept sorted by feature id, so the binary operations are
//! linear merges. Bundles are small (bounded by |V|), so a `SmallVec` keeps
//! the common case off the heap.

use smallvec::SmallVec;

use crate::features::{FeatureId, Polarity, Ternary};

/// A fixed-length vector of ternary values aligned with a feature order.
///
/// Inlined up to 8 coordinates; realistic `V` sets are smaller.
pub type TernaryTuple = SmallVec<[Ternary; 8]>;

/// A partial mapping from feature to polarity, sorted by feature id.
///
/// The empty bundle is the full-underspecification identity: `unify` with it
/// is a no-op on either side and `subtract`ing it removes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bundle {
    entries: SmallVec<[(FeatureId, Polarity); 8]>,
}

impl Bundle {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a singleton bundle `{feature ↦ polarity}`.
    pub fn singleton(feature: FeatureId, polarity: Polarity) -> Self {
        let mut entries = SmallVec::new();
        entries.push((feature, polarity));
        Self { entries }
    }

    /// Build a bundle from entries in arbitrary order.
    ///
    /// Later duplicates of a feature are dropped; bundles are consistent by
    /// construction.
    pub fn from_entries(entries: impl IntoIterator<Item = (FeatureId, Polarity)>) -> Self {
        let mut bundle = Self::new();
        for (feature, polarity) in entries {
            bundle.set_if_absent(feature, polarity);
        }
        bundle
    }

    /// The polarity assigned to `feature`, if any.
    pub fn get(&self, feature: FeatureId) -> Option<Polarity> {
        self.entries
            .binary_search_by_key(&feature, |&(id, _)| id)
            .ok()
            .map(|idx| self.entries[idx].1)
    }

    /// Whether `feature` is specified.
    pub fn contains(&self, feature: FeatureId) -> bool {
        self.get(feature).is_some()
    }

    /// Insert `feature ↦ polarity` unless `feature` is already specified.
    pub fn set_if_absent(&mut self, feature: FeatureId, polarity: Polarity) {
        match self.entries.binary_search_by_key(&feature, |&(id, _)| id) {
            Ok(_) => {}
            Err(idx) => self.entries.insert(idx, (feature, polarity)),
        }
    }

    /// Number of specified features.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no feature is specified.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(feature, polarity)` pairs in feature-id order.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, Polarity)> + '_ {
        self.entries.iter().copied()
    }

    /// Left-biased union: every entry of `self`, plus entries of `other`
    /// whose features `self` leaves unspecified. Never overwrites, so the
    /// operation is not symmetric.
    pub fn unify(&self, other: &Bundle) -> Bundle {
        let mut entries = SmallVec::with_capacity(self.entries.len() + other.entries.len());
        let mut left = self.entries.iter().copied().peekable();
        let mut right = other.entries.iter().copied().peekable();
        loop {
            match (left.peek().copied(), right.peek().copied()) {
                (Some((lf, _)), Some((rf, _))) => {
                    if lf < rf {
                        entries.push(left.next().unwrap());
                    } else if rf < lf {
                        entries.push(right.next().unwrap());
                    } else {
                        // Same feature: the left value wins, even on conflict.
                        entries.push(left.next().unwrap());
                        right.next();
                    }
                }
                (Some(_), None) => entries.push(left.next().unwrap()),
                (None, Some(_)) => entries.push(right.next().unwrap()),
                (None, None) => break,
            }
        }
        Bundle { entries }
    }

    /// Remove entries of `self` that appear in `other` with the same
    /// polarity. A feature specified in `other` with the opposite polarity
    /// is kept.
    pub fn subtract(&self, other: &Bundle) -> Bundle {
        let entries = self
            .entries
            .iter()
            .copied()
            .filter(|&(feature, polarity)| other.get(feature) != Some(polarity))
            .collect();
        Bundle { entries }
    }

    /// Restrict to the given features. Features absent from `self` stay
    /// absent; the order and multiplicity of `keep` are irrelevant.
    pub fn project(&self, keep: &[FeatureId]) -> Bundle {
        let entries = self
            .entries
            .iter()
            .copied()
            .filter(|&(feature, _)| keep.contains(&feature))
            .collect();
        Bundle { entries }
    }

    /// Build a bundle from a ternary tuple aligned with `order`.
    ///
    /// `Unspec` coordinates stay absent from the bundle.
    pub fn from_tuple(tuple: &[Ternary], order: &[FeatureId]) -> Bundle {
        debug_assert_eq!(tuple.len(), order.len());
        Bundle::from_entries(
            order
                .iter()
                .zip(tuple)
                .filter_map(|(&feature, &value)| value.polarity().map(|p| (feature, p))),
        )
    }

    /// Project this bundle onto `order` as a ternary tuple.
    ///
    /// Features outside `order` are dropped; features inside `order` but
    /// absent from the bundle come out as `Unspec`.
    pub fn to_tuple(&self, order: &[FeatureId]) -> TernaryTuple {
        order.iter().map(|&feature| self.get(feature).into()).collect()
    }
}

impl FromIterator<(FeatureId, Polarity)> for Bundle {
    fn from_iter<T: IntoIterator<Item = (FeatureId, Polarity)>>(iter: T) -> Self {
        Bundle::from_entries(iter)
    }
}
