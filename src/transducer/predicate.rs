//! Compiled natural-class predicates.
//!
//! A natural class lowers to a list of `(coordinate, required value)`
//! checks over `V_order` tuples, so membership is a short conjunction with
//! no lookups and no allocation. An empty class compiles to the
//! constant-true predicate.

use smallvec::SmallVec;

use crate::features::{FeatureId, FeatureUniverse, Ternary};
use crate::rules::FeatureLiteral;

/// A total membership test on witness tuples.
#[derive(Debug, Clone)]
pub struct ClassPredicate {
    checks: SmallVec<[(usize, Ternary); 4]>,
}

impl ClassPredicate {
    /// Lower a class to coordinate checks over `v_order`.
    ///
    /// Returns `None` if a class feature is missing from the universe or
    /// from `v_order`; dependency analysis puts every class feature into
    /// `V`, so a miss is a caller bug, not a user error.
    pub fn compile(
        class: &[FeatureLiteral],
        v_order: &[FeatureId],
        universe: &FeatureUniverse,
    ) -> Option<Self> {
        let mut checks = SmallVec::new();
        for literal in class {
            let id = universe.id(literal.feature())?;
            let position = v_order.binary_search(&id).ok()?;
            checks.push((position, literal.polarity().into()));
        }
        Some(Self { checks })
    }

    /// Whether the tuple satisfies every literal of the class.
    #[inline]
    pub fn matches(&self, tuple: &[Ternary]) -> bool {
        self.checks
            .iter()
            .all(|&(position, value)| tuple[position] == value)
    }
}
