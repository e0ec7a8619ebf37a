//! The compiled rule transducer `T_V`.
//!
//! One Search & Change rule compiles to a total deterministic transducer
//! over the witness alphabet Σ_V. The state space is one "no live search"
//! state `qF` plus one true-state per Σ_P tuple; every state is final, so
//! the relation is length-preserving. Construction is direct and canonical:
//! state numbering and arc order are functions of `V_order` and `P_order`
//! alone, and two runs produce byte-identical AT&T output.

pub mod att;
pub mod builder;
pub mod encoding;
pub mod predicate;

pub use builder::{TransducerBuilder, DEFAULT_MAX_ARCS};
pub use encoding::{Label, StateId, EPSILON};
pub use predicate::ClassPredicate;

use thiserror::Error;

use crate::dsl::DslError;
use crate::features::FeatureId;
use crate::validate::SchemaError;

/// One transition of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arc {
    /// Source state.
    pub src: StateId,
    /// Destination state.
    pub dst: StateId,
    /// Input label.
    pub ilabel: Label,
    /// Output label.
    pub olabel: Label,
}

/// A compiled rule transducer.
///
/// Arcs are stored state-major, in ascending input-label order within each
/// state, so a transition lookup is index arithmetic rather than a map.
#[derive(Debug, Clone)]
pub struct RuleTransducer {
    rule_id: String,
    v_order: Vec<FeatureId>,
    p_order: Vec<FeatureId>,
    num_states: u64,
    sigma_size: u64,
    arcs: Vec<Arc>,
}

impl RuleTransducer {
    pub(crate) fn new(
        rule_id: String,
        v_order: Vec<FeatureId>,
        p_order: Vec<FeatureId>,
        num_states: u64,
        sigma_size: u64,
        arcs: Vec<Arc>,
    ) -> Self {
        Self {
            rule_id,
            v_order,
            p_order,
            num_states,
            sigma_size,
            arcs,
        }
    }

    /// The id of the rule this machine was compiled from.
    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    /// The start state, `qF`.
    pub fn start(&self) -> StateId {
        0
    }

    /// Number of states. Every state is final.
    pub fn num_states(&self) -> u64 {
        self.num_states
    }

    /// `|Σ_V| = 3^|V|`, the number of distinct input labels.
    pub fn sigma_size(&self) -> u64 {
        self.sigma_size
    }

    /// `V` in feature-universe order.
    pub fn v_order(&self) -> &[FeatureId] {
        &self.v_order
    }

    /// `P` as a subsequence of `V_order`.
    pub fn p_order(&self) -> &[FeatureId] {
        &self.p_order
    }

    /// All arcs, state-major, ascending input label within a state.
    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    /// The unique transition from `state` on `ilabel`.
    ///
    /// Returns `None` for epsilon, an out-of-range label, or an unknown
    /// state — the machine itself is total over Σ_V.
    pub fn transition(&self, state: StateId, ilabel: Label) -> Option<(StateId, Label)> {
        if ilabel == EPSILON || ilabel > self.sigma_size || state >= self.num_states {
            return None;
        }
        let index = state * self.sigma_size + (ilabel - 1);
        let arc = &self.arcs[index as usize];
        debug_assert_eq!(arc.src, state);
        debug_assert_eq!(arc.ilabel, ilabel);
        Some((arc.dst, arc.olabel))
    }

    /// Run the machine over a label sequence from the start state.
    pub fn run(&self, input: &[Label]) -> Option<Vec<Label>> {
        let mut state = self.start();
        let mut output = Vec::with_capacity(input.len());
        for &ilabel in input {
            let (next, olabel) = self.transition(state, ilabel)?;
            output.push(olabel);
            state = next;
        }
        Some(output)
    }
}

/// A rule failed to compile to a transducer.
#[derive(Debug, Clone, Error)]
pub enum CompileError {
    /// The projected arc count exceeds the configured budget. Checked
    /// before any arc is emitted.
    #[error(
        "estimated arcs exceed the budget: {projected} > {max_arcs} (|V|={v_size}, |P|={p_size})"
    )]
    ArcBudgetExceeded {
        /// `(1 + 3^|P|) · 3^|V|`.
        projected: u128,
        /// The configured budget.
        max_arcs: u64,
        /// `|V|`.
        v_size: usize,
        /// `|P|`.
        p_size: usize,
    },
    /// The rule's Out expression failed to parse or evaluate.
    #[error(transparent)]
    Dsl(#[from] DslError),
    /// The rule refers to features outside the universe.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// A post-construction check failed; always a bug in the builder.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}
