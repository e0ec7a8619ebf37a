//! # sncfst
//!
//! Compile Search & Change (S&C) phonological rewrite rules into explicit
//! finite-state transducers over a ternary-feature alphabet.
//!
//! An S&C rule names a search *initiator* class, a scan direction, and a
//! *terminator* class; the change rewrites the initiator's features as a
//! function of the most recent terminator. Each rule compiles to a total
//! deterministic transducer `T_V` over the witness alphabet Σ_V, where the
//! per-rule feature sets `V` (grammar-visible) and `P ⊆ V` (Out-visible)
//! keep the state and arc counts at `1 + 3^|P|` and `(1 + 3^|P|) · 3^|V|`.
//! A reference evaluator applies the same semantics directly to symbol
//! strings and can cross-check itself against the compiled machine.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sncfst::prelude::*;
//!
//! let alphabet = table::load_table(Path::new("alphabet.csv"), None)?;
//! let machine = TransducerBuilder::new(alphabet.universe()).build(&rule)?;
//!
//! let evaluator = Evaluator::new(&alphabet);
//! let outcome = evaluator.apply_rule(&rule, &words)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod alphabet;
pub mod analysis;
pub mod bundle;
pub mod cli;
pub mod dsl;
pub mod evaluator;
pub mod features;
pub mod rules;
pub mod transducer;
pub mod validate;

/// Common imports for convenient usage
pub mod prelude {
    pub use crate::alphabet::{table, Alphabet};
    pub use crate::analysis::RuleAnalysis;
    pub use crate::bundle::Bundle;
    pub use crate::dsl::{OutContext, OutExpr};
    pub use crate::evaluator::{EvalOptions, Evaluator, OutputDocument, Word};
    pub use crate::features::{FeatureUniverse, Polarity, Ternary};
    pub use crate::rules::{Direction, Rule, RulesDocument};
    pub use crate::transducer::{RuleTransducer, TransducerBuilder, DEFAULT_MAX_ARCS};
}
