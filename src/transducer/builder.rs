//! Direct canonical construction of `T_V`.
//!
//! The builder enumerates `(state, xV)` pairs in canonical order and emits
//! exactly one arc per pair, so the machine is total and deterministic by
//! construction rather than by a later determinization pass. The arc
//! budget is enforced from `|V|` and `|P|` alone, before any arc exists.

use crate::analysis::RuleAnalysis;
use crate::dsl::{self, OutExpr};
use crate::features::{FeatureUniverse, Ternary};
use crate::rules::Rule;

use super::encoding::{self, Label, StateId};
use super::predicate::ClassPredicate;
use super::{Arc, CompileError, RuleTransducer};

/// Default arc budget.
pub const DEFAULT_MAX_ARCS: u64 = 5_000_000;

/// Callback invoked as arcs are emitted, with `(arcs_done, arcs_total)`.
///
/// Called once per state row. It must not mutate the builder; it only
/// observes progress.
pub type ProgressFn<'a> = &'a mut dyn FnMut(u64, u64);

/// Builder for [`RuleTransducer`] with a fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use sncfst::prelude::*;
///
/// let machine = TransducerBuilder::new(alphabet.universe())
///     .max_arcs(100_000)
///     .build(&rule)?;
/// ```
pub struct TransducerBuilder<'a> {
    universe: &'a FeatureUniverse,
    max_arcs: u64,
    progress: Option<ProgressFn<'a>>,
}

impl<'a> TransducerBuilder<'a> {
    /// Create a builder over a feature universe with the default budget.
    pub fn new(universe: &'a FeatureUniverse) -> Self {
        Self {
            universe,
            max_arcs: DEFAULT_MAX_ARCS,
            progress: None,
        }
    }

    /// Set the arc budget.
    pub fn max_arcs(mut self, max_arcs: u64) -> Self {
        self.max_arcs = max_arcs;
        self
    }

    /// Attach a progress callback.
    pub fn progress(mut self, progress: ProgressFn<'a>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Parse, analyse, and compile a rule.
    pub fn build(self, rule: &Rule) -> Result<RuleTransducer, CompileError> {
        let out = OutExpr::parse(&rule.out)?;
        let analysis = RuleAnalysis::analyze(rule, &out, self.universe)?;
        self.build_analyzed(rule, &out, &analysis)
    }

    /// Compile a rule whose Out expression and analysis are already in
    /// hand, avoiding a re-parse when the caller needs them too.
    pub fn build_analyzed(
        mut self,
        rule: &Rule,
        out: &OutExpr,
        analysis: &RuleAnalysis,
    ) -> Result<RuleTransducer, CompileError> {
        let v_order = analysis.v_order();
        let p_order = analysis.p_order();

        let projected = analysis.projected_arcs();
        if projected > u128::from(self.max_arcs) {
            return Err(CompileError::ArcBudgetExceeded {
                projected,
                max_arcs: self.max_arcs,
                v_size: v_order.len(),
                p_size: p_order.len(),
            });
        }

        // The budget check bounds both counts, so u64 arithmetic is safe
        // from here on.
        let sigma_v = encoding::pow3(v_order.len())
            .ok_or_else(|| CompileError::InternalInvariant("|Σ_V| overflow".to_string()))?;
        let sigma_p = encoding::pow3(p_order.len())
            .ok_or_else(|| CompileError::InternalInvariant("|Σ_P| overflow".to_string()))?;
        let num_states = 1 + sigma_p;
        let total_arcs = num_states * sigma_v;

        let p_positions = p_order
            .iter()
            .map(|id| v_order.binary_search(id))
            .collect::<Result<Vec<usize>, _>>()
            .map_err(|_| CompileError::InternalInvariant("P ⊄ V".to_string()))?;

        let compile_class = |class| {
            ClassPredicate::compile(class, v_order, self.universe).ok_or_else(|| {
                CompileError::InternalInvariant("class feature outside V".to_string())
            })
        };
        let is_inr = compile_class(&rule.inr)?;
        let is_trm = compile_class(&rule.trm)?;
        let is_cnd = compile_class(&rule.cnd)?;

        let mut arcs = Vec::with_capacity(total_arcs as usize);
        let mut x_v = vec![Ternary::Unspec; v_order.len()];
        let mut mem_p = vec![Ternary::Unspec; p_order.len()];

        for state in 0..num_states {
            let live = state > 0;
            if live {
                encoding::decode_into(state - 1, &mut mem_p);
            }
            for code in 0..sigma_v {
                encoding::decode_into(code, &mut x_v);
                let ilabel: Label = code + 1;
                let trm_hit = is_trm.matches(&x_v);
                let cnd_hit = is_cnd.matches(&x_v);

                let (dst, olabel): (StateId, Label) = if !live {
                    let dst = if trm_hit && cnd_hit {
                        1 + encoding::project_code(&x_v, &p_positions)
                    } else {
                        0
                    };
                    (dst, ilabel)
                } else {
                    let olabel = if is_inr.matches(&x_v) {
                        let out_tuple = dsl::eval_out(
                            out, &x_v, v_order, &mem_p, p_order, self.universe,
                        )?;
                        encoding::encode(&out_tuple)
                    } else {
                        ilabel
                    };
                    let dst = if trm_hit {
                        if cnd_hit {
                            1 + encoding::project_code(&x_v, &p_positions)
                        } else {
                            0
                        }
                    } else {
                        state
                    };
                    (dst, olabel)
                };

                arcs.push(Arc {
                    src: state,
                    dst,
                    ilabel,
                    olabel,
                });
            }
            if let Some(progress) = self.progress.as_deref_mut() {
                progress(arcs.len() as u64, total_arcs);
            }
        }

        check_invariants(&arcs, num_states, sigma_v)?;

        Ok(RuleTransducer::new(
            rule.id.clone(),
            v_order.to_vec(),
            p_order.to_vec(),
            num_states,
            sigma_v,
            arcs,
        ))
    }
}

/// Post-construction checks: one arc per `(state, label)` pair, in order,
/// with every destination and output label in range.
fn check_invariants(arcs: &[Arc], num_states: u64, sigma_v: u64) -> Result<(), CompileError> {
    if arcs.len() as u64 != num_states * sigma_v {
        return Err(CompileError::InternalInvariant(format!(
            "arc count {} != {} states × {} labels",
            arcs.len(),
            num_states,
            sigma_v
        )));
    }
    for (index, arc) in arcs.iter().enumerate() {
        let index = index as u64;
        let expected_src = index / sigma_v;
        let expected_ilabel = index % sigma_v + 1;
        if arc.src != expected_src || arc.ilabel != expected_ilabel {
            return Err(CompileError::InternalInvariant(format!(
                "arc {index} out of canonical order (src {}, ilabel {})",
                arc.src, arc.ilabel
            )));
        }
        if arc.dst >= num_states || arc.olabel == 0 || arc.olabel > sigma_v {
            return Err(CompileError::InternalInvariant(format!(
                "arc {index} out of range (dst {}, olabel {})",
                arc.dst, arc.olabel
            )));
        }
    }
    Ok(())
}
