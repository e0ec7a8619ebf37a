//! The reference evaluator.
//!
//! Applies Search & Change semantics directly to symbol strings, without
//! materialising `T_V`: a single left-to-right walk carrying the Σ_P memory
//! of the most recent armed terminator. RIGHT-direction rules process the
//! word back-to-front, which is the same machine run on the reversed word.
//!
//! The evaluator and the transducer builder share one Out-evaluation
//! routine ([`crate::dsl::eval_out`]), so under `compare` a divergence
//! between the walk and the compiled machine is always a transition bug,
//! never a semantic drift — and the walk checks for it arc by arc.

use serde::Serialize;
use thiserror::Error;

use crate::alphabet::Alphabet;
use crate::analysis::RuleAnalysis;
use crate::dsl::{self, DslError, OutExpr};
use crate::features::Ternary;
use crate::rules::{Direction, Rule};
use crate::transducer::{
    encoding, ClassPredicate, CompileError, RuleTransducer, TransducerBuilder, DEFAULT_MAX_ARCS,
};
use crate::validate::SchemaError;

/// A word: a sequence of surface symbol names.
pub type Word = Vec<String>;

/// Evaluation configuration.
#[derive(Debug, Clone)]
pub struct EvalOptions {
    /// Require output bundles to resolve to a unique alphabet symbol.
    pub strict: bool,
    /// Record per-rule inputs alongside outputs in the output document.
    pub include_input: bool,
    /// Compile each rule and assert arc-by-arc agreement with the walk.
    pub compare: bool,
    /// When set, overrides every rule's direction.
    pub direction_override: Option<Direction>,
    /// Arc budget for `compare`-mode compilation.
    pub max_arcs: u64,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            strict: false,
            include_input: false,
            compare: false,
            direction_override: None,
            max_arcs: DEFAULT_MAX_ARCS,
        }
    }
}

/// The result of applying one rule to a word list.
#[derive(Debug, Clone)]
pub struct RuleOutcome {
    /// The rule's id.
    pub rule_id: String,
    /// One output word per input word.
    pub outputs: Vec<Word>,
    /// `V` as feature names, in canonical order.
    pub v: Vec<String>,
    /// `P` as feature names, in canonical order.
    pub p: Vec<String>,
}

/// One row of the output document.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RuleRow {
    /// Outputs only (the default).
    Plain {
        /// The rule applied on this row.
        rule_id: String,
        /// Its outputs, one per input word.
        outputs: Vec<Word>,
    },
    /// Outputs plus a copy of the row's input (`include_input`).
    WithInput {
        /// The rule applied on this row.
        rule_id: String,
        /// The words this rule received.
        input: Vec<Word>,
        /// Its outputs.
        output: Vec<Word>,
    },
}

impl RuleRow {
    /// The rule id of this row.
    pub fn rule_id(&self) -> &str {
        match self {
            RuleRow::Plain { rule_id, .. } | RuleRow::WithInput { rule_id, .. } => rule_id,
        }
    }

    /// The row's output words.
    pub fn outputs(&self) -> &[Word] {
        match self {
            RuleRow::Plain { outputs, .. } => outputs,
            RuleRow::WithInput { output, .. } => output,
        }
    }
}

/// The output document of a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct OutputDocument {
    /// The rules document id.
    pub id: String,
    /// The starting input words.
    pub inputs: Vec<Word>,
    /// Per-rule rows, in application order.
    pub rows: Vec<RuleRow>,
}

/// `V` and `P` of one rule, as names.
#[derive(Debug, Clone, Serialize)]
pub struct RuleVp {
    /// The rule's id.
    pub rule_id: String,
    /// Grammar-visible features.
    pub v: Vec<String>,
    /// Out-visible terminator features.
    pub p: Vec<String>,
}

/// The result of a pipeline run: the document plus per-rule `V`/`P`.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// The rendered output document.
    pub document: OutputDocument,
    /// Per-rule dependency sets, in application order.
    pub analyses: Vec<RuleVp>,
}

/// An evaluation failed at runtime.
#[derive(Debug, Clone, Error)]
pub enum EvalError {
    /// A word contains a symbol the alphabet does not define.
    #[error("rule {rule_id}: word {word} has unknown symbol {symbol:?} at position {position}")]
    UnknownSymbol {
        /// The rule being applied.
        rule_id: String,
        /// Index of the word in the input list.
        word: usize,
        /// Position of the symbol within the word.
        position: usize,
        /// The offending symbol.
        symbol: String,
    },
    /// An output bundle could not be resolved to a symbol.
    #[error("rule {rule_id}: no symbol for the output bundle at word {word} position {position}")]
    SymbolResolution {
        /// The rule being applied.
        rule_id: String,
        /// Index of the word in the input list.
        word: usize,
        /// Position of the rewritten symbol.
        position: usize,
    },
    /// Under `compare`, the walk and the compiled machine disagreed.
    #[error(
        "rule {rule_id}: reference and compiled transducer diverge at word {word} position {position}"
    )]
    Consistency {
        /// The rule being applied.
        rule_id: String,
        /// Index of the word in the input list.
        word: usize,
        /// First divergent position.
        position: usize,
    },
    /// The rule's Out expression failed.
    #[error(transparent)]
    Dsl(#[from] DslError),
    /// `compare`-mode compilation failed.
    #[error(transparent)]
    Compile(#[from] CompileError),
    /// A document failed validation.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Applies rules to words over a fixed alphabet.
pub struct Evaluator<'a> {
    alphabet: &'a Alphabet,
    options: EvalOptions,
}

impl<'a> Evaluator<'a> {
    /// An evaluator with default options.
    pub fn new(alphabet: &'a Alphabet) -> Self {
        Self::with_options(alphabet, EvalOptions::default())
    }

    /// An evaluator with explicit options.
    pub fn with_options(alphabet: &'a Alphabet, options: EvalOptions) -> Self {
        Self { alphabet, options }
    }

    /// The options in effect.
    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    /// Apply one rule to a word list.
    pub fn apply_rule(&self, rule: &Rule, words: &[Word]) -> Result<RuleOutcome, EvalError> {
        let universe = self.alphabet.universe();
        let out = OutExpr::parse(&rule.out)?;
        let analysis = RuleAnalysis::analyze(rule, &out, universe)?;

        let machine = if self.options.compare {
            Some(
                TransducerBuilder::new(universe)
                    .max_arcs(self.options.max_arcs)
                    .build_analyzed(rule, &out, &analysis)?,
            )
        } else {
            None
        };

        let walk = RuleWalk::prepare(self.alphabet, rule, &out, &analysis)?;
        let direction = self.options.direction_override.unwrap_or(rule.dir);

        let mut outputs = Vec::with_capacity(words.len());
        for (word_index, word) in words.iter().enumerate() {
            outputs.push(walk.eval_word(
                word,
                word_index,
                direction,
                machine.as_ref(),
                self.options.strict,
            )?);
        }

        Ok(RuleOutcome {
            rule_id: rule.id.clone(),
            outputs,
            v: analysis
                .v_names(universe)
                .into_iter()
                .map(str::to_string)
                .collect(),
            p: analysis
                .p_names(universe)
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
    }

    /// Apply a rule pipeline in order: each rule's output feeds the next.
    pub fn run_pipeline(
        &self,
        document_id: &str,
        rules: &[Rule],
        inputs: &[Word],
    ) -> Result<PipelineOutcome, EvalError> {
        let mut current: Vec<Word> = inputs.to_vec();
        let mut rows = Vec::with_capacity(rules.len());
        let mut analyses = Vec::with_capacity(rules.len());

        for rule in rules {
            let outcome = self.apply_rule(rule, &current)?;
            analyses.push(RuleVp {
                rule_id: outcome.rule_id.clone(),
                v: outcome.v,
                p: outcome.p,
            });
            let row = if self.options.include_input {
                RuleRow::WithInput {
                    rule_id: outcome.rule_id,
                    input: current,
                    output: outcome.outputs.clone(),
                }
            } else {
                RuleRow::Plain {
                    rule_id: outcome.rule_id,
                    outputs: outcome.outputs.clone(),
                }
            };
            rows.push(row);
            current = outcome.outputs;
        }

        Ok(PipelineOutcome {
            document: OutputDocument {
                id: document_id.to_string(),
                inputs: inputs.to_vec(),
                rows,
            },
            analyses,
        })
    }
}

/// Per-rule machinery shared across the words of one application.
struct RuleWalk<'a> {
    alphabet: &'a Alphabet,
    rule_id: &'a str,
    out: &'a OutExpr,
    v_order: &'a [usize],
    p_order: &'a [usize],
    p_positions: Vec<usize>,
    is_inr: ClassPredicate,
    is_trm: ClassPredicate,
    is_cnd: ClassPredicate,
}

impl<'a> RuleWalk<'a> {
    fn prepare(
        alphabet: &'a Alphabet,
        rule: &'a Rule,
        out: &'a OutExpr,
        analysis: &'a RuleAnalysis,
    ) -> Result<Self, EvalError> {
        let universe = alphabet.universe();
        let v_order = analysis.v_order();
        let p_positions = analysis
            .p_order()
            .iter()
            .map(|id| v_order.binary_search(id))
            .collect::<Result<Vec<usize>, _>>()
            .map_err(|_| CompileError::InternalInvariant("P ⊄ V".to_string()))?;
        let compile_class = |class| {
            ClassPredicate::compile(class, v_order, universe).ok_or_else(|| {
                CompileError::InternalInvariant("class feature outside V".to_string())
            })
        };
        Ok(Self {
            alphabet,
            rule_id: &rule.id,
            out,
            v_order,
            p_order: analysis.p_order(),
            is_inr: compile_class(&rule.inr)?,
            is_trm: compile_class(&rule.trm)?,
            is_cnd: compile_class(&rule.cnd)?,
            p_positions,
        })
    }

    fn eval_word(
        &self,
        word: &Word,
        word_index: usize,
        direction: Direction,
        machine: Option<&RuleTransducer>,
        strict: bool,
    ) -> Result<Word, EvalError> {
        let universe = self.alphabet.universe();

        let mut symbol_ids = Vec::with_capacity(word.len());
        for (position, symbol) in word.iter().enumerate() {
            let id = self.alphabet.symbol_id(symbol).ok_or_else(|| {
                EvalError::UnknownSymbol {
                    rule_id: self.rule_id.to_string(),
                    word: word_index,
                    position,
                    symbol: symbol.clone(),
                }
            })?;
            symbol_ids.push(id);
        }

        // A RIGHT rule is the LEFT machine run over the reversed word.
        let positions: Vec<usize> = match direction {
            Direction::Left => (0..word.len()).collect(),
            Direction::Right => (0..word.len()).rev().collect(),
        };

        let mut out_tuples: Vec<Option<crate::bundle::TernaryTuple>> = vec![None; word.len()];
        let mut memory: Option<u64> = None;
        let mut mem_p = vec![Ternary::Unspec; self.p_order.len()];
        let mut machine_state = machine.map(|m| m.start());

        for &position in &positions {
            let x_v = self.alphabet.project(symbol_ids[position], self.v_order);

            let out_tuple = if memory.is_some() && self.is_inr.matches(&x_v) {
                dsl::eval_out(self.out, &x_v, self.v_order, &mem_p, self.p_order, universe)?
            } else {
                x_v.clone()
            };

            let trm_hit = self.is_trm.matches(&x_v);
            if trm_hit {
                memory = if self.is_cnd.matches(&x_v) {
                    let code = encoding::project_code(&x_v, &self.p_positions);
                    encoding::decode_into(code, &mut mem_p);
                    Some(code)
                } else {
                    None
                };
            }

            if let (Some(machine), Some(state)) = (machine, machine_state.as_mut()) {
                let ilabel = encoding::encode(&x_v);
                let (next, olabel) = machine.transition(*state, ilabel).ok_or_else(|| {
                    CompileError::InternalInvariant(format!(
                        "missing transition for state {state} label {ilabel}"
                    ))
                })?;
                let expected_state = match memory {
                    None => 0,
                    Some(code) => 1 + code,
                };
                if olabel != encoding::encode(&out_tuple) || next != expected_state {
                    return Err(EvalError::Consistency {
                        rule_id: self.rule_id.to_string(),
                        word: word_index,
                        position,
                    });
                }
                *state = next;
            }

            out_tuples[position] = Some(out_tuple);
        }

        let mut output = Vec::with_capacity(word.len());
        for (position, out_tuple) in out_tuples.iter().enumerate() {
            let out_tuple = out_tuple
                .as_ref()
                .expect("every position visited exactly once");
            output.push(self.resolve(out_tuple, symbol_ids[position], word_index, position, strict)?);
        }
        Ok(output)
    }

    /// Resolve a rewritten position back to a surface symbol.
    ///
    /// The full bundle is the input symbol's bundle with the `V`
    /// coordinates replaced by the output tuple; features outside `V` pass
    /// through untouched.
    fn resolve(
        &self,
        out_tuple: &[Ternary],
        input_symbol: usize,
        word_index: usize,
        position: usize,
        strict: bool,
    ) -> Result<String, EvalError> {
        let mut full: Vec<Ternary> = self.alphabet.full_tuple(input_symbol).to_vec();
        for (&feature, &value) in self.v_order.iter().zip(out_tuple) {
            full[feature] = value;
        }

        let resolution_error = || EvalError::SymbolResolution {
            rule_id: self.rule_id.to_string(),
            word: word_index,
            position,
        };

        match self.alphabet.resolve_exact(&full) {
            Some((index, count)) => {
                if strict && count > 1 {
                    Err(resolution_error())
                } else {
                    Ok(self.alphabet.symbol_name(index).to_string())
                }
            }
            None if strict => Err(resolution_error()),
            None => self
                .alphabet
                .resolve_consistent(out_tuple, self.v_order)
                .map(|index| self.alphabet.symbol_name(index).to_string())
                .ok_or_else(resolution_error),
        }
    }
}
