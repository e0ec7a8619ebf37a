//! End-to-end scenarios over a small two-feature alphabet.

use sncfst::alphabet::Alphabet;
use sncfst::analysis::RuleAnalysis;
use sncfst::dsl::OutExpr;
use sncfst::evaluator::{EvalOptions, Evaluator, RuleRow, Word};
use sncfst::features::{Polarity, Ternary};
use sncfst::rules::{Direction, FeatureLiteral, Rule};
use sncfst::transducer::{CompileError, TransducerBuilder};

/// Features F1, F2; symbols A(+,0), B(-,+), C(0,-), D(+,-).
fn alphabet() -> Alphabet {
    Alphabet::from_matrix(
        vec!["A".into(), "B".into(), "C".into(), "D".into()],
        vec!["F1".into(), "F2".into()],
        vec![
            vec![Ternary::Plus, Ternary::Minus, Ternary::Unspec, Ternary::Plus],
            vec![Ternary::Unspec, Ternary::Plus, Ternary::Minus, Ternary::Minus],
        ],
    )
    .unwrap()
}

fn word(symbols: &[&str]) -> Word {
    symbols.iter().map(|s| s.to_string()).collect()
}

fn class(literals: &[(Polarity, &str)]) -> Vec<FeatureLiteral> {
    literals
        .iter()
        .map(|&(polarity, feature)| FeatureLiteral::new(polarity, feature))
        .collect()
}

fn rule(
    id: &str,
    dir: Direction,
    inr: &[(Polarity, &str)],
    trm: &[(Polarity, &str)],
    out: &str,
) -> Rule {
    Rule {
        id: id.to_string(),
        dir,
        inr: class(inr),
        trm: class(trm),
        cnd: vec![],
        out: out.to_string(),
    }
}

#[test]
fn identity_rule_passes_words_through() {
    let alphabet = alphabet();
    let rule = rule("identity", Direction::Left, &[], &[], "INR");

    let evaluator = Evaluator::new(&alphabet);
    let outcome = evaluator
        .apply_rule(&rule, &[word(&["A", "B", "C"])])
        .unwrap();
    assert_eq!(outcome.outputs, vec![word(&["A", "B", "C"])]);

    let machine = TransducerBuilder::new(alphabet.universe())
        .build(&rule)
        .unwrap();
    assert!(machine.v_order().is_empty());
    assert!(machine.p_order().is_empty());
    assert_eq!(machine.num_states(), 2);
    assert_eq!(machine.arcs().len(), 2);
}

#[test]
fn terminator_feature_replaces_initiator() {
    let alphabet = alphabet();
    // Replace the initiator's F1 with TRM's F1 after a -F2 terminator.
    let rule = rule(
        "replace_f1",
        Direction::Left,
        &[(Polarity::Plus, "F1")],
        &[(Polarity::Minus, "F2")],
        "(unify (proj TRM (F1)) INR)",
    );

    let universe = alphabet.universe();
    let out = OutExpr::parse(&rule.out).unwrap();
    let analysis = RuleAnalysis::analyze(&rule, &out, universe).unwrap();
    assert_eq!(analysis.v_names(universe), vec!["F1", "F2"]);
    assert_eq!(analysis.p_names(universe), vec!["F1"]);

    // The second A follows the C terminator, but A's F1 is already + and
    // C's F1 is unspecified, so the word survives unchanged.
    let evaluator = Evaluator::new(&alphabet);
    let outcome = evaluator
        .apply_rule(&rule, &[word(&["A", "C", "A"])])
        .unwrap();
    assert_eq!(outcome.outputs, vec![word(&["A", "C", "A"])]);
}

#[test]
fn spread_right_with_literal_override() {
    let alphabet = alphabet();
    // Scanning right-to-left, initiators left of a +F2 terminator get
    // their F1 flipped to -.
    let rule = rule(
        "spread_left_of_trm",
        Direction::Right,
        &[(Polarity::Plus, "F1")],
        &[(Polarity::Plus, "F2")],
        "(unify (lit - F1) (subtract INR (proj INR (F1))))",
    );

    let evaluator = Evaluator::new(&alphabet);
    let outcome = evaluator
        .apply_rule(&rule, &[word(&["A", "B", "A"])])
        .unwrap();
    // The first A flips to (-, 0); the closest consistent symbol is B.
    assert_eq!(outcome.outputs, vec![word(&["B", "B", "A"])]);
}

#[test]
fn proj_trm_star_expands_v_to_the_universe() {
    let alphabet = alphabet();
    let rule = rule(
        "copy_terminator",
        Direction::Left,
        &[(Polarity::Plus, "F1")],
        &[],
        "(proj TRM *)",
    );

    let universe = alphabet.universe();
    let out = OutExpr::parse(&rule.out).unwrap();
    let analysis = RuleAnalysis::analyze(&rule, &out, universe).unwrap();
    assert_eq!(analysis.v_names(universe), vec!["F1", "F2"]);
    assert_eq!(analysis.p_names(universe), vec!["F1", "F2"]);

    let machine = TransducerBuilder::new(universe).build(&rule).unwrap();
    let states = machine.num_states();
    assert_eq!(states, 1 + 9);
    assert_eq!(machine.arcs().len() as u64, states * 9);
}

#[test]
fn arc_budget_tripwire() {
    let alphabet = alphabet();
    let rule = rule(
        "budget",
        Direction::Left,
        &[(Polarity::Plus, "F1")],
        &[(Polarity::Minus, "F2")],
        "(proj TRM *)",
    );

    let error = TransducerBuilder::new(alphabet.universe())
        .max_arcs(10)
        .build(&rule)
        .unwrap_err();
    match error {
        CompileError::ArcBudgetExceeded {
            projected,
            max_arcs,
            ..
        } => {
            assert_eq!(projected, 90);
            assert_eq!(max_arcs, 10);
        }
        other => panic!("expected ArcBudgetExceeded, got {other:?}"),
    }
}

#[test]
fn pipeline_applies_rules_in_document_order() {
    let alphabet = alphabet();
    // Rule one rewrites initiators toward B; rule two then rewrites the
    // B-shaped symbols toward D. The second row must be computed on the
    // first row's output.
    let first = rule(
        "first",
        Direction::Right,
        &[(Polarity::Plus, "F1")],
        &[(Polarity::Plus, "F2")],
        "(unify (lit - F1) (subtract INR (proj INR (F1))))",
    );
    let second = rule(
        "second",
        Direction::Left,
        &[(Polarity::Minus, "F1")],
        &[(Polarity::Plus, "F2")],
        "(unify (bundle (- F2)) (proj INR ()))",
    );

    let evaluator = Evaluator::new(&alphabet);
    let inputs = vec![word(&["A", "B", "C", "A"])];
    let outcome = evaluator
        .run_pipeline("doc", &[first, second], &inputs)
        .unwrap();

    assert_eq!(outcome.document.inputs, inputs);
    let row_ids: Vec<&str> = outcome.document.rows.iter().map(RuleRow::rule_id).collect();
    assert_eq!(row_ids, vec!["first", "second"]);

    // Row one: scanning right-to-left, B arms the search and the leading A
    // flips to B.
    assert_eq!(
        outcome.document.rows[0].outputs(),
        &[word(&["B", "B", "C", "A"])]
    );
    // Row two runs on row one's output. On the original input its first
    // symbol is A, which never arms anything before position 1; only the
    // B-initial word row one produced lets it rewrite the second B to C.
    assert_eq!(
        outcome.document.rows[1].outputs(),
        &[word(&["B", "C", "C", "A"])]
    );
}

#[test]
fn direction_duality() {
    let alphabet = alphabet();
    let right = rule(
        "dual",
        Direction::Right,
        &[(Polarity::Plus, "F1")],
        &[(Polarity::Plus, "F2")],
        "(unify (lit - F1) (subtract INR (proj INR (F1))))",
    );
    let mut left = right.clone();
    left.dir = Direction::Left;

    let evaluator = Evaluator::new(&alphabet);
    for symbols in [
        vec!["A", "B", "A"],
        vec!["B", "A", "A", "D"],
        vec!["D", "C", "B", "A", "A"],
        vec![],
    ] {
        let input = word(&symbols);
        let mut reversed = input.clone();
        reversed.reverse();

        let via_right = evaluator.apply_rule(&right, &[input.clone()]).unwrap();
        let via_left = evaluator.apply_rule(&left, &[reversed]).unwrap();
        let mut unreversed = via_left.outputs[0].clone();
        unreversed.reverse();
        assert_eq!(via_right.outputs[0], unreversed, "word {input:?}");
    }
}

#[test]
fn compare_checks_the_compiled_machine_arc_by_arc() {
    let alphabet = alphabet();
    let options = EvalOptions {
        compare: true,
        ..EvalOptions::default()
    };
    let evaluator = Evaluator::with_options(&alphabet, options);
    let rules = [
        rule("identity", Direction::Left, &[], &[], "INR"),
        rule(
            "replace_f1",
            Direction::Left,
            &[(Polarity::Plus, "F1")],
            &[(Polarity::Minus, "F2")],
            "(unify (proj TRM (F1)) INR)",
        ),
        rule(
            "spread",
            Direction::Right,
            &[(Polarity::Plus, "F1")],
            &[(Polarity::Plus, "F2")],
            "(unify (lit - F1) (subtract INR (proj INR (F1))))",
        ),
    ];
    let words = [
        word(&["A", "B", "C", "D"]),
        word(&["D", "D", "C", "B", "A"]),
        word(&["C"]),
    ];
    for rule in &rules {
        evaluator.apply_rule(rule, &words).unwrap();
    }
}
