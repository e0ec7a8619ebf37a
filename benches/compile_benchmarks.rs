//! Criterion benchmarks for rule compilation and evaluation.
//!
//! Profiles the transducer builder as |V| and |P| grow, and the reference
//! evaluator on multi-word inputs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use sncfst::alphabet::{table, Alphabet};
use sncfst::evaluator::{EvalOptions, Evaluator, Word};
use sncfst::features::Polarity;
use sncfst::rules::{Direction, FeatureLiteral, Rule};
use sncfst::transducer::TransducerBuilder;

/// 27 symbols over three features, every ternary combination present.
fn full_alphabet() -> Alphabet {
    let symbols: Vec<String> = std::iter::once("0".to_string())
        .chain(('A'..='Z').map(|c| c.to_string()))
        .collect();
    let mut rows = vec![format!(",{}", symbols.join(","))];
    for (feature_index, feature) in ["F1", "F2", "F3"].iter().enumerate() {
        let stride = 3usize.pow(feature_index as u32);
        let values: Vec<&str> = (0..symbols.len())
            .map(|symbol_index| match (symbol_index / stride) % 3 {
                0 => "0",
                1 => "+",
                _ => "-",
            })
            .collect();
        rows.push(format!("{feature},{}", values.join(",")));
    }
    table::parse_table(&(rows.join("\n") + "\n"), ',').unwrap()
}

/// A spreading rule whose Out expression touches `width` features, driving
/// |V| (and |P|) from 1 up to the full universe.
fn spread_rule(width: usize) -> Rule {
    let features = ["F1", "F2", "F3"];
    let projected = features[..width].join(" ");
    Rule {
        id: format!("spread_{width}"),
        dir: Direction::Right,
        inr: vec![FeatureLiteral::new(Polarity::Plus, "F1")],
        trm: vec![FeatureLiteral::new(Polarity::Plus, "F2")],
        cnd: vec![],
        out: format!("(unify (proj TRM ({projected})) INR)"),
    }
}

fn sample_words(count: usize, length: usize) -> Vec<Word> {
    let names: Vec<String> = std::iter::once("0".to_string())
        .chain(('A'..='Z').map(|c| c.to_string()))
        .collect();
    (0..count)
        .map(|word_index| {
            (0..length)
                .map(|position| names[(word_index * 7 + position * 11) % names.len()].clone())
                .collect()
        })
        .collect()
}

fn bench_compile(c: &mut Criterion) {
    let alphabet = full_alphabet();
    let mut group = c.benchmark_group("compile");
    for width in 1..=3 {
        let rule = spread_rule(width);
        group.bench_with_input(BenchmarkId::new("spread", width), &rule, |b, rule| {
            b.iter(|| {
                TransducerBuilder::new(alphabet.universe())
                    .build(black_box(rule))
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let alphabet = full_alphabet();
    let rule = spread_rule(2);
    let words = sample_words(64, 12);
    let evaluator = Evaluator::new(&alphabet);

    c.bench_function("evaluate_64x12", |b| {
        b.iter(|| evaluator.apply_rule(black_box(&rule), black_box(&words)).unwrap());
    });

    let compare = Evaluator::with_options(
        &alphabet,
        EvalOptions {
            compare: true,
            ..EvalOptions::default()
        },
    );
    c.bench_function("evaluate_64x12_compare", |b| {
        b.iter(|| compare.apply_rule(black_box(&rule), black_box(&words)).unwrap());
    });
}

criterion_group!(benches, bench_compile, bench_evaluate);
criterion_main!(benches);
