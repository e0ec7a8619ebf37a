//! CLI command implementations

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::alphabet::{table, Alphabet};
use crate::analysis::RuleAnalysis;
use crate::dsl::OutExpr;
use crate::evaluator::{EvalOptions, Evaluator};
use crate::rules::{Rule, RulesDocument};
use crate::transducer::{att, TransducerBuilder};
use crate::validate;

use super::args::{Commands, OutputFormat, ValidateCommands};
use super::{io, render};

/// Execute a CLI command
pub fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Validate(command) => match command {
            ValidateCommands::Rules {
                rules,
                alphabet,
                quiet,
                dump_vp,
                fst_stats,
            } => cmd_validate_rules(&rules, &alphabet, quiet, dump_vp, fst_stats),
            ValidateCommands::Alphabet {
                alphabet,
                delimiter,
                quiet,
            } => cmd_validate_alphabet(&alphabet, delimiter, quiet),
            ValidateCommands::Input {
                input,
                alphabet,
                quiet,
            } => cmd_validate_input(&input, &alphabet, quiet),
        },
        Commands::Compile {
            rules,
            alphabet,
            output,
            rule_id,
            symtab,
            max_arcs,
            progress,
        } => cmd_compile(&rules, &alphabet, &output, rule_id, symtab, max_arcs, progress),
        Commands::Eval {
            rules,
            alphabet,
            input,
            output,
            rule_id,
            include_input,
            compare,
            strict,
            dump_vp,
            direction,
            format,
            max_arcs,
        } => cmd_eval(EvalArgs {
            rules,
            alphabet,
            input,
            output,
            rule_id,
            include_input,
            compare,
            strict,
            dump_vp,
            direction,
            format,
            max_arcs,
        }),
        Commands::Init { output_dir, force } => cmd_init(&output_dir, force),
    }
}

fn load_alphabet(path: &Path) -> Result<Alphabet> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext)
            if ext.eq_ignore_ascii_case("csv")
                || ext.eq_ignore_ascii_case("tsv")
                || ext.eq_ignore_ascii_case("tab") => {}
        _ => bail!("alphabet must be a CSV/TSV feature table"),
    }
    Ok(table::load_table(path, None)?)
}

fn load_validated(rules_path: &Path, alphabet_path: &Path) -> Result<(RulesDocument, Alphabet)> {
    let alphabet = load_alphabet(alphabet_path)?;
    let document = io::load_rules(rules_path)?;
    validate::validate_document(&document, alphabet.universe())?;
    Ok((document, alphabet))
}

fn select_rules<'a>(document: &'a RulesDocument, rule_id: Option<&str>) -> Result<Vec<&'a Rule>> {
    match rule_id {
        Some(rule_id) => match document.rule(rule_id) {
            Some(rule) => Ok(vec![rule]),
            None => bail!("unknown rule id: {rule_id:?}"),
        },
        None => Ok(document.rules.iter().collect()),
    }
}

fn print_vp(rule: &Rule, alphabet: &Alphabet, fst_stats: bool) -> Result<()> {
    let universe = alphabet.universe();
    let out = OutExpr::parse(&rule.out)?;
    let analysis = RuleAnalysis::analyze(rule, &out, universe)?;
    println!("{} V: {}", rule.id, analysis.v_names(universe).join(", "));
    println!("{} P: {}", rule.id, analysis.p_names(universe).join(", "));
    if fst_stats {
        println!(
            "{} states: {} arcs: {}",
            rule.id,
            analysis.state_count(),
            analysis.projected_arcs()
        );
    }
    Ok(())
}

fn cmd_validate_rules(
    rules_path: &Path,
    alphabet_path: &Path,
    quiet: bool,
    dump_vp: bool,
    fst_stats: bool,
) -> Result<()> {
    let (document, alphabet) = load_validated(rules_path, alphabet_path)?;
    if dump_vp || fst_stats {
        for rule in &document.rules {
            print_vp(rule, &alphabet, fst_stats)?;
        }
    }
    if !quiet {
        println!("{}", "OK".green());
    }
    Ok(())
}

fn cmd_validate_alphabet(alphabet_path: &Path, delimiter: Option<char>, quiet: bool) -> Result<()> {
    table::load_table(alphabet_path, delimiter)?;
    if !quiet {
        println!("{}", "OK".green());
    }
    Ok(())
}

fn cmd_validate_input(input_path: &Path, alphabet_path: &Path, quiet: bool) -> Result<()> {
    let alphabet = load_alphabet(alphabet_path)?;
    let words = io::load_inputs(input_path)?;
    validate::validate_words(&words, &alphabet)?;
    if !quiet {
        println!("{}", "OK".green());
    }
    Ok(())
}

fn cmd_compile(
    rules_path: &Path,
    alphabet_path: &Path,
    output: &Path,
    rule_id: Option<String>,
    symtab: Option<PathBuf>,
    max_arcs: u64,
    progress: bool,
) -> Result<()> {
    let (document, alphabet) = load_validated(rules_path, alphabet_path)?;
    let selected = select_rules(&document, rule_id.as_deref())?;
    if selected.is_empty() {
        bail!("rules document contains no rules");
    }

    let multi = selected.len() > 1;
    if multi {
        if output.extension().is_some() {
            bail!("when compiling multiple rules, output must be a directory");
        }
        std::fs::create_dir_all(output)
            .with_context(|| format!("cannot create directory {}", output.display()))?;
        if symtab.is_some() {
            bail!("--symtab is only valid when compiling a single rule");
        }
    } else if output.is_dir() {
        bail!("when compiling a single rule, output must be a file path");
    }

    let total_rules = selected.len();
    for (index, rule) in selected.iter().enumerate() {
        let prefix = if multi {
            format!("[{}/{}] {}", index + 1, total_rules, rule.id)
        } else {
            rule.id.clone()
        };

        let mut report = |done: u64, total: u64| {
            eprint!("\r{} {done}/{total} arcs", rule.id);
            let _ = std::io::stderr().flush();
        };
        let mut builder = TransducerBuilder::new(alphabet.universe()).max_arcs(max_arcs);
        if progress {
            builder = builder.progress(&mut report);
        }
        let machine = builder.build(rule)?;
        if progress {
            eprintln!();
        }

        let att_path = if multi {
            output.join(format!("{}.att", rule.id))
        } else {
            output.to_path_buf()
        };
        let symtab_path = match (&symtab, multi) {
            (Some(path), false) => path.clone(),
            _ => att_path.with_extension("sym"),
        };
        att::write_att_files(&machine, alphabet.universe(), &att_path, &symtab_path)
            .with_context(|| format!("cannot write {}", att_path.display()))?;

        println!(
            "{} | states={} arcs={} | att={} sym={}",
            prefix.cyan(),
            machine.num_states(),
            machine.arcs().len(),
            att_path.display(),
            symtab_path.display()
        );
    }
    Ok(())
}

struct EvalArgs {
    rules: PathBuf,
    alphabet: PathBuf,
    input: PathBuf,
    output: Option<PathBuf>,
    rule_id: Option<String>,
    include_input: bool,
    compare: bool,
    strict: bool,
    dump_vp: bool,
    direction: Option<crate::rules::Direction>,
    format: OutputFormat,
    max_arcs: u64,
}

fn cmd_eval(args: EvalArgs) -> Result<()> {
    let (document, alphabet) = load_validated(&args.rules, &args.alphabet)?;
    let selected: Vec<Rule> = select_rules(&document, args.rule_id.as_deref())?
        .into_iter()
        .cloned()
        .collect();
    let inputs = io::load_inputs(&args.input)?;

    let options = EvalOptions {
        strict: args.strict,
        include_input: args.include_input,
        compare: args.compare,
        direction_override: args.direction,
        max_arcs: args.max_arcs,
    };
    let evaluator = Evaluator::with_options(&alphabet, options);
    let outcome = evaluator.run_pipeline(&document.id, &selected, &inputs)?;

    if args.dump_vp {
        for analysis in &outcome.analyses {
            println!("{} V: {}", analysis.rule_id, analysis.v.join(", "));
            println!("{} P: {}", analysis.rule_id, analysis.p.join(", "));
        }
    }

    let output_path = args.output.unwrap_or_else(|| {
        args.rules
            .with_file_name(format!("{}.out.{}", document.id, args.format.extension()))
    });
    let rendered = render::render(&outcome.document, args.format)?;
    std::fs::write(&output_path, rendered)
        .with_context(|| format!("cannot write {}", output_path.display()))?;

    println!("{}", "OK".green());
    Ok(())
}

fn cmd_init(output_dir: &Path, force: bool) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("cannot create directory {}", output_dir.display()))?;

    let alphabet_path = output_dir.join("alphabet.csv");
    let rules_path = output_dir.join("rules.toml");
    let input_path = output_dir.join("input.toml");

    if !force {
        let existing: Vec<String> = [&alphabet_path, &rules_path, &input_path]
            .iter()
            .filter(|path| path.exists())
            .map(|path| {
                path.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
            .collect();
        if !existing.is_empty() {
            bail!("sample files already exist: {}", existing.join(", "));
        }
    }

    std::fs::write(&alphabet_path, sample_alphabet())?;
    std::fs::write(&rules_path, SAMPLE_RULES)?;
    std::fs::write(&input_path, SAMPLE_INPUT)?;

    println!("{}", "OK".green());
    println!("alphabet: {}", alphabet_path.display());
    println!("rules: {}", rules_path.display());
    println!("input: {}", input_path.display());
    Ok(())
}

/// Three features, 27 symbols (`0` plus `A`–`Z`), enumerating every ternary
/// combination.
fn sample_alphabet() -> String {
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
    rows.join("\n") + "\n"
}

const SAMPLE_RULES: &str = r#"id = "sample_rules"

[[rules]]
id = "spread_f1_right"
dir = "RIGHT"
inr = [["+", "F1"]]
trm = [["+", "F2"]]
cnd = []
out = "(proj TRM (F1))"
"#;

const SAMPLE_INPUT: &str = r#"inputs = [
  ["0","A","B","C","D"],
  ["J","K","L"],
  ["T","U","V","W","X","Y","Z"]
]
"#;
