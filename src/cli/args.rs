//! CLI argument definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::rules::Direction;
use crate::transducer::DEFAULT_MAX_ARCS;

#[derive(Parser)]
#[command(name = "sncfst")]
#[command(about = "Compile Search & Change rules into finite-state transducers")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate rules, alphabet, or input words
    #[command(subcommand)]
    Validate(ValidateCommands),

    /// Compile rules into AT&T text format (writes .att and .sym)
    ///
    /// The compiled machine is canonical LEFT; RIGHT direction is handled
    /// by reversing input/output at evaluation time.
    Compile {
        /// Rules JSON/TOML file to compile
        rules: PathBuf,

        /// Alphabet CSV/TSV feature table
        alphabet: PathBuf,

        /// AT&T output path (file for a single rule, directory for several)
        output: PathBuf,

        /// Rule id to compile (defaults to every rule)
        #[arg(long)]
        rule_id: Option<String>,

        /// Symbol table output path (single rule only; defaults next to output)
        #[arg(long)]
        symtab: Option<PathBuf>,

        /// Maximum allowed arcs before aborting compilation
        #[arg(long, default_value_t = DEFAULT_MAX_ARCS)]
        max_arcs: u64,

        /// Show progress during compilation
        #[arg(short, long)]
        progress: bool,
    },

    /// Evaluate rules against an input word list
    ///
    /// Rules apply as a pipeline in document order; each rule's output is
    /// the next rule's input.
    Eval {
        /// Rules JSON/TOML file to evaluate
        rules: PathBuf,

        /// Alphabet CSV/TSV feature table
        alphabet: PathBuf,

        /// Input JSON/TOML words file (each word is an array of symbols)
        input: PathBuf,

        /// Output file (defaults to `<rules-id>.out.<ext>` next to the rules)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Rule id to evaluate (defaults to the whole pipeline)
        #[arg(long)]
        rule_id: Option<String>,

        /// Include per-rule input and output in the result document
        #[arg(long)]
        include_input: bool,

        /// Compile each rule and assert agreement with the reference walk
        #[arg(long)]
        compare: bool,

        /// Fail if an output bundle has no unique symbol in the alphabet
        #[arg(long)]
        strict: bool,

        /// Print V and P feature sets per rule
        #[arg(long)]
        dump_vp: bool,

        /// Override every rule's direction
        #[arg(long, value_enum)]
        direction: Option<Direction>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Arc budget for --compare compilation
        #[arg(long, default_value_t = DEFAULT_MAX_ARCS)]
        max_arcs: u64,
    },

    /// Generate sample alphabet.csv, rules.toml, and input.toml files
    Init {
        /// Directory to write the sample files into
        #[arg(default_value = ".")]
        output_dir: PathBuf,

        /// Overwrite existing sample files
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum ValidateCommands {
    /// Validate a rules JSON/TOML file against an alphabet
    Rules {
        /// Rules JSON/TOML file to validate
        rules: PathBuf,

        /// Alphabet CSV/TSV feature table
        alphabet: PathBuf,

        /// Suppress success output
        #[arg(short, long)]
        quiet: bool,

        /// Print V and P feature sets per rule
        #[arg(long)]
        dump_vp: bool,

        /// Print estimated states/arcs for the compiled machines
        #[arg(long)]
        fst_stats: bool,
    },

    /// Validate an alphabet CSV/TSV feature table
    Alphabet {
        /// Alphabet CSV/TSV feature table to validate
        alphabet: PathBuf,

        /// Override the delimiter (default: detect)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Suppress success output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Validate an input word list against an alphabet
    Input {
        /// Input JSON/TOML words file
        input: PathBuf,

        /// Alphabet CSV/TSV feature table
        alphabet: PathBuf,

        /// Suppress success output
        #[arg(short, long)]
        quiet: bool,
    },
}

/// Rendering format for eval output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The JSON output document
    Json,
    /// ASCII derivation table
    Txt,
    /// Comma-separated derivation table
    Csv,
    /// Tab-separated derivation table
    Tsv,
}

impl OutputFormat {
    /// The file extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Txt => "txt",
            OutputFormat::Csv => "csv",
            OutputFormat::Tsv => "tsv",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}
