//! sncfst - compile Search & Change rules into finite-state transducers
//!
//! Exit codes: 0 on success, 1 on validation or compilation errors, 2 when
//! the arc budget is exceeded, 3 on a reference/compiled mismatch under
//! `--compare`.

use clap::Parser;
use colored::Colorize;
use std::process;

use sncfst::cli::{commands, Cli};
use sncfst::evaluator::EvalError;
use sncfst::transducer::CompileError;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = commands::execute(cli.command) {
        eprintln!("{} {error:#}", "error:".red().bold());
        process::exit(exit_code(&error));
    }
}

fn exit_code(error: &anyhow::Error) -> i32 {
    for cause in error.chain() {
        if let Some(compile) = cause.downcast_ref::<CompileError>() {
            if matches!(compile, CompileError::ArcBudgetExceeded { .. }) {
                return 2;
            }
        }
        if let Some(eval) = cause.downcast_ref::<EvalError>() {
            match eval {
                EvalError::Consistency { .. } => return 3,
                EvalError::Compile(CompileError::ArcBudgetExceeded { .. }) => return 2,
                _ => {}
            }
        }
    }
    1
}
