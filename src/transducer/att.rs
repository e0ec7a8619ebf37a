//! AT&T text emission and symbol tables.
//!
//! One arc per line, `src dst ilabel olabel`, followed by one standalone
//! line per final state (every state is final here). The symbol table is
//! shared between input and output sides: `<eps> 0` plus one line per Σ_V
//! label in ascending order. Names concatenate each feature with its value
//! suffix (`+`, `-`, `0`), joined by `_`.

use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::features::{FeatureId, FeatureUniverse, Ternary};

use super::encoding;
use super::RuleTransducer;

/// Write the AT&T text form of a machine.
pub fn write_att<W: Write>(machine: &RuleTransducer, writer: &mut W) -> io::Result<()> {
    for arc in machine.arcs() {
        writeln!(writer, "{} {} {} {}", arc.src, arc.dst, arc.ilabel, arc.olabel)?;
    }
    for state in 0..machine.num_states() {
        writeln!(writer, "{state}")?;
    }
    Ok(())
}

/// Write the shared symbol table of a machine.
pub fn write_symtab<W: Write>(
    machine: &RuleTransducer,
    universe: &FeatureUniverse,
    writer: &mut W,
) -> io::Result<()> {
    writeln!(writer, "<eps> 0")?;
    let width = machine.v_order().len();
    let mut tuple = vec![Ternary::Unspec; width];
    for code in 0..machine.sigma_size() {
        encoding::decode_into(code, &mut tuple);
        let name = symbol_name(&tuple, machine.v_order(), universe);
        writeln!(writer, "{name} {}", code + 1)?;
    }
    Ok(())
}

/// The symbol-table name of a witness tuple, e.g. `Voice+_Nasal0`.
pub fn symbol_name(tuple: &[Ternary], order: &[FeatureId], universe: &FeatureUniverse) -> String {
    let parts: Vec<String> = order
        .iter()
        .zip(tuple)
        .map(|(&feature, &value)| format!("{}{}", universe.name(feature), value.suffix()))
        .collect();
    parts.join("_")
}

/// Write the AT&T file and its sibling symbol table.
pub fn write_att_files(
    machine: &RuleTransducer,
    universe: &FeatureUniverse,
    att_path: &Path,
    symtab_path: &Path,
) -> io::Result<()> {
    let mut att = BufWriter::new(std::fs::File::create(att_path)?);
    write_att(machine, &mut att)?;
    att.flush()?;

    let mut symtab = BufWriter::new(std::fs::File::create(symtab_path)?);
    write_symtab(machine, universe, &mut symtab)?;
    symtab.flush()
}
