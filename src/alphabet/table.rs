//! CSV/TSV feature-table import.
//!
//! The table layout: the header row is an empty leading cell followed by
//! symbol names; every following row is a feature name followed by one cell
//! per symbol. Cells are `+`, `-`, `0`, or blank (treated as `0`).

use std::path::Path;

use crate::alphabet::Alphabet;
use crate::features::Ternary;
use crate::validate::SchemaError;

/// Resolve the delimiter from an override, the file extension, or the
/// header line, in that priority order.
///
/// Content sniffing picks tab only when the sample contains a tab and no
/// comma.
pub fn detect_delimiter(path: &Path, sample: &str, delimiter: Option<char>) -> char {
    if let Some(delimiter) = delimiter {
        return delimiter;
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("tab") => '\t',
        Some(ext) if ext.eq_ignore_ascii_case("csv") => ',',
        _ => {
            if sample.contains('\t') && !sample.contains(',') {
                '\t'
            } else {
                ','
            }
        }
    }
}

/// Parse feature-table text with a known delimiter.
pub fn parse_table(text: &str, delimiter: char) -> Result<Alphabet, SchemaError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let rows: Vec<Vec<&str>> = text
        .lines()
        .map(|line| line.split(delimiter).map(str::trim).collect::<Vec<_>>())
        .filter(|cells: &Vec<&str>| cells.iter().any(|cell| !cell.is_empty()))
        .collect();

    if rows.is_empty() {
        return Err(SchemaError::new("feature table has no data rows"));
    }

    let header = &rows[0];
    if header.len() < 2 {
        return Err(SchemaError::new(
            "header must contain an empty leading cell plus at least one symbol",
        ));
    }
    let symbols: Vec<String> = header[1..].iter().map(|cell| cell.to_string()).collect();
    if symbols.iter().any(|symbol| symbol.is_empty()) {
        return Err(SchemaError::new("header symbols cannot be empty"));
    }

    let mut features = Vec::new();
    let mut values = Vec::new();
    let mut issues = Vec::new();

    for row in &rows[1..] {
        if row.len() < 2 {
            continue;
        }
        let feature = row[0];
        if feature.is_empty() {
            issues.push("feature name cannot be empty".to_string());
            continue;
        }
        let cells = &row[1..];
        if cells.len() != symbols.len() {
            issues.push(format!(
                "row for feature {feature:?} has {} values; expected {}",
                cells.len(),
                symbols.len()
            ));
            continue;
        }
        let mut row_values = Vec::with_capacity(cells.len());
        for cell in cells {
            match normalize_cell(cell) {
                Some(value) => row_values.push(value),
                None => {
                    issues.push(format!(
                        "invalid feature value for {feature:?}: {cell:?} \
                         (expected '+', '-', '0', or blank)"
                    ));
                    row_values.push(Ternary::Unspec);
                }
            }
        }
        features.push(feature.to_string());
        values.push(row_values);
    }

    if let Some(error) = SchemaError::from_issues(issues) {
        return Err(error);
    }
    Alphabet::from_matrix(symbols, features, values)
}

/// Read and parse a feature table from a file, detecting the delimiter.
pub fn load_table(path: &Path, delimiter: Option<char>) -> Result<Alphabet, SchemaError> {
    let text = std::fs::read_to_string(path)
        .map_err(|error| SchemaError::new(format!("cannot read {}: {error}", path.display())))?;
    if text.trim().is_empty() {
        return Err(SchemaError::new(format!("{} is empty", path.display())));
    }
    let first_line = text.lines().next().unwrap_or_default();
    let delimiter = detect_delimiter(path, first_line, delimiter);
    parse_table(&text, delimiter)
}

fn normalize_cell(cell: &str) -> Option<Ternary> {
    if cell.is_empty() {
        Some(Ternary::Unspec)
    } else {
        Ternary::parse(cell)
    }
}
