//! Output-document rendering.
//!
//! JSON output is the document itself; the tabular formats render a
//! derivation table: a `UR` header with one column per input word, one row
//! per rule (cells show `---` when the word is unchanged from the previous
//! row), and a closing `SR` row with the final forms.

use anyhow::Result;

use crate::evaluator::{OutputDocument, Word};

use super::args::OutputFormat;

/// Render the output document in the requested format.
pub fn render(document: &OutputDocument, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut text = serde_json::to_string_pretty(document)?;
            text.push('\n');
            Ok(text)
        }
        OutputFormat::Txt => Ok(render_ascii_table(&derivation_table(document))),
        OutputFormat::Csv => Ok(render_delimited(&derivation_table(document), ',')),
        OutputFormat::Tsv => Ok(render_delimited(&derivation_table(document), '\t')),
    }
}

/// A word rendered compactly: symbols joined without a separator.
fn compact(word: &Word) -> String {
    word.concat()
}

/// Header plus rows of the derivation table.
fn derivation_table(document: &OutputDocument) -> (Vec<String>, Vec<Vec<String>>) {
    let mut headers = vec!["UR".to_string()];
    headers.extend(document.inputs.iter().map(compact));

    let mut rows = Vec::with_capacity(document.rows.len() + 1);
    let mut previous: &[Word] = &document.inputs;
    for row in &document.rows {
        let outputs = row.outputs();
        let mut cells = vec![row.rule_id().to_string()];
        for (index, word) in outputs.iter().enumerate() {
            if previous.get(index) == Some(word) {
                cells.push("---".to_string());
            } else {
                cells.push(compact(word));
            }
        }
        rows.push(cells);
        previous = outputs;
    }

    let mut surface = vec!["SR".to_string()];
    surface.extend(previous.iter().map(compact));
    rows.push(surface);

    (headers, rows)
}

fn render_delimited((headers, rows): &(Vec<String>, Vec<Vec<String>>), delimiter: char) -> String {
    let mut text = String::new();
    let delimiter = delimiter.to_string();
    text.push_str(&headers.join(&delimiter));
    text.push('\n');
    for row in rows {
        text.push_str(&row.join(&delimiter));
        text.push('\n');
    }
    text
}

fn render_ascii_table((headers, rows): &(Vec<String>, Vec<Vec<String>>)) -> String {
    let mut widths: Vec<usize> = headers.iter().map(String::len).collect();
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            if cell.len() > widths[index] {
                widths[index] = cell.len();
            }
        }
    }

    let render_row = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(index, cell)| format!("{cell:<width$}", width = widths[index]))
            .collect();
        format!("| {} |", padded.join(" | "))
    };
    let separator = format!(
        "+-{}-+",
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-+-")
    );

    let mut lines = vec![separator.clone(), render_row(headers), separator.clone()];
    for row in rows {
        lines.push(render_row(row));
        lines.push(separator.clone());
    }
    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::RuleRow;

    fn document() -> OutputDocument {
        let word = |symbols: &[&str]| -> Word { symbols.iter().map(|s| s.to_string()).collect() };
        OutputDocument {
            id: "doc".to_string(),
            inputs: vec![word(&["A", "B"]), word(&["C"])],
            rows: vec![
                RuleRow::Plain {
                    rule_id: "r1".to_string(),
                    outputs: vec![word(&["B", "B"]), word(&["C"])],
                },
                RuleRow::Plain {
                    rule_id: "r2".to_string(),
                    outputs: vec![word(&["B", "B"]), word(&["A"])],
                },
            ],
        }
    }

    #[test]
    fn test_tsv_marks_unchanged_words() {
        let text = render(&document(), OutputFormat::Tsv).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "UR\tAB\tC");
        assert_eq!(lines[1], "r1\tBB\t---");
        assert_eq!(lines[2], "r2\t---\tA");
        assert_eq!(lines[3], "SR\tBB\tA");
    }

    #[test]
    fn test_txt_table_shape() {
        let text = render(&document(), OutputFormat::Txt).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        // Separator, header, separator, then row+separator pairs.
        assert_eq!(lines.len(), 3 + 2 * 3);
        assert!(lines[0].starts_with("+-"));
        assert!(lines[1].starts_with("| UR"));
        assert_eq!(lines[0], lines[2]);
    }

    #[test]
    fn test_json_round_trips() {
        let text = render(&document(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["id"], "doc");
        assert_eq!(value["rows"][0]["rule_id"], "r1");
        assert_eq!(value["rows"][0]["outputs"][0][0], "B");
    }
}
