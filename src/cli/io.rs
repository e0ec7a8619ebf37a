//! Document loading for the CLI.
//!
//! Rules and input documents arrive as JSON or TOML, dispatched on file
//! extension; alphabets are CSV/TSV feature tables handled by
//! [`crate::alphabet::table`].

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::evaluator::Word;
use crate::rules::RulesDocument;

/// Load a rules document from a `.json` or `.toml` file.
pub fn load_rules(path: &Path) -> Result<RulesDocument> {
    let text = read(path)?;
    match extension(path).as_deref() {
        Some("json") => serde_json::from_str(&text)
            .with_context(|| format!("invalid rules JSON in {}", path.display())),
        Some("toml") => toml::from_str(&text)
            .with_context(|| format!("invalid rules TOML in {}", path.display())),
        _ => bail!("rules file must be a .json or .toml file"),
    }
}

/// An input document: a bare word list or an `{inputs: …}` wrapper.
#[derive(Deserialize)]
#[serde(untagged)]
enum InputDocument {
    Words(Vec<Word>),
    Wrapper { inputs: Vec<Word> },
}

impl InputDocument {
    fn into_words(self) -> Vec<Word> {
        match self {
            InputDocument::Words(words) => words,
            InputDocument::Wrapper { inputs } => inputs,
        }
    }
}

/// Load an input word list from a `.json` or `.toml` file.
pub fn load_inputs(path: &Path) -> Result<Vec<Word>> {
    let text = read(path)?;
    let document: InputDocument = match extension(path).as_deref() {
        Some("json") => serde_json::from_str(&text)
            .with_context(|| format!("invalid input JSON in {}", path.display()))?,
        Some("toml") => toml::from_str(&text)
            .with_context(|| format!("invalid input TOML in {}", path.display()))?,
        _ => bail!("input file must be a .json or .toml file"),
    };
    Ok(document.into_words())
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_rules_json_and_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let json = write_temp(
            &dir,
            "rules.json",
            r#"{"id": "doc", "rules": [{"id": "r1", "dir": "LEFT", "out": "INR"}]}"#,
        );
        let toml = write_temp(
            &dir,
            "rules.toml",
            "id = \"doc\"\n[[rules]]\nid = \"r1\"\ndir = \"LEFT\"\nout = \"INR\"\n",
        );
        assert_eq!(load_rules(&json).unwrap().rules.len(), 1);
        assert_eq!(load_rules(&toml).unwrap().rules.len(), 1);
    }

    #[test]
    fn test_load_rules_rejects_other_extensions() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_temp(&dir, "rules.yaml", "id: doc");
        assert!(load_rules(&path).is_err());
    }

    #[test]
    fn test_load_inputs_bare_and_wrapped() {
        let dir = tempfile::TempDir::new().unwrap();
        let bare = write_temp(&dir, "input1.json", r#"[["A", "B"], ["C"]]"#);
        let wrapped = write_temp(&dir, "input2.json", r#"{"inputs": [["A"]]}"#);
        let toml = write_temp(&dir, "input3.toml", "inputs = [[\"A\", \"B\"]]\n");
        assert_eq!(load_inputs(&bare).unwrap().len(), 2);
        assert_eq!(load_inputs(&wrapped).unwrap().len(), 1);
        assert_eq!(load_inputs(&toml).unwrap(), vec![vec!["A", "B"]]);
    }
}
