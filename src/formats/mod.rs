//! Readers and writers for the fixed-column text files exchanged with
//! GenStPar, CLIGEN and WEPP.

use {
    anyhow::{Context, Result},
    std::{fs, path::Path},
    thiserror::Error,
};

pub mod cli;
pub mod ebe;
pub mod gds;
pub mod loss;
pub mod man;
pub mod run;
pub mod slp;
pub mod sol;
pub mod top;

#[derive(Debug, Error, PartialEq)]
pub enum FormatError {
    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: invalid number \"{token}\"")]
    Number { line: usize, token: String },
    #[error("no line containing \"{0}\"")]
    MissingKey(&'static str),
    #[error("expected at least {expected} lines, found {found}")]
    Truncated { expected: usize, found: usize },
}

/// Reads a whole text file, naming it in the error.
pub fn read_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Overwrites a text file, naming it in the error.
pub fn write_text<P: AsRef<Path>>(path: P, contents: &str) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

/// Numbers among the whitespace separated tokens of a line, in order.
pub(crate) fn numbers(line: &str) -> Vec<f64> {
    line.split_whitespace()
        .filter_map(|token| token.parse().ok())
        .collect()
}

pub(crate) fn parse_number(token: &str, line: usize) -> Result<f64, FormatError> {
    token.parse().map_err(|_| FormatError::Number {
        line,
        token: token.to_string(),
    })
}

/// Byte spans of the whitespace separated tokens of a line.
pub(crate) fn token_spans(line: &str) -> Vec<(usize, usize)> {
    let mut spans = vec![];
    let mut start = None;

    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => (),
        }
    }
    if let Some(s) = start {
        spans.push((s, line.len()));
    }

    spans
}

/// Rounds to a number of decimal places.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Joins lines with newlines, ending the text with one.
pub(crate) fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut text = String::new();
    for line in lines {
        text.push_str(line.as_ref());
        text.push('\n');
    }
    text
}
