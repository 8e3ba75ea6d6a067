//! Line-level transliteration parsing.
//!
//! Each raw input line is processed independently: strip and validate the
//! line-number prefix, then scan the remainder into words. Every line
//! produces exactly one [`LineParseResult`] variant; failures retain the
//! raw input (and any words completed before the failure point) so the user
//! can correct them manually.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::node::{attrs, element_node, NodeRef};
use crate::translit::word::{scan_word, Word};

/// Line-number prefix: digits, an optional prime, then `.`, `#` or `:`.
static LINE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s*('?)\s*[.#:]\s*(.*)$").unwrap());

/// A manuscript line number such as `1` or `12'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineNumber {
    pub number: u32,
    /// Primed numbers count from a broken edge of the tablet.
    pub prime: bool,
}

impl std::fmt::Display for LineNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.number, if self.prime { "'" } else { "" })
    }
}

/// A successfully parsed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineParseSuccess {
    pub input: String,
    pub line_number: LineNumber,
    pub words: Vec<Word>,
}

/// The outcome of parsing one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineParseResult {
    /// The line parsed completely.
    Success(LineParseSuccess),
    /// The line-number prefix was missing or malformed; nothing usable was
    /// recovered beyond the raw input.
    PreParsingError { input: String, reason: String },
    /// A word failed to scan; the words before the failure point are kept.
    WordParsingError {
        input: String,
        partial_words: Vec<Word>,
        reason: String,
    },
}

impl LineParseResult {
    /// Returns the success payload, if this line parsed.
    pub fn as_success(&self) -> Option<&LineParseSuccess> {
        match self {
            LineParseResult::Success(success) => Some(success),
            _ => None,
        }
    }

    /// Returns true for either error variant.
    pub fn is_error(&self) -> bool {
        !matches!(self, LineParseResult::Success(_))
    }

    /// The raw input line this result was produced from.
    pub fn input(&self) -> &str {
        match self {
            LineParseResult::Success(success) => &success.input,
            LineParseResult::PreParsingError { input, .. } => input,
            LineParseResult::WordParsingError { input, .. } => input,
        }
    }
}

/// Parses one transliteration line.
pub fn parse_transliteration_line(input: &str) -> LineParseResult {
    let Some(captures) = LINE_NUMBER_RE.captures(input) else {
        return LineParseResult::PreParsingError {
            input: input.to_string(),
            reason: "missing line number prefix".to_string(),
        };
    };

    // The regex only admits digit runs; overflow of u32 is the one way the
    // parse can still fail.
    let number = match captures[1].parse::<u32>() {
        Ok(number) => number,
        Err(_) => {
            return LineParseResult::PreParsingError {
                input: input.to_string(),
                reason: format!("line number '{}' out of range", &captures[1]),
            }
        }
    };
    let line_number = LineNumber {
        number,
        prime: &captures[2] == "'",
    };

    let mut words = Vec::new();
    for raw_word in captures[3].split_whitespace() {
        match scan_word(raw_word) {
            Ok(word) => words.push(word),
            Err(reason) => {
                return LineParseResult::WordParsingError {
                    input: input.to_string(),
                    partial_words: words,
                    reason,
                }
            }
        }
    }

    LineParseResult::Success(LineParseSuccess {
        input: input.to_string(),
        line_number,
        words,
    })
}

/// Parses a whole transliteration: one result per non-blank line, in input
/// order. A failing line never affects the others.
pub fn parse_transliteration(text: &str) -> Vec<LineParseResult> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_transliteration_line)
        .collect()
}

/// Converts a parsed line to its XML nodes: the `<lb/>` line break followed
/// by one `<w>` element per word.
pub fn write_line_parse_success_to_xml(success: &LineParseSuccess) -> Vec<NodeRef> {
    let mut nodes = Vec::with_capacity(success.words.len() + 1);
    let lnr = success.line_number.to_string();
    nodes.push(element_node("lb", attrs(&[("lnr", lnr.as_str())]), vec![]));
    nodes.extend(success.words.iter().map(Word::to_xml));
    nodes
}
