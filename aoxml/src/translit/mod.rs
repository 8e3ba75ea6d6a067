//! Transliteration parsing and XML conversion.
//!
//! Free-text transliteration lines become structured line/word nodes. Every
//! line is parsed independently: a malformed line yields an error variant
//! carrying its raw input for manual correction and never prevents parsing
//! of the other lines.

pub mod line;
pub mod word;

pub use line::{
    parse_transliteration, parse_transliteration_line, write_line_parse_success_to_xml,
    LineNumber, LineParseResult, LineParseSuccess,
};
pub use word::{Word, WordContent};
