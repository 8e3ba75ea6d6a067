//! Word content of a transliterated line.
//!
//! A word is a sequence of content pieces: syllabic signs, logograms,
//! determinatives, numerals and gaps. Each piece kind has exactly one XML
//! template; the match in [`WordContent::to_xml`] is exhaustive, so adding
//! a kind forces both a scanner rule and a template arm.

use crate::node::{attrs, element_node, text_node, Attributes, NodeRef};

/// One recognized piece of word content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordContent {
    /// Syllabic sign run, separators included (`ha-an-te`, `-nu`).
    Sign(String),
    /// Sumerian logogram run (`GIŠ`, `DINGIR.MEŠ`).
    Sumerogram(String),
    /// Akkadian logogram run, written `_A-NA` in the input.
    Akkadogram(String),
    /// Semantic classifier, written `{d}` in the input.
    Determinative(String),
    /// Digit run.
    Numeral(String),
    /// Damaged or missing stretch, written `[…]`, `…` or `...`.
    Gap(String),
}

/// One word of a transliterated line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub content: Vec<WordContent>,
}

impl Word {
    pub fn new(content: Vec<WordContent>) -> Self {
        Word { content }
    }

    /// Converts this word to its `<w>` element.
    pub fn to_xml(&self) -> NodeRef {
        let children = self.content.iter().map(WordContent::to_xml).collect();
        element_node("w", Attributes::default(), children)
    }
}

impl WordContent {
    /// Converts this content piece to its XML fragment.
    pub fn to_xml(&self) -> NodeRef {
        match self {
            WordContent::Sign(text) => text_node(text),
            WordContent::Sumerogram(text) => {
                element_node("sGr", Attributes::default(), vec![text_node(text)])
            }
            WordContent::Akkadogram(text) => {
                element_node("aGr", Attributes::default(), vec![text_node(text)])
            }
            WordContent::Determinative(text) => {
                element_node("d", Attributes::default(), vec![text_node(text)])
            }
            WordContent::Numeral(text) => {
                element_node("num", Attributes::default(), vec![text_node(text)])
            }
            WordContent::Gap(text) => element_node("gap", attrs(&[("c", text)]), vec![]),
        }
    }
}

/// Scans one whitespace-delimited word into its content pieces.
///
/// Errors carry a human-readable reason and leave the caller free to keep
/// every word scanned before the failure point.
pub fn scan_word(input: &str) -> Result<Word, String> {
    let mut content = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c == '{' {
            chars.next();
            let mut inner = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(c) => inner.push(c),
                    None => return Err(format!("unclosed determinative in '{}'", input)),
                }
            }
            if inner.is_empty() {
                return Err(format!("empty determinative in '{}'", input));
            }
            content.push(WordContent::Determinative(inner));
        } else if c == '[' {
            chars.next();
            let mut inner = String::new();
            loop {
                match chars.next() {
                    Some(']') => break,
                    Some(c) => inner.push(c),
                    None => return Err(format!("unclosed gap in '{}'", input)),
                }
            }
            content.push(WordContent::Gap(if inner.is_empty() {
                "…".to_string()
            } else {
                inner
            }));
        } else if c == '…' {
            chars.next();
            content.push(WordContent::Gap("…".to_string()));
        } else if c == '.' {
            if peek_run(&mut chars, '.') >= 3 {
                content.push(WordContent::Gap("…".to_string()));
            } else {
                return Err(format!("unexpected character '.' in '{}'", input));
            }
        } else if c == '_' {
            chars.next();
            let run = scan_uppercase_run(&mut chars);
            if run.is_empty() {
                return Err(format!("'_' must start an akkadogram in '{}'", input));
            }
            content.push(WordContent::Akkadogram(run));
        } else if c.is_uppercase() {
            content.push(WordContent::Sumerogram(scan_uppercase_run(&mut chars)));
        } else if c.is_ascii_digit() {
            let mut run = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_digit() {
                    run.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            content.push(WordContent::Numeral(run));
        } else if is_sign_char(c) {
            let mut run = String::new();
            while let Some(&c) = chars.peek() {
                if is_sign_char(c) {
                    run.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            content.push(WordContent::Sign(run));
        } else {
            return Err(format!("unexpected character '{}' in '{}'", c, input));
        }
    }

    if content.is_empty() {
        return Err("empty word".to_string());
    }
    Ok(Word::new(content))
}

/// Consumes a run of the given character and returns its length.
fn peek_run(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, which: char) -> usize {
    let mut count = 0;
    while chars.peek() == Some(&which) {
        chars.next();
        count += 1;
    }
    count
}

/// Scans an uppercase logogram run. A separator (`-` or `.`) stays in the
/// run only while uppercase content follows it, so `GIŠ-nu` stops after
/// `GIŠ` and leaves `-nu` as syllabic text.
fn scan_uppercase_run(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_uppercase() {
            run.push(c);
            chars.next();
        } else if c == '-' || c == '.' {
            let mut lookahead = chars.clone();
            lookahead.next();
            if lookahead.peek().is_some_and(|next| next.is_uppercase()) {
                run.push(c);
                chars.next();
            } else {
                break;
            }
        } else {
            break;
        }
    }
    run
}

/// Characters allowed in a syllabic sign run: lowercase letters with their
/// diacritics, sign separators and clitic boundaries.
fn is_sign_char(c: char) -> bool {
    (c.is_alphabetic() && !c.is_uppercase()) || c == '-' || c == '=' || c == 'ʾ'
}
