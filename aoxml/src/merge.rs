//! Document merging by line alignment.
//!
//! Two independently transcribed passes of the same physical side are
//! aligned by line number into merge lines for side-by-side review and
//! combined export. Alignment is a merge-join over two sequences that are
//! already sorted by line number; a regressing line number is an input
//! error, not something to silently reorder.

use crate::error::{Error, Result};
use crate::node::{
    attrs, element_node, find_first_by_tag_name, text_node, Attributes, NodeRef,
};

/// One line of a parsed document: its `<lb/>` node and the content nodes
/// up to the next line break.
#[derive(Debug, Clone)]
pub struct DocumentLine {
    /// Numeric alignment key: the leading integer of the `lnr` attribute
    /// (`12'` and `12` are the same physical line).
    pub line_number: u32,
    pub line_number_node: NodeRef,
    pub rest: Vec<NodeRef>,
}

/// One aligned output row combining content from one or both inputs.
/// Never mutated after creation.
#[derive(Debug, Clone)]
pub struct MergeLine {
    pub line_number_node: NodeRef,
    pub rest: Vec<NodeRef>,
}

/// A publication reference carried into the merged document header block.
#[derive(Debug, Clone)]
pub struct Publication {
    /// The manuscript's numbering within the merged edition.
    pub number: String,
    /// The publication text (e.g. `KBo 1.1`).
    pub text: String,
}

/// Splits a parsed document into its lines.
///
/// Content is taken from the first `<text>` element (the transliteration
/// body), or from the root itself when no `<text>` wrapper exists. Nodes
/// before the first `<lb/>` belong to no line and are skipped.
pub fn collect_document_lines(root: &NodeRef) -> Result<Vec<DocumentLine>> {
    let body = find_first_by_tag_name(root, "text")
        .or_else(|| root.as_element())
        .ok_or_else(|| Error::Parse("document root is not an element".to_string()))?;

    let mut lines: Vec<DocumentLine> = Vec::new();

    for child in &body.children {
        match child.as_element() {
            Some(element) if element.tag_name == "lb" => {
                let lnr = element.attribute("lnr").unwrap_or_default();
                let line_number = leading_number(lnr).ok_or_else(|| {
                    Error::Parse(format!("<lb> without a numeric lnr: '{}'", lnr))
                })?;
                lines.push(DocumentLine {
                    line_number,
                    line_number_node: child.clone(),
                    rest: Vec::new(),
                });
            }
            _ => {
                if let Some(current) = lines.last_mut() {
                    current.rest.push(child.clone());
                }
            }
        }
    }

    Ok(lines)
}

fn leading_number(value: &str) -> Option<u32> {
    let digits: String = value
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Aligns two pre-sorted line sequences into merge lines.
///
/// Lines sharing a line number become one two-sided [`MergeLine`] (left
/// content first); a number present on one side only becomes a single-sided
/// line. The output preserves the union of line numbers in ascending order
/// with no duplication or loss of source content.
pub fn align_lines(left: &[DocumentLine], right: &[DocumentLine]) -> Result<Vec<MergeLine>> {
    check_sorted(left, "left")?;
    check_sorted(right, "right")?;

    let mut merged = Vec::with_capacity(left.len().max(right.len()));
    let mut left_iter = left.iter().peekable();
    let mut right_iter = right.iter().peekable();

    loop {
        match (left_iter.peek(), right_iter.peek()) {
            (Some(l), Some(r)) if l.line_number == r.line_number => {
                let l = left_iter.next().expect("peeked");
                let r = right_iter.next().expect("peeked");
                let mut rest = l.rest.clone();
                rest.extend(r.rest.iter().cloned());
                merged.push(MergeLine {
                    line_number_node: l.line_number_node.clone(),
                    rest,
                });
            }
            (Some(l), Some(r)) if l.line_number < r.line_number => {
                let l = left_iter.next().expect("peeked");
                merged.push(single_sided(l));
            }
            (Some(_), Some(_)) | (None, Some(_)) => {
                let r = right_iter.next().expect("peeked");
                merged.push(single_sided(r));
            }
            (Some(_), None) => {
                let l = left_iter.next().expect("peeked");
                merged.push(single_sided(l));
            }
            (None, None) => break,
        }
    }

    Ok(merged)
}

fn single_sided(line: &DocumentLine) -> MergeLine {
    MergeLine {
        line_number_node: line.line_number_node.clone(),
        rest: line.rest.clone(),
    }
}

fn check_sorted(lines: &[DocumentLine], which: &str) -> Result<()> {
    for pair in lines.windows(2) {
        if pair[1].line_number < pair[0].line_number {
            return Err(Error::UnorderedInput(format!(
                "{} sequence regresses from line {} to {}",
                which, pair[0].line_number, pair[1].line_number
            )));
        }
    }
    Ok(())
}

/// The namespace declarations carried by every exported `AOxml` root.
const AOXML_NAMESPACES: &[(&str, &str)] = &[
    ("xmlns:hpm", "http://hethiter.net/ns/hpm/1.0"),
    ("xmlns:AO", "http://hethiter.net/ns/AO/1.0"),
    ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
    ("xmlns:meta", "urn:oasis:names:tc:opendocument:xmlns:meta:1.0"),
    ("xmlns:text", "urn:oasis:names:tc:opendocument:xmlns:text:1.0"),
    ("xmlns:table", "urn:oasis:names:tc:opendocument:xmlns:table:1.0"),
    ("xmlns:draw", "urn:oasis:names:tc:opendocument:xmlns:drawing:1.0"),
    ("xmlns:xlink", "http://www.w3.org/1999/xlink"),
];

/// Builds the publication block heading a merged document: one
/// `<AO:TxtPubl>` per source, joined by `+` text nodes, each entry written
/// as `publication{€number}` with layout whitespace stripped.
fn publication_block(publications: &[Publication]) -> NodeRef {
    let mut children: Vec<NodeRef> = Vec::new();

    for (index, publication) in publications.iter().enumerate() {
        if index > 0 {
            children.push(text_node("+"));
        }
        let entry = format!("{}{{€{}}}", publication.text, publication.number)
            .replace('\n', "")
            .replace('\t', "");
        children.push(element_node(
            "AO:TxtPubl",
            Attributes::default(),
            vec![text_node(&entry)],
        ));
    }

    element_node("AO:Manuscripts", Attributes::default(), children)
}

/// Wraps merged lines into the fixed export document shape:
/// `AOxml` (namespaced root) → header, then
/// `body → div1[type=transliteration] → text[xml:lang]` holding the
/// publication block and every merge line's nodes in order.
pub fn export_merged_document(
    lines: &[MergeLine],
    header: &NodeRef,
    publications: &[Publication],
    language: &str,
) -> NodeRef {
    let mut content: Vec<NodeRef> = vec![publication_block(publications)];
    for line in lines {
        content.push(line.line_number_node.clone());
        content.extend(line.rest.iter().cloned());
    }

    let text = element_node("text", attrs(&[("xml:lang", language)]), content);
    let div1 = element_node("div1", attrs(&[("type", "transliteration")]), vec![text]);
    let body = element_node("body", Attributes::default(), vec![div1]);

    element_node(
        "AOxml",
        attrs(AOXML_NAMESPACES),
        vec![header.clone(), body],
    )
}

/// Derives the merged document's filename from the header's `docID` text,
/// falling back to `merged`.
pub fn merged_filename(header: &NodeRef) -> String {
    find_first_by_tag_name(header, "docID")
        .and_then(|doc_id| doc_id.children.first())
        .and_then(|child| child.as_text())
        .map(|text| text.text_content.clone())
        .unwrap_or_else(|| "merged".to_string())
}
