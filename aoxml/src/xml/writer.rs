//! XML writer that serializes node trees to text lines.
//!
//! The writer is the inverse of the reader: `read(write(t))` reproduces `t`
//! up to the documented inlining and whitespace normalization. Per-tag
//! configuration controls whether a subtree's children are concatenated
//! onto one line or each emitted as an indented line.

use rustc_hash::FxHashMap;

use crate::node::{ElementNode, XmlNode};

/// Per-tag write options.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeWriteConfig {
    /// Concatenate this element's children onto one line instead of one
    /// indented line per child.
    pub inline_children: bool,
}

/// Mapping from tag name to write options.
#[derive(Debug, Clone, Default)]
pub struct XmlWriteConfig {
    entries: FxHashMap<String, NodeWriteConfig>,
}

impl XmlWriteConfig {
    /// Creates an empty write configuration: every element is block-mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a tag as inline: its children are written onto one line.
    pub fn with_inline_children(mut self, tag_name: &str) -> Self {
        self.entries
            .insert(tag_name.to_string(), NodeWriteConfig { inline_children: true });
        self
    }

    /// Returns the write options for a tag, if any were configured.
    pub fn node_config(&self, tag_name: &str) -> Option<&NodeWriteConfig> {
        self.entries.get(tag_name)
    }

    fn inline_children(&self, tag_name: &str) -> bool {
        self.entries
            .get(tag_name)
            .is_some_and(|config| config.inline_children)
    }
}

/// The write configuration used for TLH manuscript documents.
pub fn tlh_write_config() -> XmlWriteConfig {
    XmlWriteConfig::new()
        .with_inline_children("docID")
        .with_inline_children("AO:TxtPubl")
        .with_inline_children("w")
}

/// Escapes an attribute value.
///
/// The order matters: `&` is handled first, skipping sequences that
/// are already `&amp;`, so the pass is idempotent on escaped input and the
/// entities introduced by the later substitutions are never double-escaped.
pub fn escape_attribute(value: &str) -> String {
    let mut result = String::with_capacity(value.len());

    for (offset, c) in value.char_indices() {
        match c {
            '&' => {
                if value[offset + 1..].starts_with("amp;") {
                    result.push('&');
                } else {
                    result.push_str("&amp;");
                }
            }
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }

    result
}

/// Indents one output line by one nesting level (two spaces).
fn indent(line: &str) -> String {
    format!("  {}", line)
}

/// Serializes a node to a sequence of text lines.
///
/// `parent_inline` is OR'd into the per-tag inline decision: a block
/// ancestor can force a descendant inline, never the reverse.
pub fn write_node(node: &XmlNode, write_config: &XmlWriteConfig, parent_inline: bool) -> Vec<String> {
    match node {
        XmlNode::Comment(comment) => vec![format!("<!-- {} -->", comment.comment)],
        XmlNode::Text(text) => vec![text.text_content.clone()],
        XmlNode::Element(element) => write_element(element, write_config, parent_inline),
    }
}

fn write_element(
    element: &ElementNode,
    write_config: &XmlWriteConfig,
    parent_inline: bool,
) -> Vec<String> {
    let ElementNode {
        tag_name,
        attributes,
        children,
    } = element;

    // Sorted for deterministic output; absent values are skipped entirely.
    let mut attribute_names: Vec<&String> = attributes
        .iter()
        .filter_map(|(name, value)| value.as_ref().map(|_| name))
        .collect();
    attribute_names.sort();

    let written_attributes = attribute_names
        .iter()
        .map(|name| {
            let value = attributes[*name].as_deref().unwrap_or_default();
            format!("{}=\"{}\"", name, escape_attribute(value))
        })
        .collect::<Vec<_>>()
        .join(" ");

    let attribute_part = if written_attributes.is_empty() {
        String::new()
    } else {
        format!(" {}", written_attributes)
    };

    if children.is_empty() {
        return vec![format!("<{}{}/>", tag_name, attribute_part)];
    }

    if children.len() == 1 {
        if let XmlNode::Text(text) = children[0].as_ref() {
            return vec![format!(
                "<{}{}>{}</{}>",
                tag_name, attribute_part, text.text_content, tag_name
            )];
        }
    }

    let inline_children = write_config.inline_children(tag_name) || parent_inline;

    let written_children: Vec<String> = children
        .iter()
        .flat_map(|child| write_node(child, write_config, inline_children))
        .collect();

    let start_tag = format!("<{}{}>", tag_name, attribute_part);
    let end_tag = format!("</{}>", tag_name);

    if inline_children {
        vec![format!("{}{}{}", start_tag, written_children.join(""), end_tag)]
    } else {
        let mut lines = Vec::with_capacity(written_children.len() + 2);
        lines.push(start_tag);
        lines.extend(written_children.iter().map(|line| indent(line)));
        lines.push(end_tag);
        lines
    }
}

/// Serializes a whole document: XML declaration plus the root element.
pub fn write_xml(root: &XmlNode, write_config: &XmlWriteConfig) -> String {
    let mut lines = vec!["<?xml version=\"1.0\" encoding=\"UTF-8\"?>".to_string()];
    lines.extend(write_node(root, write_config, false));
    lines.join("\n")
}
