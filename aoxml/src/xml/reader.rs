//! XML parser that builds node trees.
//!
//! Built on quick-xml's streaming API. Text runs are accumulated across
//! events and whitespace-normalized: runs of whitespace collapse to one
//! space and whitespace-only runs are dropped, so formatting newlines and
//! indentation never become text nodes.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::node::{comment_node, text_node, Attributes, ElementNode, NodeRef, XmlNode};

/// An element still under construction while its end tag is pending.
struct OpenElement {
    tag_name: String,
    attributes: Attributes,
    children: Vec<NodeRef>,
}

impl OpenElement {
    fn into_node(self) -> NodeRef {
        std::rc::Rc::new(XmlNode::Element(ElementNode {
            tag_name: self.tag_name,
            attributes: self.attributes,
            children: self.children,
        }))
    }
}

/// Parses an XML document from a string and returns its document element.
pub fn parse_str(xml: &str) -> Result<NodeRef> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    configure(&mut reader);
    parse_reader(&mut reader)
}

/// Parses an XML document from a file and returns its document element.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<NodeRef> {
    let file = File::open(path)?;
    let mut reader = Reader::from_reader(BufReader::new(file));
    configure(&mut reader);
    parse_reader(&mut reader)
}

fn configure<R>(reader: &mut Reader<R>) {
    // Don't trim text - whitespace normalization happens here.
    reader.config_mut().trim_text_start = false;
    reader.config_mut().trim_text_end = false;
}

fn parse_reader<R: BufRead>(reader: &mut Reader<R>) -> Result<NodeRef> {
    // Synthetic root that collects top-level nodes; only the first element
    // child leaves this function.
    let mut stack: Vec<OpenElement> = vec![OpenElement {
        tag_name: String::new(),
        attributes: Attributes::default(),
        children: Vec::new(),
    }];
    let mut current_text: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                flush_text(&mut stack, &mut current_text);
                let (tag_name, attributes) = parse_element(e, reader)?;
                stack.push(OpenElement {
                    tag_name,
                    attributes,
                    children: Vec::new(),
                });
            }
            Ok(Event::End(_)) => {
                flush_text(&mut stack, &mut current_text);
                let finished = stack
                    .pop()
                    .ok_or_else(|| Error::Parse("unbalanced end tag".to_string()))?;
                let parent = stack
                    .last_mut()
                    .ok_or_else(|| Error::Parse("end tag closed the document root".to_string()))?;
                parent.children.push(finished.into_node());
            }
            Ok(Event::Empty(ref e)) => {
                flush_text(&mut stack, &mut current_text);
                let (tag_name, attributes) = parse_element(e, reader)?;
                let node = OpenElement {
                    tag_name,
                    attributes,
                    children: Vec::new(),
                }
                .into_node();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(node);
                }
            }
            Ok(Event::Text(e)) => {
                let raw =
                    std::str::from_utf8(e.as_ref()).map_err(|e| Error::Parse(e.to_string()))?;
                let unescaped = unescape(raw).map_err(|e| Error::Parse(e.to_string()))?;
                accumulate_text(&mut current_text, &unescaped);
            }
            Ok(Event::CData(ref e)) => {
                let raw = String::from_utf8_lossy(e.as_ref());
                accumulate_text(&mut current_text, &raw);
            }
            Ok(Event::Comment(ref e)) => {
                flush_text(&mut stack, &mut current_text);
                let comment_text = String::from_utf8_lossy(e.as_ref()).trim().to_string();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(comment_node(&comment_text));
                }
            }
            Ok(Event::Eof) => break,
            // XML declaration, processing instructions, DOCTYPE and entity
            // references carry no document content here.
            Ok(_) => {}
            Err(e) => return Err(Error::Parse(format!("XML parse error: {}", e))),
        }
        buf.clear();
    }

    let top_level = stack
        .pop()
        .ok_or_else(|| Error::Parse("empty document".to_string()))?;
    if !stack.is_empty() {
        return Err(Error::Parse("unclosed element at end of document".to_string()));
    }

    top_level
        .children
        .into_iter()
        .find(|node| node.is_element())
        .ok_or_else(|| Error::Parse("document contains no element".to_string()))
}

/// Flushes accumulated text into the current parent, dropping
/// whitespace-only runs and trimming edge whitespace.
fn flush_text(stack: &mut [OpenElement], current_text: &mut Option<String>) {
    if let Some(text) = current_text.take() {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            if let Some(parent) = stack.last_mut() {
                parent.children.push(text_node(trimmed));
            }
        }
    }
}

/// Appends one raw text event to the pending run, collapsing whitespace.
fn accumulate_text(current_text: &mut Option<String>, raw: &str) {
    let last_was_ws = current_text
        .as_deref()
        .is_none_or(|existing| existing.ends_with(' '));

    if let Some(normalized) = normalize_whitespace(raw, last_was_ws) {
        match current_text {
            Some(existing) => existing.push_str(&normalized),
            None => *current_text = Some(normalized),
        }
    }
}

/// Collapses consecutive whitespace to a single space.
///
/// Returns `None` when the input holds no non-whitespace content at all, so
/// indentation-only runs never produce text nodes.
fn normalize_whitespace(text: &str, mut last_was_ws: bool) -> Option<String> {
    let mut has_non_ws = false;
    let mut result = String::new();

    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_ws {
                result.push(' ');
                last_was_ws = true;
            }
        } else {
            result.push(c);
            last_was_ws = false;
            has_non_ws = true;
        }
    }

    has_non_ws.then_some(result)
}

fn parse_element<R>(e: &BytesStart, reader: &Reader<R>) -> Result<(String, Attributes)> {
    let tag_name = reader
        .decoder()
        .decode(e.name().as_ref())
        .map_err(|e| Error::Parse(e.to_string()))?
        .to_string();

    let mut attributes = Attributes::default();
    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| Error::Parse(format!("Attribute error: {}", e)))?;
        let key = reader
            .decoder()
            .decode(attr.key.as_ref())
            .map_err(|e| Error::Parse(e.to_string()))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Parse(e.to_string()))?
            .to_string();
        attributes.insert(key, Some(value));
    }

    Ok((tag_name, attributes))
}
