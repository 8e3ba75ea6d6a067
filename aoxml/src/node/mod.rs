//! Node structures for the XML document tree.
//!
//! A document is a tree of [`XmlNode`] values behind reference-counted
//! handles. Trees are immutable: every edit goes through the patch engine,
//! which rebuilds the ancestors along one path and shares every other
//! subtree with the previous revision.

mod path;

pub use path::{find_first_by_tag_name, get_element_by_path, node_by_path};

use std::rc::Rc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A reference-counted handle to an immutable node.
pub type NodeRef = Rc<XmlNode>;

/// Attribute map of an element.
///
/// A value of `None` means the attribute is *absent*: it is skipped by the
/// writer entirely, never emitted as an empty string.
pub type Attributes = FxHashMap<String, Option<String>>;

/// A node in the document tree: element, text or comment.
///
/// The serde shape matches the historical JSON snapshot format
/// (`{"tagName": …}` / `{"textContent": …}` / `{"comment": …}`), so saved
/// editor states keep loading across versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum XmlNode {
    /// An element with a tag name, attributes and ordered children.
    Element(ElementNode),
    /// A text run.
    Text(TextNode),
    /// A comment.
    Comment(CommentNode),
}

/// An XML element. Child order is document order and semantically
/// significant. Nodes hold no parent back-reference; parent context is
/// always reconstructed from the node path during traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    pub tag_name: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub children: Vec<NodeRef>,
}

/// An XML text run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNode {
    pub text_content: String,
}

/// An XML comment (without the `<!--` / `-->` markers).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentNode {
    pub comment: String,
}

/// Creates an element node.
pub fn element_node(tag_name: &str, attributes: Attributes, children: Vec<NodeRef>) -> NodeRef {
    Rc::new(XmlNode::Element(ElementNode {
        tag_name: tag_name.to_string(),
        attributes,
        children,
    }))
}

/// Creates a text node.
pub fn text_node(text_content: &str) -> NodeRef {
    Rc::new(XmlNode::Text(TextNode {
        text_content: text_content.to_string(),
    }))
}

/// Creates a comment node.
pub fn comment_node(comment: &str) -> NodeRef {
    Rc::new(XmlNode::Comment(CommentNode {
        comment: comment.to_string(),
    }))
}

/// Builds an attribute map from present key/value pairs.
pub fn attrs(pairs: &[(&str, &str)]) -> Attributes {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_string(), Some((*value).to_string())))
        .collect()
}

impl XmlNode {
    /// Returns true if this is an element node.
    pub fn is_element(&self) -> bool {
        matches!(self, XmlNode::Element(_))
    }

    /// Returns true if this is a text node.
    pub fn is_text(&self) -> bool {
        matches!(self, XmlNode::Text(_))
    }

    /// Returns true if this is a comment node.
    pub fn is_comment(&self) -> bool {
        matches!(self, XmlNode::Comment(_))
    }

    /// Returns a reference to the element, if this is an element node.
    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            XmlNode::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Returns a reference to the text, if this is a text node.
    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            XmlNode::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Returns a reference to the comment, if this is a comment node.
    pub fn as_comment(&self) -> Option<&CommentNode> {
        match self {
            XmlNode::Comment(c) => Some(c),
            _ => None,
        }
    }
}

impl ElementNode {
    /// Returns the value of an attribute, if present and not absent.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .and_then(|value| value.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_predicates() {
        let element = element_node("w", Attributes::default(), vec![]);
        let text = text_node("hello");
        let comment = comment_node("a note");

        assert!(element.is_element());
        assert!(!element.is_text());
        assert!(!element.is_comment());

        assert!(text.is_text());
        assert!(comment.is_comment());

        assert!(element.as_element().is_some());
        assert!(element.as_text().is_none());
        assert!(text.as_text().is_some());
        assert!(comment.as_comment().is_some());
    }

    #[test]
    fn test_attribute_access() {
        let mut attributes = attrs(&[("lnr", "1'")]);
        attributes.insert("cu".to_string(), None);

        let node = element_node("lb", attributes, vec![]);
        let element = node.as_element().unwrap();

        assert_eq!(element.attribute("lnr"), Some("1'"));
        // An absent attribute reads the same as a missing one.
        assert_eq!(element.attribute("cu"), None);
        assert_eq!(element.attribute("txtid"), None);
    }

    #[test]
    fn test_snapshot_serde_shape() {
        let node = element_node(
            "w",
            attrs(&[("lg", "Hit")]),
            vec![text_node("ha-an-te")],
        );

        let json = serde_json::to_string(&node).unwrap();
        assert!(json.contains("\"tagName\":\"w\""));
        assert!(json.contains("\"textContent\":\"ha-an-te\""));

        let restored: NodeRef = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, node);
    }

    #[test]
    fn test_comment_serde_round_trip() {
        let node = comment_node("checked by second editor");
        let json = serde_json::to_string(&node).unwrap();
        let restored: NodeRef = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, node);
    }
}
