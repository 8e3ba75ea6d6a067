//! Per-tag editor capabilities.
//!
//! All node-specific behavior (rendering replacements, structured edit
//! forms, insertion legality, styling, boundary transforms) is driven by a
//! registry from tag name to a record of optional capabilities, instead of
//! per-type code branches. The registry is built once at startup and passed
//! explicitly wherever it is needed; it is read-only thereafter. Tags
//! absent from the registry get the default behavior: children rendered
//! verbatim, no editing, no insertion.

mod tlh;

pub use tlh::{recount_node_numbers, tlh_editor_config};

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use crate::node::{Attributes, ElementNode, NodeRef, XmlNode};
use crate::xml::writer::{write_xml, XmlWriteConfig};

bitflags! {
    /// Display classes a `styling` capability can attach to an element.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NodeStyle: u8 {
        /// Akkadian word written logographically.
        const AKKADOGRAM = 1;
        /// Sumerian word written logographically.
        const SUMEROGRAM = 2;
        /// Semantic classifier sign.
        const DETERMINATIVE = 4;
        /// Editorial correction.
        const CORRECTION = 8;
        /// Damaged or missing text.
        const GAP = 16;
        /// Currently selected in the editor.
        const SELECTED = 32;
    }
}

/// Which side of a two-column comparison a node is rendered on. Single
/// documents render as the left side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Pure function from a node to its display classes.
pub type StylingFn = fn(&ElementNode) -> NodeStyle;

/// Owns the rendering of a tag: receives the node, its already-rendered
/// children, the selection flag and the rendering side, and returns the
/// display fragment. When present, children are not auto-rendered.
pub type ReplaceFn = fn(&ElementNode, &str, bool, Side) -> String;

/// Node-level transform applied at the tree boundary (after read, before
/// write). For every valid node `write(read(n)) == n` must hold.
pub type NodeTransform = fn(&NodeRef) -> NodeRef;

/// Document-level hook run before serialization.
pub type BeforeExportFn = fn(&NodeRef) -> NodeRef;

/// Document-level hook run on the serialized text.
pub type AfterExportFn = fn(String) -> String;

/// Where new instances of a tag may be inserted.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertablePositions {
    /// Tags an instance may be inserted in front of.
    pub before_element: &'static [&'static str],
    /// Parent tags an instance may be appended to.
    pub as_last_child_of: &'static [&'static str],
}

/// One field of a structured edit form, bound to an attribute.
#[derive(Debug, Clone, Copy)]
pub struct FormField {
    pub label: &'static str,
    pub attribute: &'static str,
    /// Submit is rejected while this field is empty.
    pub required: bool,
    /// Surrounding whitespace is stripped on submit.
    pub trim: bool,
}

impl FormField {
    pub const fn new(label: &'static str, attribute: &'static str) -> Self {
        FormField {
            label,
            attribute,
            required: false,
            trim: false,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn trimmed(mut self) -> Self {
        self.trim = true;
        self
    }
}

/// Form descriptor for structured editing of a tag's attributes.
#[derive(Debug, Clone)]
pub struct EditFormSpec {
    pub fields: &'static [FormField],
}

/// Capability record for one tag name. Every field is optional; the empty
/// record is the default behavior.
#[derive(Debug, Clone, Default)]
pub struct XmlNodeConfig {
    pub styling: Option<StylingFn>,
    pub replace: Option<ReplaceFn>,
    pub edit: Option<EditFormSpec>,
    pub insertable_positions: Option<InsertablePositions>,
    pub read_node: Option<NodeTransform>,
    pub write_node: Option<NodeTransform>,
    /// The sole child of this tag may not be deleted.
    pub requires_content: bool,
}

/// The process-wide editor configuration: tag registry, write config and
/// export hooks. Constructed once, then passed explicitly (no ambient
/// global).
#[derive(Debug, Clone)]
pub struct XmlEditorConfig {
    node_configs: FxHashMap<String, XmlNodeConfig>,
    write_config: XmlWriteConfig,
    before_export: Option<BeforeExportFn>,
    after_export: Option<AfterExportFn>,
}

impl XmlEditorConfig {
    /// Creates a configuration with an empty registry.
    pub fn new(write_config: XmlWriteConfig) -> Self {
        XmlEditorConfig {
            node_configs: FxHashMap::default(),
            write_config,
            before_export: None,
            after_export: None,
        }
    }

    /// Registers the capability record for a tag.
    pub fn with_node_config(mut self, tag_name: &str, config: XmlNodeConfig) -> Self {
        self.node_configs.insert(tag_name.to_string(), config);
        self
    }

    /// Sets the pre-serialization document hook.
    pub fn with_before_export(mut self, hook: BeforeExportFn) -> Self {
        self.before_export = Some(hook);
        self
    }

    /// Sets the post-serialization text hook.
    pub fn with_after_export(mut self, hook: AfterExportFn) -> Self {
        self.after_export = Some(hook);
        self
    }

    /// Returns the capability record for a tag, if one is registered.
    pub fn node_config(&self, tag_name: &str) -> Option<&XmlNodeConfig> {
        self.node_configs.get(tag_name)
    }

    /// Returns the write configuration.
    pub fn write_config(&self) -> &XmlWriteConfig {
        &self.write_config
    }

    /// Returns true if the tag has a structured edit form.
    pub fn can_edit(&self, tag_name: &str) -> bool {
        self.node_config(tag_name)
            .is_some_and(|config| config.edit.is_some())
    }

    /// Returns the display classes for an element (empty for unstyled tags).
    pub fn style_of(&self, element: &ElementNode) -> NodeStyle {
        self.node_config(&element.tag_name)
            .and_then(|config| config.styling)
            .map(|styling| styling(element))
            .unwrap_or(NodeStyle::empty())
    }

    /// Applies the registered `read_node` transforms over a whole tree.
    /// Used once at the tree boundary, right after parsing.
    pub fn read_tree(&self, node: &NodeRef) -> NodeRef {
        self.transform_tree(node, |config| config.read_node)
    }

    /// Applies the registered `write_node` transforms over a whole tree,
    /// the inverse boundary of [`XmlEditorConfig::read_tree`].
    pub fn write_tree(&self, node: &NodeRef) -> NodeRef {
        self.transform_tree(node, |config| config.write_node)
    }

    fn transform_tree(
        &self,
        node: &NodeRef,
        pick: fn(&XmlNodeConfig) -> Option<NodeTransform>,
    ) -> NodeRef {
        let transformed = match node.as_element().and_then(|element| {
            self.node_config(&element.tag_name).and_then(pick)
        }) {
            Some(transform) => transform(node),
            None => node.clone(),
        };

        let Some(element) = transformed.as_element() else {
            return transformed;
        };

        let children: Vec<NodeRef> = element
            .children
            .iter()
            .map(|child| self.transform_tree(child, pick))
            .collect();

        crate::node::element_node(&element.tag_name, element.attributes.clone(), children)
    }

    /// Serializes a document for persistence or export, running the
    /// document hooks and the boundary write transforms.
    pub fn export_document(&self, root: &NodeRef) -> String {
        let prepared = match self.before_export {
            Some(hook) => hook(root),
            None => root.clone(),
        };
        let prepared = self.write_tree(&prepared);

        let exported = write_xml(&prepared, &self.write_config);

        match self.after_export {
            Some(hook) => hook(exported),
            None => exported,
        }
    }
}

/// Renders a node to its display text using the registry: `replace`
/// capabilities own their tag's rendering, everything else renders its
/// children verbatim in document order.
pub fn render_node(
    config: &XmlEditorConfig,
    node: &XmlNode,
    path: &[usize],
    selected_path: Option<&[usize]>,
    side: Side,
) -> String {
    match node {
        XmlNode::Text(text) => text.text_content.clone(),
        XmlNode::Comment(_) => String::new(),
        XmlNode::Element(element) => {
            let mut child_path = path.to_vec();
            let rendered_children: String = element
                .children
                .iter()
                .enumerate()
                .map(|(index, child)| {
                    child_path.push(index);
                    let rendered = render_node(config, child, &child_path, selected_path, side);
                    child_path.pop();
                    rendered
                })
                .collect();

            let is_selected = selected_path == Some(path);
            match config.node_config(&element.tag_name).and_then(|c| c.replace) {
                Some(replace) => replace(element, &rendered_children, is_selected, side),
                None => rendered_children,
            }
        }
    }
}

/// Validated form values, ready to become a `SetAttributes` patch.
///
/// Empty values become absent attributes, so clearing a form field removes
/// the attribute instead of writing `attr=""`.
pub fn collect_form_attributes(
    spec: &EditFormSpec,
    values: &[(&str, String)],
) -> crate::error::Result<Attributes> {
    let mut attributes = Attributes::default();

    for field in spec.fields {
        let raw = values
            .iter()
            .find(|(attribute, _)| *attribute == field.attribute)
            .map(|(_, value)| value.as_str())
            .unwrap_or_default();

        let value = if field.trim { raw.trim() } else { raw };

        if value.is_empty() {
            if field.required {
                return Err(crate::error::Error::InvalidMutation(format!(
                    "field '{}' must not be empty",
                    field.label
                )));
            }
            attributes.insert(field.attribute.to_string(), None);
        } else {
            attributes.insert(field.attribute.to_string(), Some(value.to_string()));
        }
    }

    Ok(attributes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{attrs, element_node, text_node, Attributes};

    #[test]
    fn test_default_behavior_for_unknown_tags() {
        let config = XmlEditorConfig::new(XmlWriteConfig::new());
        let node = element_node("unknown", Attributes::default(), vec![text_node("inner")]);

        assert!(config.node_config("unknown").is_none());
        assert!(!config.can_edit("unknown"));
        assert_eq!(render_node(&config, &node, &[], None, Side::Left), "inner");
        assert_eq!(
            config.style_of(node.as_element().unwrap()),
            NodeStyle::empty()
        );
    }

    #[test]
    fn test_replace_owns_rendering() {
        fn bracket(_: &ElementNode, _children: &str, _: bool, _: Side) -> String {
            "[".to_string()
        }

        let config = XmlEditorConfig::new(XmlWriteConfig::new()).with_node_config(
            "del_in",
            XmlNodeConfig {
                replace: Some(bracket),
                ..Default::default()
            },
        );

        // Children exist but the replacement suppresses them.
        let node = element_node("del_in", Attributes::default(), vec![text_node("zzz")]);
        assert_eq!(render_node(&config, &node, &[], None, Side::Left), "[");
    }

    #[test]
    fn test_collect_form_attributes_trims_and_validates() {
        const SPEC: EditFormSpec = EditFormSpec {
            fields: &[FormField::new("content", "c").required().trimmed()],
        };

        let values = vec![("c", "  1' ".to_string())];
        let attributes = collect_form_attributes(&SPEC, &values).unwrap();
        assert_eq!(attributes.get("c"), Some(&Some("1'".to_string())));

        let missing = collect_form_attributes(&SPEC, &[]);
        assert!(missing.is_err());
    }

    #[test]
    fn test_collect_form_attributes_clears_optional_fields() {
        const SPEC: EditFormSpec = EditFormSpec {
            fields: &[
                FormField::new("content", "c").required(),
                FormField::new("cuneiform", "cu"),
            ],
        };

        let attributes =
            collect_form_attributes(&SPEC, &[("c", "…".to_string()), ("cu", String::new())])
                .unwrap();

        assert_eq!(attributes.get("c"), Some(&Some("…".to_string())));
        // Cleared optional field becomes absent, not empty.
        assert_eq!(attributes.get("cu"), Some(&None));
    }

    #[test]
    fn test_read_write_tree_round_trip() {
        fn mark(node: &NodeRef) -> NodeRef {
            let element = node.as_element().unwrap();
            let mut attributes = element.attributes.clone();
            attributes.insert("t".to_string(), Some("line".to_string()));
            element_node(&element.tag_name, attributes, element.children.clone())
        }
        fn unmark(node: &NodeRef) -> NodeRef {
            let element = node.as_element().unwrap();
            let mut attributes = element.attributes.clone();
            attributes.remove("t");
            element_node(&element.tag_name, attributes, element.children.clone())
        }

        let config = XmlEditorConfig::new(XmlWriteConfig::new()).with_node_config(
            "gap",
            XmlNodeConfig {
                read_node: Some(mark),
                write_node: Some(unmark),
                ..Default::default()
            },
        );

        let tree = element_node(
            "text",
            Attributes::default(),
            vec![element_node("gap", attrs(&[("c", "…")]), vec![])],
        );

        let read = config.read_tree(&tree);
        let gap = read.as_element().unwrap().children[0].as_element().unwrap();
        assert_eq!(gap.attribute("t"), Some("line"));

        // write(read(n)) == n
        assert_eq!(config.write_tree(&read), tree);
    }
}
