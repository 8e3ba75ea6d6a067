//! The TLH manuscript editor configuration.
//!
//! Capability records for the TLH tag vocabulary: line breaks, words and
//! their logographic content, damage markers, editorial apparatus. Built
//! once by [`tlh_editor_config`] and passed around explicitly.

use crate::config::{
    EditFormSpec, FormField, InsertablePositions, NodeStyle, Side, XmlEditorConfig, XmlNodeConfig,
};
use crate::node::{element_node, ElementNode, NodeRef};
use crate::xml::writer::tlh_write_config;

const LINE_BREAK_FORM: EditFormSpec = EditFormSpec {
    fields: &[
        FormField::new("textId", "txtid"),
        FormField::new("lineNumber", "lnr").required().trimmed(),
        FormField::new("language", "lg"),
        FormField::new("cuneiform", "cu"),
    ],
};

const GAP_FORM: EditFormSpec = EditFormSpec {
    fields: &[FormField::new("content", "c").required()],
};

const WORD_FORM: EditFormSpec = EditFormSpec {
    fields: &[
        FormField::new("language", "lg"),
        FormField::new("morphologySelection", "mrp0sel"),
    ],
};

const COLUMN_BREAK_FORM: EditFormSpec = EditFormSpec {
    fields: &[FormField::new("number", "nr").required().trimmed()],
};

const NOTE_FORM: EditFormSpec = EditFormSpec {
    fields: &[
        FormField::new("number", "n"),
        FormField::new("content", "c").required(),
    ],
};

fn is_line_gap(element: &ElementNode) -> bool {
    element.attribute("t") == Some("line")
}

fn render_hidden(_: &ElementNode, _: &str, _: bool, _: Side) -> String {
    String::new()
}

fn render_paragraph_number(element: &ElementNode, _: &str, _: bool, _: Side) -> String {
    format!("\n{}\n", element.attribute("c").unwrap_or_default())
}

fn render_line_break(element: &ElementNode, _: &str, _: bool, side: Side) -> String {
    let prefix = if side == Side::Left { "\n" } else { "" };
    format!("{}{}:  ", prefix, element.attribute("lnr").unwrap_or_default())
}

fn render_word(_: &ElementNode, rendered_children: &str, _: bool, _: Side) -> String {
    format!("{} ", rendered_children)
}

fn render_gap(element: &ElementNode, _: &str, _: bool, _: Side) -> String {
    let prefix = if is_line_gap(element) { "\n" } else { "" };
    format!("{}{}", prefix, element.attribute("c").unwrap_or_default())
}

fn render_deletion_start(_: &ElementNode, _: &str, _: bool, _: Side) -> String {
    "[".to_string()
}

fn render_deletion_end(_: &ElementNode, _: &str, _: bool, _: Side) -> String {
    "]".to_string()
}

fn render_erasure(_: &ElementNode, _: &str, _: bool, _: Side) -> String {
    "*".to_string()
}

fn render_damage_start(_: &ElementNode, _: &str, _: bool, _: Side) -> String {
    "⸢".to_string()
}

fn render_damage_end(_: &ElementNode, _: &str, _: bool, _: Side) -> String {
    "⸣".to_string()
}

fn render_subscript(element: &ElementNode, _: &str, _: bool, _: Side) -> String {
    element.attribute("c").unwrap_or_default().to_string()
}

fn render_space(element: &ElementNode, _: &str, _: bool, _: Side) -> String {
    let count = element
        .attribute("c")
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(0);
    " ".repeat(count)
}

fn render_paragraph_separator(_: &ElementNode, _: &str, _: bool, _: Side) -> String {
    "\n§\n".to_string()
}

fn render_double_paragraph_separator(_: &ElementNode, _: &str, _: bool, _: Side) -> String {
    "\n§§\n".to_string()
}

fn render_correction(element: &ElementNode, _: &str, _: bool, _: Side) -> String {
    element.attribute("c").unwrap_or_default().to_string()
}

fn style_akkadogram(_: &ElementNode) -> NodeStyle {
    NodeStyle::AKKADOGRAM
}

fn style_sumerogram(_: &ElementNode) -> NodeStyle {
    NodeStyle::SUMEROGRAM
}

fn style_determinative(_: &ElementNode) -> NodeStyle {
    NodeStyle::DETERMINATIVE
}

fn style_correction(_: &ElementNode) -> NodeStyle {
    NodeStyle::CORRECTION
}

fn style_gap(_: &ElementNode) -> NodeStyle {
    NodeStyle::GAP
}

fn identity_transform(node: &NodeRef) -> NodeRef {
    node.clone()
}

/// Renumbers all elements with the given tag, depth-first, writing the
/// running count (starting at 1) into the given attribute. Returns the
/// rebuilt tree.
pub fn recount_node_numbers(root: &NodeRef, tag_name: &str, attribute: &str) -> NodeRef {
    fn walk(node: &NodeRef, tag_name: &str, attribute: &str, counter: &mut usize) -> NodeRef {
        let Some(element) = node.as_element() else {
            return node.clone();
        };

        let mut attributes = element.attributes.clone();
        if element.tag_name == tag_name {
            *counter += 1;
            attributes.insert(attribute.to_string(), Some(counter.to_string()));
        }

        let children = element
            .children
            .iter()
            .map(|child| walk(child, tag_name, attribute, counter))
            .collect();

        element_node(&element.tag_name, attributes, children)
    }

    let mut counter = 0;
    walk(root, tag_name, attribute, &mut counter)
}

fn tlh_before_export(root: &NodeRef) -> NodeRef {
    let root = recount_node_numbers(root, "note", "n");
    recount_node_numbers(&root, "clb", "nr")
}

/// The fixed text substitutions applied to exported TLH documents so the
/// output matches the layout external consumers expect.
fn tlh_after_export(exported: String) -> String {
    exported
        .replace('®', "\n\t")
        .replace('{', "\n\t\t{")
        .replace("+=", "\n\t\t   += ")
        .replace("<w", "\n <w")
        .replace("<lb", "\n\n<lb")
        .replace(" mrp", "\n\tmrp")
        .replace('@', " @ ")
}

/// Builds the editor configuration for TLH manuscript documents.
pub fn tlh_editor_config() -> XmlEditorConfig {
    XmlEditorConfig::new(tlh_write_config())
        .with_node_config(
            "docID",
            XmlNodeConfig {
                replace: Some(render_hidden),
                ..Default::default()
            },
        )
        .with_node_config(
            "AO:ParagrNr",
            XmlNodeConfig {
                replace: Some(render_paragraph_number),
                ..Default::default()
            },
        )
        .with_node_config(
            "lb",
            XmlNodeConfig {
                replace: Some(render_line_break),
                edit: Some(LINE_BREAK_FORM),
                insertable_positions: Some(InsertablePositions {
                    before_element: &["lb", "w", "gap"],
                    as_last_child_of: &["div1"],
                }),
                ..Default::default()
            },
        )
        .with_node_config(
            "clb",
            XmlNodeConfig {
                edit: Some(COLUMN_BREAK_FORM),
                ..Default::default()
            },
        )
        .with_node_config(
            "cl",
            XmlNodeConfig {
                requires_content: true,
                ..Default::default()
            },
        )
        .with_node_config(
            "w",
            XmlNodeConfig {
                replace: Some(render_word),
                edit: Some(WORD_FORM),
                insertable_positions: Some(InsertablePositions {
                    before_element: &["w", "gap"],
                    as_last_child_of: &["div1"],
                }),
                requires_content: true,
                ..Default::default()
            },
        )
        .with_node_config(
            "aGr",
            XmlNodeConfig {
                styling: Some(style_akkadogram),
                ..Default::default()
            },
        )
        .with_node_config(
            "sGr",
            XmlNodeConfig {
                styling: Some(style_sumerogram),
                ..Default::default()
            },
        )
        .with_node_config(
            "d",
            XmlNodeConfig {
                styling: Some(style_determinative),
                ..Default::default()
            },
        )
        .with_node_config(
            "del_in",
            XmlNodeConfig {
                replace: Some(render_deletion_start),
                ..Default::default()
            },
        )
        .with_node_config(
            "del_fin",
            XmlNodeConfig {
                replace: Some(render_deletion_end),
                ..Default::default()
            },
        )
        .with_node_config(
            "ras_in",
            XmlNodeConfig {
                replace: Some(render_erasure),
                ..Default::default()
            },
        )
        .with_node_config(
            "ras_fin",
            XmlNodeConfig {
                replace: Some(render_erasure),
                ..Default::default()
            },
        )
        .with_node_config(
            "laes_in",
            XmlNodeConfig {
                replace: Some(render_damage_start),
                ..Default::default()
            },
        )
        .with_node_config(
            "laes_fin",
            XmlNodeConfig {
                replace: Some(render_damage_end),
                ..Default::default()
            },
        )
        .with_node_config(
            "gap",
            XmlNodeConfig {
                styling: Some(style_gap),
                replace: Some(render_gap),
                edit: Some(GAP_FORM),
                insertable_positions: Some(InsertablePositions {
                    before_element: &["w", "lb", "gap"],
                    as_last_child_of: &["div1"],
                }),
                read_node: Some(identity_transform),
                write_node: Some(identity_transform),
                ..Default::default()
            },
        )
        .with_node_config(
            "subscr",
            XmlNodeConfig {
                replace: Some(render_subscript),
                ..Default::default()
            },
        )
        .with_node_config(
            "space",
            XmlNodeConfig {
                replace: Some(render_space),
                ..Default::default()
            },
        )
        .with_node_config(
            "parsep",
            XmlNodeConfig {
                replace: Some(render_paragraph_separator),
                ..Default::default()
            },
        )
        .with_node_config(
            "parsep_dbl",
            XmlNodeConfig {
                replace: Some(render_double_paragraph_separator),
                ..Default::default()
            },
        )
        .with_node_config(
            "corr",
            XmlNodeConfig {
                styling: Some(style_correction),
                replace: Some(render_correction),
                ..Default::default()
            },
        )
        .with_node_config(
            "note",
            XmlNodeConfig {
                edit: Some(NOTE_FORM),
                ..Default::default()
            },
        )
        .with_before_export(tlh_before_export)
        .with_after_export(tlh_after_export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::render_node;
    use crate::node::{attrs, text_node, Attributes};

    #[test]
    fn test_registry_capabilities() {
        let config = tlh_editor_config();

        assert!(config.can_edit("lb"));
        assert!(config.can_edit("gap"));
        assert!(!config.can_edit("sGr"));
        assert!(!config.can_edit("del_in"));

        let positions = config
            .node_config("lb")
            .and_then(|c| c.insertable_positions)
            .unwrap();
        assert!(positions.before_element.contains(&"gap"));
        assert!(positions.as_last_child_of.contains(&"div1"));
    }

    #[test]
    fn test_styling_classes() {
        let config = tlh_editor_config();
        let sumerogram = element_node("sGr", Attributes::default(), vec![text_node("GIŠ")]);
        let determinative = element_node("d", Attributes::default(), vec![text_node("m")]);

        assert_eq!(
            config.style_of(sumerogram.as_element().unwrap()),
            NodeStyle::SUMEROGRAM
        );
        assert_eq!(
            config.style_of(determinative.as_element().unwrap()),
            NodeStyle::DETERMINATIVE
        );
    }

    #[test]
    fn test_render_line_with_damage_markers() {
        let config = tlh_editor_config();
        let line = element_node(
            "div1",
            Attributes::default(),
            vec![
                element_node("lb", attrs(&[("lnr", "1'")]), vec![]),
                element_node(
                    "w",
                    Attributes::default(),
                    vec![
                        element_node("laes_in", Attributes::default(), vec![]),
                        text_node("ha-an"),
                        element_node("laes_fin", Attributes::default(), vec![]),
                    ],
                ),
            ],
        );

        assert_eq!(
            render_node(&config, &line, &[], None, Side::Left),
            "\n1':  ⸢ha-an⸣ "
        );
    }

    #[test]
    fn test_docid_hidden_in_display() {
        let config = tlh_editor_config();
        let doc_id = element_node("docID", Attributes::default(), vec![text_node("KBo 1.1")]);
        assert_eq!(render_node(&config, &doc_id, &[], None, Side::Left), "");
    }

    #[test]
    fn test_space_renders_count() {
        let config = tlh_editor_config();
        let space = element_node("space", attrs(&[("c", "3")]), vec![]);
        assert_eq!(render_node(&config, &space, &[], None, Side::Left), "   ");
    }

    #[test]
    fn test_recount_node_numbers_depth_first() {
        let root = element_node(
            "text",
            Attributes::default(),
            vec![
                element_node("note", attrs(&[("n", "9"), ("c", "first")]), vec![]),
                element_node(
                    "w",
                    Attributes::default(),
                    vec![element_node("note", attrs(&[("c", "nested")]), vec![])],
                ),
                element_node("note", attrs(&[("c", "last")]), vec![]),
            ],
        );

        let recounted = recount_node_numbers(&root, "note", "n");
        let element = recounted.as_element().unwrap();

        let first = element.children[0].as_element().unwrap();
        let nested = element.children[1].as_element().unwrap().children[0]
            .as_element()
            .unwrap();
        let last = element.children[2].as_element().unwrap();

        assert_eq!(first.attribute("n"), Some("1"));
        assert_eq!(nested.attribute("n"), Some("2"));
        assert_eq!(last.attribute("n"), Some("3"));
    }

    #[test]
    fn test_after_export_layout() {
        let exported = tlh_after_export("<lb lnr=\"1\"/><w>x</w>".to_string());
        assert!(exported.starts_with("\n\n<lb"));
        assert!(exported.contains("\n <w"));
    }
}
