//! Path addressing and tree search.
//!
//! A node path is a root-relative sequence of child indices: `path[i]`
//! selects one child at depth `i`. Every prefix of a valid path must
//! resolve to an element, since text and comment nodes have no children.

use crate::error::{Error, Result};
use crate::node::{ElementNode, NodeRef, XmlNode};

/// Resolves a path to an element.
///
/// Fails with [`Error::InvalidPath`] if any step runs out of bounds, walks
/// through a non-element node, or the final node is not an element.
pub fn get_element_by_path<'a>(root: &'a ElementNode, path: &[usize]) -> Result<&'a ElementNode> {
    let mut current = root;
    for (depth, &index) in path.iter().enumerate() {
        let child = current.children.get(index).ok_or_else(|| {
            Error::InvalidPath(format!(
                "index {} out of bounds at depth {} of {:?}",
                index, depth, path
            ))
        })?;
        current = child.as_element().ok_or_else(|| {
            Error::InvalidPath(format!(
                "non-element node at depth {} of {:?}",
                depth, path
            ))
        })?;
    }
    Ok(current)
}

/// Resolves a path to any node kind.
///
/// All intermediate steps must resolve to elements; only the final node may
/// be text or a comment. The path must be non-empty (the root has no handle
/// of its own here).
pub fn node_by_path<'a>(root: &'a ElementNode, path: &[usize]) -> Result<&'a NodeRef> {
    let (&last, parent_path) = path
        .split_last()
        .ok_or_else(|| Error::InvalidPath("empty path has no target node".to_string()))?;

    let parent = get_element_by_path(root, parent_path)?;
    parent.children.get(last).ok_or_else(|| {
        Error::InvalidPath(format!(
            "index {} out of bounds at depth {} of {:?}",
            last,
            path.len() - 1,
            path
        ))
    })
}

/// Finds the first element with the given tag name, in pre-order
/// depth-first order. Used for cross-cutting lookups such as locating a
/// document's language attribute from an ancestor element.
pub fn find_first_by_tag_name<'a>(node: &'a XmlNode, tag_name: &str) -> Option<&'a ElementNode> {
    let element = node.as_element()?;

    if element.tag_name == tag_name {
        return Some(element);
    }

    element
        .children
        .iter()
        .find_map(|child| find_first_by_tag_name(child, tag_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{attrs, element_node, text_node, Attributes};

    fn sample_tree() -> NodeRef {
        element_node(
            "text",
            attrs(&[("xml:lang", "Hit")]),
            vec![
                element_node("lb", attrs(&[("lnr", "1")]), vec![]),
                element_node(
                    "w",
                    Attributes::default(),
                    vec![element_node("sGr", Attributes::default(), vec![text_node("GIŠ")])],
                ),
            ],
        )
    }

    #[test]
    fn test_get_element_by_path() {
        let root = sample_tree();
        let root = root.as_element().unwrap();

        assert_eq!(get_element_by_path(root, &[]).unwrap().tag_name, "text");
        assert_eq!(get_element_by_path(root, &[0]).unwrap().tag_name, "lb");
        assert_eq!(get_element_by_path(root, &[1, 0]).unwrap().tag_name, "sGr");
    }

    #[test]
    fn test_path_out_of_bounds_fails() {
        let root = sample_tree();
        let root = root.as_element().unwrap();

        assert!(matches!(
            get_element_by_path(root, &[7]),
            Err(Error::InvalidPath(_))
        ));
        assert!(matches!(
            get_element_by_path(root, &[0, 0]),
            Err(Error::InvalidPath(_))
        ));
    }

    #[test]
    fn test_path_through_text_fails() {
        let root = sample_tree();
        let root = root.as_element().unwrap();

        // [1, 0, 0] addresses the text node inside <sGr>; walking further
        // through it must fail fast.
        assert!(matches!(
            get_element_by_path(root, &[1, 0, 0]),
            Err(Error::InvalidPath(_))
        ));
        assert!(matches!(
            get_element_by_path(root, &[1, 0, 0, 0]),
            Err(Error::InvalidPath(_))
        ));
    }

    #[test]
    fn test_node_by_path_reaches_text() {
        let root = sample_tree();
        let root = root.as_element().unwrap();

        let node = node_by_path(root, &[1, 0, 0]).unwrap();
        assert_eq!(node.as_text().unwrap().text_content, "GIŠ");

        assert!(matches!(
            node_by_path(root, &[]),
            Err(Error::InvalidPath(_))
        ));
    }

    #[test]
    fn test_find_first_by_tag_name() {
        let root = sample_tree();

        let found = find_first_by_tag_name(&root, "sGr").unwrap();
        assert_eq!(found.children.len(), 1);

        let lang = find_first_by_tag_name(&root, "text")
            .and_then(|text| text.attribute("xml:lang"));
        assert_eq!(lang, Some("Hit"));

        assert!(find_first_by_tag_name(&root, "gap").is_none());
    }
}
