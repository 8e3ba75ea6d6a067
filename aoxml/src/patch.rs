//! Path-addressed tree mutation.
//!
//! Edits are expressed as an explicit patch algebra and applied by one pure
//! recursive function. Application is copy-on-write: only the ancestors
//! along the addressed path are new allocations, every sibling subtree is
//! shared with the input revision. Application is atomic: on error the
//! caller's tree is untouched and no partially rewritten tree exists.

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::node::{Attributes, ElementNode, NodeRef, XmlNode};

/// A structural edit, addressed by a root-relative node path.
#[derive(Debug, Clone)]
pub enum PatchOp {
    /// Merge attributes into the addressed element: mentioned keys
    /// overwrite (a `None` value makes the attribute absent), unmentioned
    /// keys survive.
    SetAttributes(Attributes),
    /// Replace the addressed node wholesale.
    ReplaceNode(NodeRef),
    /// Insert a node at position `index` among the addressed element's
    /// children. `index` may equal the current child count (append).
    InsertChild { index: usize, node: NodeRef },
    /// Delete the child at position `index` of the addressed element.
    /// Subsequent siblings shift down by one.
    DeleteChild { index: usize },
}

/// Applies one patch operation at the given path and returns the new root.
///
/// The input tree is never mutated. All intermediate path steps must
/// resolve to elements ([`Error::InvalidPath`] otherwise); the final target
/// must be an element for every op except [`PatchOp::ReplaceNode`]. The
/// document root must remain an element.
pub fn apply_patch(root: &NodeRef, path: &[usize], op: PatchOp) -> Result<NodeRef> {
    let new_root = rebuild(root, path, path, op)?;
    if !new_root.is_element() {
        return Err(Error::InvalidMutation(
            "document root must be an element".to_string(),
        ));
    }
    Ok(new_root)
}

fn rebuild(node: &NodeRef, full_path: &[usize], rest: &[usize], op: PatchOp) -> Result<NodeRef> {
    let Some((&index, deeper)) = rest.split_first() else {
        return apply_op(node, full_path, op);
    };

    let element = node.as_element().ok_or_else(|| {
        Error::InvalidPath(format!(
            "non-element node at depth {} of {:?}",
            full_path.len() - rest.len(),
            full_path
        ))
    })?;

    let child = element.children.get(index).ok_or_else(|| {
        Error::InvalidPath(format!(
            "index {} out of bounds at depth {} of {:?}",
            index,
            full_path.len() - rest.len(),
            full_path
        ))
    })?;

    let new_child = rebuild(child, full_path, deeper, op)?;

    // Cloning the child vector only bumps reference counts: every sibling
    // subtree stays shared with the previous revision.
    let mut children = element.children.clone();
    children[index] = new_child;

    Ok(Rc::new(XmlNode::Element(ElementNode {
        tag_name: element.tag_name.clone(),
        attributes: element.attributes.clone(),
        children,
    })))
}

fn apply_op(node: &NodeRef, path: &[usize], op: PatchOp) -> Result<NodeRef> {
    match op {
        PatchOp::ReplaceNode(replacement) => Ok(replacement),
        PatchOp::SetAttributes(updates) => {
            let element = target_element(node, path)?;
            let mut attributes = element.attributes.clone();
            for (name, value) in updates {
                attributes.insert(name, value);
            }
            Ok(Rc::new(XmlNode::Element(ElementNode {
                tag_name: element.tag_name.clone(),
                attributes,
                children: element.children.clone(),
            })))
        }
        PatchOp::InsertChild {
            index,
            node: new_child,
        } => {
            let element = target_element(node, path)?;
            if index > element.children.len() {
                return Err(Error::InvalidMutation(format!(
                    "insert position {} exceeds child count {} at {:?}",
                    index,
                    element.children.len(),
                    path
                )));
            }
            let mut children = element.children.clone();
            children.insert(index, new_child);
            Ok(Rc::new(XmlNode::Element(ElementNode {
                tag_name: element.tag_name.clone(),
                attributes: element.attributes.clone(),
                children,
            })))
        }
        PatchOp::DeleteChild { index } => {
            let element = target_element(node, path)?;
            if index >= element.children.len() {
                return Err(Error::InvalidMutation(format!(
                    "delete position {} out of bounds ({} children) at {:?}",
                    index,
                    element.children.len(),
                    path
                )));
            }
            let mut children = element.children.clone();
            children.remove(index);
            Ok(Rc::new(XmlNode::Element(ElementNode {
                tag_name: element.tag_name.clone(),
                attributes: element.attributes.clone(),
                children,
            })))
        }
    }
}

fn target_element<'a>(node: &'a NodeRef, path: &[usize]) -> Result<&'a ElementNode> {
    node.as_element().ok_or_else(|| {
        Error::InvalidMutation(format!("target of {:?} is not an element", path))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{attrs, element_node, get_element_by_path, text_node, Attributes};

    fn sample_tree() -> NodeRef {
        element_node(
            "text",
            Attributes::default(),
            vec![
                element_node(
                    "w",
                    attrs(&[("lg", "Hit")]),
                    vec![text_node("ha"), text_node("an")],
                ),
                element_node("lb", attrs(&[("lnr", "2")]), vec![]),
                element_node("gap", attrs(&[("c", "…")]), vec![]),
            ],
        )
    }

    #[test]
    fn test_set_attributes_merges() {
        let root = sample_tree();
        let mut updates = attrs(&[("lnr", "2'")]);
        updates.insert("cu".to_string(), None);

        let patched = apply_patch(&root, &[1], PatchOp::SetAttributes(updates)).unwrap();
        let lb = get_element_by_path(patched.as_element().unwrap(), &[1]).unwrap();

        assert_eq!(lb.attribute("lnr"), Some("2'"));
        assert_eq!(lb.attribute("cu"), None);

        // The input revision is untouched.
        let original_lb = get_element_by_path(root.as_element().unwrap(), &[1]).unwrap();
        assert_eq!(original_lb.attribute("lnr"), Some("2"));
    }

    #[test]
    fn test_untouched_siblings_stay_shared() {
        let root = sample_tree();
        let patched = apply_patch(
            &root,
            &[0, 1],
            PatchOp::ReplaceNode(text_node("te")),
        )
        .unwrap();

        let old = root.as_element().unwrap();
        let new = patched.as_element().unwrap();

        // Mutating path [0, 1] leaves children 1.. referentially shared.
        assert!(Rc::ptr_eq(&old.children[1], &new.children[1]));
        assert!(Rc::ptr_eq(&old.children[2], &new.children[2]));
        // And within the rewritten word, the untouched first child too.
        let old_word = old.children[0].as_element().unwrap();
        let new_word = new.children[0].as_element().unwrap();
        assert!(Rc::ptr_eq(&old_word.children[0], &new_word.children[0]));
        assert_eq!(new_word.children[1].as_text().unwrap().text_content, "te");
    }

    #[test]
    fn test_insert_child_at_position() {
        let root = sample_tree();
        let patched = apply_patch(
            &root,
            &[],
            PatchOp::InsertChild {
                index: 1,
                node: element_node("lb", attrs(&[("lnr", "1")]), vec![]),
            },
        )
        .unwrap();

        let element = patched.as_element().unwrap();
        assert_eq!(element.children.len(), 4);
        assert_eq!(
            element.children[1].as_element().unwrap().attribute("lnr"),
            Some("1")
        );
        // Append position equals the child count.
        let appended = apply_patch(
            &root,
            &[],
            PatchOp::InsertChild {
                index: 3,
                node: element_node("parsep", Attributes::default(), vec![]),
            },
        )
        .unwrap();
        assert_eq!(appended.as_element().unwrap().children.len(), 4);
    }

    #[test]
    fn test_delete_child_shifts_siblings() {
        let root = sample_tree();
        let patched = apply_patch(&root, &[], PatchOp::DeleteChild { index: 1 }).unwrap();

        let element = patched.as_element().unwrap();
        assert_eq!(element.children.len(), 2);
        assert_eq!(element.children[1].as_element().unwrap().tag_name, "gap");
    }

    #[test]
    fn test_out_of_bounds_mutations_rejected() {
        let root = sample_tree();

        assert!(matches!(
            apply_patch(
                &root,
                &[],
                PatchOp::InsertChild { index: 9, node: text_node("x") }
            ),
            Err(Error::InvalidMutation(_))
        ));
        assert!(matches!(
            apply_patch(&root, &[], PatchOp::DeleteChild { index: 3 }),
            Err(Error::InvalidMutation(_))
        ));
    }

    #[test]
    fn test_mutation_through_text_node_rejected() {
        let root = sample_tree();

        // [0, 0] is a text node: no attributes to set, no children to edit.
        assert!(matches!(
            apply_patch(&root, &[0, 0], PatchOp::SetAttributes(Attributes::default())),
            Err(Error::InvalidMutation(_))
        ));
        // Walking *through* it is a path error.
        assert!(matches!(
            apply_patch(&root, &[0, 0, 0], PatchOp::DeleteChild { index: 0 }),
            Err(Error::InvalidPath(_))
        ));
    }

    #[test]
    fn test_root_must_stay_element() {
        let root = sample_tree();
        assert!(matches!(
            apply_patch(&root, &[], PatchOp::ReplaceNode(text_node("x"))),
            Err(Error::InvalidMutation(_))
        ));

        let replaced = apply_patch(
            &root,
            &[],
            PatchOp::ReplaceNode(element_node("body", Attributes::default(), vec![])),
        )
        .unwrap();
        assert_eq!(replaced.as_element().unwrap().tag_name, "body");
    }
}
