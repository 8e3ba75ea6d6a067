//! Headless render/edit cycle over one document.
//!
//! Per selected node the editor moves through
//! `Displayed → Selected → Editing → (Submitted | Cancelled) → Displayed`.
//! Every mutation entry point is a synchronous call producing exactly one
//! patch application; there is no other way to change the tree, so lookup
//! results merged after the fact cannot race an interactive edit; they are
//! just one more patch. All state lives on the calling thread.

use crate::autosave::{AutosaveStore, EditorSnapshot};
use crate::config::{
    collect_form_attributes, render_node, EditFormSpec, NodeStyle, Side, XmlEditorConfig,
};
use crate::error::{Error, Result};
use crate::node::{
    element_node, get_element_by_path, node_by_path, Attributes, NodeRef,
};
use crate::patch::{apply_patch, PatchOp};

/// The editor's interaction phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorPhase {
    Displayed,
    Selected,
    Editing,
}

/// Where a new node should be inserted.
#[derive(Debug, Clone)]
pub enum InsertPosition {
    /// Directly in front of the node at this path.
    Before(Vec<usize>),
    /// Appended to the children of the element at this path.
    AsLastChildOf(Vec<usize>),
}

/// An open structured-edit form: field values keyed by attribute name,
/// pre-populated from the node under edit.
#[derive(Debug, Clone)]
pub struct EditSession {
    spec: EditFormSpec,
    values: Vec<(&'static str, String)>,
    changed: bool,
}

impl EditSession {
    /// Returns the current value of a form field.
    pub fn value(&self, attribute: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| *key == attribute)
            .map(|(_, value)| value.as_str())
    }

    /// Returns true if any field changed since the form opened.
    pub fn changed(&self) -> bool {
        self.changed
    }
}

/// One loaded document plus its interaction state.
pub struct DocumentEditor<'a> {
    config: &'a XmlEditorConfig,
    filename: String,
    root: NodeRef,
    selection: Option<Vec<usize>>,
    session: Option<EditSession>,
    autosave: Option<AutosaveStore>,
}

impl<'a> DocumentEditor<'a> {
    /// Opens a document. The boundary `read_node` transforms run here,
    /// once; their `write_node` inverses run on export.
    pub fn new(config: &'a XmlEditorConfig, filename: &str, root: NodeRef) -> Result<Self> {
        if !root.is_element() {
            return Err(Error::InvalidMutation(
                "document root must be an element".to_string(),
            ));
        }
        Ok(DocumentEditor {
            root: config.read_tree(&root),
            config,
            filename: filename.to_string(),
            selection: None,
            session: None,
            autosave: None,
        })
    }

    /// Restores the autosaved state from the store if one exists, otherwise
    /// opens the given document. Either way, subsequent edits autosave.
    pub fn with_autosave(
        config: &'a XmlEditorConfig,
        store: AutosaveStore,
        filename: &str,
        root: NodeRef,
    ) -> Result<Self> {
        let mut editor = match store.load() {
            Some(snapshot) => Self::new(config, &snapshot.filename, snapshot.root_node)?,
            None => Self::new(config, filename, root)?,
        };
        editor.autosave = Some(store);
        Ok(editor)
    }

    /// The current document root.
    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    /// The loaded filename.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The current interaction phase.
    pub fn phase(&self) -> EditorPhase {
        if self.session.is_some() {
            EditorPhase::Editing
        } else if self.selection.is_some() {
            EditorPhase::Selected
        } else {
            EditorPhase::Displayed
        }
    }

    /// The selected node path, if any.
    pub fn selection(&self) -> Option<&[usize]> {
        self.selection.as_deref()
    }

    /// Selects the node at the given path. Selecting a tag without an
    /// `edit` capability is a display highlight only; `open_edit` will
    /// refuse for it.
    pub fn select(&mut self, path: &[usize]) -> Result<()> {
        let root = self.root_element();
        if !path.is_empty() {
            node_by_path(root, path)?;
        }
        self.session = None;
        self.selection = Some(path.to_vec());
        Ok(())
    }

    /// Clears the selection and any open form.
    pub fn deselect(&mut self) {
        self.session = None;
        self.selection = None;
    }

    /// Opens the structured edit form for the selected node, pre-populated
    /// from its current attributes.
    pub fn open_edit(&mut self) -> Result<&EditSession> {
        let path = self
            .selection
            .clone()
            .ok_or_else(|| Error::InvalidMutation("nothing is selected".to_string()))?;

        let element = get_element_by_path(self.root_element(), &path)?;
        let spec = self
            .config
            .node_config(&element.tag_name)
            .and_then(|config| config.edit.clone())
            .ok_or_else(|| {
                Error::InvalidMutation(format!("<{}> has no edit form", element.tag_name))
            })?;

        let values = spec
            .fields
            .iter()
            .map(|field| {
                let current = element.attribute(field.attribute).unwrap_or_default();
                (field.attribute, current.to_string())
            })
            .collect();

        Ok(self.session.insert(EditSession {
            spec,
            values,
            changed: false,
        }))
    }

    /// Updates one field of the open form.
    pub fn set_field(&mut self, attribute: &str, value: &str) -> Result<()> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| Error::InvalidMutation("no form is open".to_string()))?;

        let slot = session
            .values
            .iter_mut()
            .find(|(key, _)| *key == attribute)
            .ok_or_else(|| {
                Error::InvalidMutation(format!("form has no field for '{}'", attribute))
            })?;

        slot.1 = value.to_string();
        session.changed = true;
        Ok(())
    }

    /// Validates the open form and applies it as one attribute patch,
    /// closing the form (the node stays selected). On validation failure
    /// the form stays open and the tree is unchanged.
    pub fn submit(&mut self) -> Result<()> {
        let path = self
            .selection
            .clone()
            .ok_or_else(|| Error::InvalidMutation("nothing is selected".to_string()))?;
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| Error::InvalidMutation("no form is open".to_string()))?;

        let values: Vec<(&str, String)> = session
            .values
            .iter()
            .map(|(key, value)| (*key, value.clone()))
            .collect();
        let attributes = collect_form_attributes(&session.spec, &values)?;

        self.apply(&path, PatchOp::SetAttributes(attributes))?;
        self.session = None;
        Ok(())
    }

    /// Discards the open form without mutating; the node stays selected.
    pub fn cancel(&mut self) {
        self.session = None;
    }

    /// Deletes the selected node and moves focus to its parent.
    ///
    /// Deletion is rejected when the node is the sole child of a parent
    /// whose configuration declares `requires_content`.
    pub fn delete_selected(&mut self) -> Result<()> {
        let path = self
            .selection
            .clone()
            .ok_or_else(|| Error::InvalidMutation("nothing is selected".to_string()))?;
        let (&index, parent_path) = path.split_last().ok_or_else(|| {
            Error::InvalidMutation("the document root cannot be deleted".to_string())
        })?;

        let parent = get_element_by_path(self.root_element(), parent_path)?;
        let parent_requires_content = self
            .config
            .node_config(&parent.tag_name)
            .is_some_and(|config| config.requires_content);
        if parent_requires_content && parent.children.len() == 1 {
            return Err(Error::InvalidMutation(format!(
                "<{}> requires content; its only child cannot be deleted",
                parent.tag_name
            )));
        }

        self.apply(parent_path, PatchOp::DeleteChild { index })?;
        self.session = None;
        self.selection = Some(parent_path.to_vec());
        Ok(())
    }

    /// Inserts a new empty element with the given tag at the given
    /// position, after checking the tag's `insertablePositions`. Illegal
    /// insertion is rejected before any mutation. Returns the new node's
    /// path.
    pub fn insert_node(&mut self, tag_name: &str, position: InsertPosition) -> Result<Vec<usize>> {
        let positions = self
            .config
            .node_config(tag_name)
            .and_then(|config| config.insertable_positions)
            .ok_or_else(|| {
                Error::InvalidMutation(format!("<{}> is not insertable", tag_name))
            })?;

        let (parent_path, index) = match &position {
            InsertPosition::Before(path) => {
                let (&index, parent_path) = path.split_last().ok_or_else(|| {
                    Error::InvalidMutation("cannot insert before the document root".to_string())
                })?;
                let sibling = node_by_path(self.root_element(), path)?;
                let sibling_tag = sibling.as_element().map(|e| e.tag_name.as_str());
                if !sibling_tag.is_some_and(|tag| positions.before_element.contains(&tag)) {
                    return Err(Error::InvalidMutation(format!(
                        "<{}> cannot be inserted before <{}>",
                        tag_name,
                        sibling_tag.unwrap_or("non-element")
                    )));
                }
                (parent_path.to_vec(), index)
            }
            InsertPosition::AsLastChildOf(path) => {
                let parent = get_element_by_path(self.root_element(), path)?;
                if !positions
                    .as_last_child_of
                    .contains(&parent.tag_name.as_str())
                {
                    return Err(Error::InvalidMutation(format!(
                        "<{}> cannot be appended to <{}>",
                        tag_name, parent.tag_name
                    )));
                }
                (path.clone(), parent.children.len())
            }
        };

        let node = element_node(tag_name, Attributes::default(), vec![]);
        self.apply(&parent_path, PatchOp::InsertChild { index, node })?;

        let mut new_path = parent_path;
        new_path.push(index);
        self.selection = Some(new_path.clone());
        Ok(new_path)
    }

    /// Merges a lookup response into the node at the given path.
    ///
    /// Last-write-wins by design: a stale response for a node that is still
    /// mounted overwrites current state; no request-generation guard.
    pub fn apply_lookup_result(&mut self, path: &[usize], attributes: Attributes) -> Result<()> {
        self.apply(path, PatchOp::SetAttributes(attributes))
    }

    /// Applies an externally built patch through the same contract as an
    /// interactive edit.
    pub fn apply_patch_op(&mut self, path: &[usize], op: PatchOp) -> Result<()> {
        self.apply(path, op)
    }

    /// Renders the document to display text.
    pub fn render(&self, side: Side) -> String {
        render_node(
            self.config,
            &self.root,
            &[],
            self.selection.as_deref(),
            side,
        )
    }

    /// The display classes of the node at the given path, including
    /// `SELECTED` when it is the current selection.
    pub fn node_style(&self, path: &[usize]) -> Result<NodeStyle> {
        let element = get_element_by_path(self.root_element(), path)?;
        let mut style = self.config.style_of(element);
        if self.selection.as_deref() == Some(path) {
            style |= NodeStyle::SELECTED;
        }
        Ok(style)
    }

    /// Serializes the document for persistence or export.
    pub fn export(&self) -> String {
        self.config.export_document(&self.root)
    }

    /// Closes the document, clearing any autosaved state.
    pub fn close(&mut self) -> Result<()> {
        if let Some(store) = &self.autosave {
            store.clear()?;
        }
        self.deselect();
        Ok(())
    }

    fn root_element(&self) -> &crate::node::ElementNode {
        // The constructor guarantees an element root and every patch
        // application re-checks it.
        self.root.as_element().expect("document root is an element")
    }

    fn apply(&mut self, path: &[usize], op: PatchOp) -> Result<()> {
        let new_root = apply_patch(&self.root, path, op)?;
        self.root = new_root;

        if let Some(store) = &self.autosave {
            store.save(&EditorSnapshot::new(&self.filename, self.root.clone()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tlh_editor_config;
    use crate::node::{attrs, text_node, Attributes};

    fn sample_document() -> NodeRef {
        element_node(
            "div1",
            attrs(&[("type", "transliteration")]),
            vec![
                element_node("lb", attrs(&[("lnr", "1")]), vec![]),
                element_node("w", Attributes::default(), vec![text_node("ha-an")]),
                element_node("gap", attrs(&[("c", "…")]), vec![]),
            ],
        )
    }

    #[test]
    fn test_select_then_edit_then_submit() {
        let config = tlh_editor_config();
        let mut editor = DocumentEditor::new(&config, "doc.xml", sample_document()).unwrap();
        assert_eq!(editor.phase(), EditorPhase::Displayed);

        editor.select(&[0]).unwrap();
        assert_eq!(editor.phase(), EditorPhase::Selected);

        let session = editor.open_edit().unwrap();
        assert_eq!(session.value("lnr"), Some("1"));
        assert!(!session.changed());
        assert_eq!(editor.phase(), EditorPhase::Editing);

        editor.set_field("lnr", " 1' ").unwrap();
        editor.submit().unwrap();
        assert_eq!(editor.phase(), EditorPhase::Selected);

        let lb = get_element_by_path(editor.root().as_element().unwrap(), &[0]).unwrap();
        // The line number field is trimmed on submit.
        assert_eq!(lb.attribute("lnr"), Some("1'"));
    }

    #[test]
    fn test_cancel_discards_without_mutation() {
        let config = tlh_editor_config();
        let mut editor = DocumentEditor::new(&config, "doc.xml", sample_document()).unwrap();
        let before = editor.root().clone();

        editor.select(&[2]).unwrap();
        editor.open_edit().unwrap();
        editor.set_field("c", "x x x").unwrap();
        editor.cancel();

        assert_eq!(editor.root(), &before);
        assert_eq!(editor.phase(), EditorPhase::Selected);
    }

    #[test]
    fn test_edit_refused_without_capability() {
        let config = tlh_editor_config();
        let mut editor = DocumentEditor::new(&config, "doc.xml", sample_document()).unwrap();

        // The word's text child has no edit form; selection still works.
        editor.select(&[1, 0]).unwrap();
        assert_eq!(editor.phase(), EditorPhase::Selected);
        assert!(editor.open_edit().is_err());
    }

    #[test]
    fn test_submit_validation_keeps_form_open() {
        let config = tlh_editor_config();
        let mut editor = DocumentEditor::new(&config, "doc.xml", sample_document()).unwrap();

        editor.select(&[2]).unwrap();
        editor.open_edit().unwrap();
        editor.set_field("c", "   ").unwrap();

        assert!(editor.submit().is_err());
        assert_eq!(editor.phase(), EditorPhase::Editing);

        let gap = get_element_by_path(editor.root().as_element().unwrap(), &[2]).unwrap();
        assert_eq!(gap.attribute("c"), Some("…"));
    }

    #[test]
    fn test_delete_moves_focus_to_parent() {
        let config = tlh_editor_config();
        let mut editor = DocumentEditor::new(&config, "doc.xml", sample_document()).unwrap();

        editor.select(&[1]).unwrap();
        editor.delete_selected().unwrap();

        assert_eq!(editor.selection(), Some(&[][..]));
        let root = editor.root().as_element().unwrap();
        assert_eq!(root.children.len(), 2);
        // The gap shifted down by one.
        assert_eq!(root.children[1].as_element().unwrap().tag_name, "gap");
    }

    #[test]
    fn test_delete_sole_child_of_required_content_tag_rejected() {
        let config = tlh_editor_config();
        let mut editor = DocumentEditor::new(&config, "doc.xml", sample_document()).unwrap();

        // [1, 0] is the only child of <w>, which requires content.
        editor.select(&[1, 0]).unwrap();
        assert!(matches!(
            editor.delete_selected(),
            Err(Error::InvalidMutation(_))
        ));

        let word = get_element_by_path(editor.root().as_element().unwrap(), &[1]).unwrap();
        assert_eq!(word.children.len(), 1);
    }

    #[test]
    fn test_insert_before_listed_tag() {
        let config = tlh_editor_config();
        let mut editor = DocumentEditor::new(&config, "doc.xml", sample_document()).unwrap();

        // lb may be inserted before a gap.
        let path = editor
            .insert_node("lb", InsertPosition::Before(vec![2]))
            .unwrap();
        assert_eq!(path, vec![2]);

        let root = editor.root().as_element().unwrap();
        assert_eq!(root.children.len(), 4);
        assert_eq!(root.children[2].as_element().unwrap().tag_name, "lb");
    }

    #[test]
    fn test_insert_before_unlisted_tag_rejected() {
        let config = tlh_editor_config();
        let mut editor = DocumentEditor::new(&config, "doc.xml", sample_document()).unwrap();
        let before = editor.root().clone();

        // w's before_element set does not list lb.
        assert!(matches!(
            editor.insert_node("w", InsertPosition::Before(vec![0])),
            Err(Error::InvalidMutation(_))
        ));
        // No partial insert.
        assert_eq!(editor.root(), &before);
    }

    #[test]
    fn test_insert_as_last_child() {
        let config = tlh_editor_config();
        let mut editor = DocumentEditor::new(&config, "doc.xml", sample_document()).unwrap();

        let path = editor
            .insert_node("lb", InsertPosition::AsLastChildOf(vec![]))
            .unwrap();
        assert_eq!(path, vec![3]);

        // But appending to a word is not allowed.
        assert!(editor
            .insert_node("lb", InsertPosition::AsLastChildOf(vec![1]))
            .is_err());
    }

    #[test]
    fn test_lookup_result_last_write_wins() {
        let config = tlh_editor_config();
        let mut editor = DocumentEditor::new(&config, "doc.xml", sample_document()).unwrap();

        editor
            .apply_lookup_result(&[0], attrs(&[("cu", "𒀸")]))
            .unwrap();
        // A second (stale) response simply overwrites.
        editor
            .apply_lookup_result(&[0], attrs(&[("cu", "𒀭")]))
            .unwrap();

        let lb = get_element_by_path(editor.root().as_element().unwrap(), &[0]).unwrap();
        assert_eq!(lb.attribute("cu"), Some("𒀭"));
    }

    #[test]
    fn test_autosave_on_every_edit_and_cleared_on_close() {
        let dir = std::env::temp_dir().join("aoxml-editor-autosave");
        std::fs::create_dir_all(&dir).unwrap();
        let store = AutosaveStore::new(&dir);
        store.clear().unwrap();

        let config = tlh_editor_config();
        let mut editor =
            DocumentEditor::with_autosave(&config, store.clone(), "doc.xml", sample_document())
                .unwrap();

        editor.select(&[0]).unwrap();
        editor.open_edit().unwrap();
        editor.set_field("txtid", "KBo 1.1").unwrap();
        editor.submit().unwrap();

        let snapshot = store.load().unwrap();
        assert_eq!(snapshot.filename, "doc.xml");
        assert_eq!(snapshot.root_node, *editor.root());

        editor.close().unwrap();
        assert!(store.load().is_none());
    }
}
