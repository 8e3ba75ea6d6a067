//! aoxml - Structured XML editing for cuneiform manuscripts
//!
//! This library provides the document core of an editorial platform for
//! transliterated cuneiform manuscripts:
//!
//! - an immutable XML tree model with path addressing,
//! - a reader/writer pair with per-tag inline formatting,
//! - a pure, path-addressed patch engine (copy-on-write mutation),
//! - a per-tag capability registry driving rendering, structured editing
//!   and insertion legality,
//! - a transliteration line parser with per-line error recovery and its
//!   XML converter,
//! - a line-number-keyed document merger for combining two transcription
//!   passes,
//! - autosave snapshots and blocking lookup clients for morphology and
//!   cuneiform rendering.
//!
//! # Example
//!
//! Parsing a transliteration and serializing it:
//!
//! ```
//! use aoxml::translit::{parse_transliteration, write_line_parse_success_to_xml};
//! use aoxml::xml::{tlh_write_config, write_node};
//!
//! let results = parse_transliteration("1. {d}IŠKUR-un ha-an-te");
//! let success = results[0].as_success().expect("line parses");
//!
//! let config = tlh_write_config();
//! for node in write_line_parse_success_to_xml(success) {
//!     for line in write_node(&node, &config, false) {
//!         println!("{}", line);
//!     }
//! }
//! ```

pub mod autosave;
pub mod config;
pub mod editor;
pub mod error;
pub mod lookup;
pub mod merge;
pub mod node;
pub mod patch;
pub mod translit;
pub mod xml;

// Re-export commonly used types
pub use autosave::{AutosaveStore, EditorSnapshot};
pub use config::{
    render_node, tlh_editor_config, EditFormSpec, FormField, InsertablePositions, NodeStyle,
    Side, XmlEditorConfig, XmlNodeConfig,
};
pub use editor::{DocumentEditor, EditorPhase, InsertPosition};
pub use error::{Error, Result};
pub use lookup::{HttpLookupClient, LookupClient};
pub use merge::{
    align_lines, collect_document_lines, export_merged_document, merged_filename, DocumentLine,
    MergeLine, Publication,
};
pub use node::{
    attrs, comment_node, element_node, find_first_by_tag_name, get_element_by_path, node_by_path,
    text_node, Attributes, CommentNode, ElementNode, NodeRef, TextNode, XmlNode,
};
pub use patch::{apply_patch, PatchOp};
pub use translit::{
    parse_transliteration, parse_transliteration_line, write_line_parse_success_to_xml,
    LineNumber, LineParseResult, LineParseSuccess, Word, WordContent,
};
pub use xml::{parse_file, parse_str, tlh_write_config, write_node, write_xml, XmlWriteConfig};
