//! Error types for aoxml.

use thiserror::Error;

/// Result type alias for aoxml operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading, mutating or merging documents.
#[derive(Error, Debug)]
pub enum Error {
    /// A node path failed to resolve. Paths are produced by the editor UI,
    /// so this indicates a programming error and must fail loudly.
    #[error("Invalid node path: {0}")]
    InvalidPath(String),

    /// A structurally illegal edit was attempted. The tree is left unchanged.
    #[error("Invalid mutation: {0}")]
    InvalidMutation(String),

    /// A merge input sequence was not sorted by line number.
    #[error("Unordered merge input: {0}")]
    UnorderedInput(String),

    /// Document-level XML parsing error.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// XML error from quick-xml.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A morphology or cuneiform lookup failed. Non-fatal: the document
    /// stays editable, callers surface this as an inline notice.
    #[error("Lookup failed: {0}")]
    Lookup(String),
}
