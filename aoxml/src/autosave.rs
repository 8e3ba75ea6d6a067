//! Keyed editor-state snapshots.
//!
//! The editor persists `{filename, rootNode}` on every edit, reads it back
//! once at startup and clears it on explicit close. Snapshots are JSON with
//! the historical field names, so states saved by earlier versions load.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::node::NodeRef;

const SNAPSHOT_FILE: &str = "editor-state.json";

/// One autosaved editor state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshot {
    pub filename: String,
    pub root_node: NodeRef,
}

/// File-backed snapshot storage under one directory.
#[derive(Debug, Clone)]
pub struct AutosaveStore {
    path: PathBuf,
}

impl AutosaveStore {
    /// Creates a store writing to `dir/editor-state.json`.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        AutosaveStore {
            path: dir.as_ref().join(SNAPSHOT_FILE),
        }
    }

    /// Writes a snapshot, replacing any previous one.
    pub fn save(&self, snapshot: &EditorSnapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Reads the stored snapshot. An absent or unreadable snapshot yields
    /// `None`: autosave recovery must never block opening the editor.
    pub fn load(&self) -> Option<EditorSnapshot> {
        let json = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&json).ok()
    }

    /// Removes the stored snapshot, if any.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl EditorSnapshot {
    /// Creates a snapshot of the given document state.
    pub fn new(filename: &str, root_node: NodeRef) -> Self {
        EditorSnapshot {
            filename: filename.to_string(),
            root_node,
        }
    }
}
