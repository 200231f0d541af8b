//! Label map: class name to integer id.
//!
//! The map is built once from a plain-text class list (one name per line)
//! and is immutable afterwards. Ids are the 0-based positions of the names
//! in that list, and iteration follows insertion order so the descriptor
//! written next to the shards lists classes in the same order as the
//! source file.

mod id;
pub mod pbtxt;

pub use id::ClassId;
pub use pbtxt::{read_label_map, write_label_map, LABEL_MAP_FILE_NAME};

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::TfshardError;

/// What to do when a class name appears more than once in the label list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Fail with [`TfshardError::DuplicateLabel`].
    #[default]
    Reject,
    /// Keep the name's first slot in iteration order but give it the id of
    /// its last position. Ids are no longer contiguous.
    Overwrite,
}

/// One class in the label map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelEntry {
    pub id: ClassId,
    pub name: String,
}

/// Insertion-ordered mapping from class name to [`ClassId`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelMap {
    entries: Vec<LabelEntry>,
    by_name: HashMap<String, usize>,
}

impl LabelMap {
    /// Builds a map from class names in order. Surrounding whitespace is
    /// trimmed and blank names are skipped without consuming an id.
    pub fn from_names<I, S>(names: I, policy: DuplicatePolicy) -> Result<Self, TfshardError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = LabelMap::default();
        let mut position = 0usize;

        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }

            if let Some(&slot) = map.by_name.get(name) {
                match policy {
                    DuplicatePolicy::Reject => {
                        return Err(TfshardError::DuplicateLabel {
                            name: name.to_string(),
                            first_position: map.entries[slot].id.as_i64() as usize,
                            position,
                        });
                    }
                    DuplicatePolicy::Overwrite => {
                        log::warn!(
                            "label '{}' repeated at position {}; reassigning its id",
                            name,
                            position
                        );
                        map.entries[slot].id = ClassId::new(position as i64);
                    }
                }
            } else {
                map.insert(ClassId::new(position as i64), name.to_string());
            }
            position += 1;
        }

        Ok(map)
    }

    /// Reads a newline-delimited class list.
    pub fn read_label_list(path: &Path, policy: DuplicatePolicy) -> Result<Self, TfshardError> {
        let contents = fs::read_to_string(path).map_err(|source| TfshardError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_names(contents.lines(), policy)
    }

    /// Adds an entry with an explicit id. A repeated name replaces the id of
    /// the existing entry.
    pub(crate) fn insert(&mut self, id: ClassId, name: String) {
        if let Some(&slot) = self.by_name.get(&name) {
            self.entries[slot].id = id;
            return;
        }
        self.by_name.insert(name.clone(), self.entries.len());
        self.entries.push(LabelEntry { id, name });
    }

    /// Looks up the id of a class name.
    pub fn get(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).map(|&slot| self.entries[slot].id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &LabelEntry> {
        self.entries.iter()
    }
}
