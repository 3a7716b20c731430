//! On-disk snapshot of the cache.
//!
//! The file is one JSON object mapping each filled kind's route to a JSON
//! string that itself holds the array of that kind's entities:
//!
//! ```json
//! {"customer": "[{\"type\": \"Customer\", \"ID\": 1, ...}]"}
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::Builder;

use super::CacheError;
use crate::entity::{Entity, EntityKind, TYPE_KEY};

pub(super) type Entries = BTreeMap<EntityKind, Vec<Entity>>;

/// Reads and atomically rewrites the snapshot file.
#[derive(Debug, Clone)]
pub(super) struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub(super) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the snapshot; a missing file is an empty cache.
    pub(super) fn load(&self) -> Result<Entries, CacheError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(source) => {
                return Err(CacheError::SnapshotIo {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let document: BTreeMap<String, Value> =
            serde_json::from_str(&text).map_err(|error| self.corrupt(error.to_string()))?;

        let mut entries = Entries::new();
        for (route, value) in document {
            let kind = EntityKind::from_route(&route)
                .ok_or_else(|| self.corrupt(format!("unknown cache key '{route}'")))?;
            let Value::String(encoded) = value else {
                return Err(self.corrupt(format!("value under '{route}' is not a string")));
            };
            entries.insert(kind, self.decode_sequence(kind, &encoded)?);
        }
        Ok(entries)
    }

    fn decode_sequence(&self, kind: EntityKind, encoded: &str) -> Result<Vec<Entity>, CacheError> {
        let route = kind.route();
        let Value::Array(items) = serde_json::from_str::<Value>(encoded)
            .map_err(|error| self.corrupt(format!("value under '{route}': {error}")))?
        else {
            return Err(self.corrupt(format!("value under '{route}' is not a sequence")));
        };

        let mut sequence: Vec<Entity> = Vec::with_capacity(items.len());
        for item in items {
            let Value::Object(mut document) = item else {
                return Err(self.corrupt(format!("entry under '{route}' is not an object")));
            };
            match document.remove(TYPE_KEY) {
                Some(Value::String(tag)) if tag == kind.name() => {}
                _ => {
                    return Err(self.corrupt(format!(
                        "entry under '{route}' is not tagged as {kind}"
                    )));
                }
            }
            let entity = kind
                .decode(document)
                .map_err(|error| self.corrupt(error.to_string()))?;
            if sequence.iter().any(|existing| existing.id() == entity.id()) {
                return Err(self.corrupt(format!(
                    "duplicate ID {} under '{route}'",
                    entity.id()
                )));
            }
            sequence.push(entity);
        }
        Ok(sequence)
    }

    /// Writes the whole cache through a temporary file and a rename.
    pub(super) fn save(&self, entries: &Entries) -> Result<(), CacheError> {
        let mut document = BTreeMap::new();
        for (kind, sequence) in entries {
            document.insert(kind.route(), serde_json::to_string(sequence)?);
        }
        let contents = serde_json::to_vec(&document)?;
        self.atomic_write(&contents)
            .map_err(|source| CacheError::SnapshotIo {
                path: self.path.clone(),
                source,
            })
    }

    fn atomic_write(&self, contents: &[u8]) -> io::Result<()> {
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(directory)?;

        let mut builder = Builder::new();
        builder.prefix(
            self.path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("cache"),
        );
        builder.suffix(".tmp");

        let mut file = builder.tempfile_in(directory)?;
        file.write_all(contents)?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|error| error.error)?;
        Ok(())
    }

    fn corrupt(&self, reason: impl Into<String>) -> CacheError {
        CacheError::CacheCorruption {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }
}
