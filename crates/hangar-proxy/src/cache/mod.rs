//! Per-kind entity cache with background snapshotting.
//!
//! Each kind maps to an ordered sequence of entities with unique IDs. A kind
//! that was never filled is absent, which is distinct from a kind that was
//! fetched and came back empty. One mutex guards every kind; operations hold
//! it only for their own critical section and never across backend calls.
//!
//! Mutations mark the cache dirty. A single worker thread then rewrites the
//! snapshot file; callers never wait for it. Dropping the cache waits for the
//! worker to write any pending snapshot.

mod errors;
mod persister;
mod snapshot;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{Map, Value};
use tracing::{debug, info};

pub use self::errors::CacheError;
use self::persister::Persister;
use self::snapshot::{Entries, SnapshotStore};
use crate::entity::{Entity, EntityError, EntityKind};

const CACHE_TARGET: &str = "hangar_proxy::cache";

#[derive(Debug)]
struct CacheState {
    entries: Mutex<Entries>,
    store: Option<SnapshotStore>,
}

impl CacheState {
    fn lock(&self) -> Result<MutexGuard<'_, Entries>, CacheError> {
        self.entries.lock().map_err(|_| CacheError::Poisoned)
    }

    fn persist(&self) -> Result<(), CacheError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let entries = self.lock()?.clone();
        store.save(&entries)
    }
}

/// Process-wide cache of entities keyed by kind.
#[derive(Debug)]
pub struct EntityCache {
    shared: Arc<CacheState>,
    persister: Option<Persister>,
}

impl EntityCache {
    /// Creates a cache that never touches the filesystem.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            shared: Arc::new(CacheState {
                entries: Mutex::new(Entries::new()),
                store: None,
            }),
            persister: None,
        }
    }

    /// Creates an empty cache snapshotted to `path`.
    ///
    /// The snapshot is not read; call [`EntityCache::load_snapshot`] for that.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Worker`] when the persistence thread cannot be
    /// started.
    pub fn with_snapshot(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let shared = Arc::new(CacheState {
            entries: Mutex::new(Entries::new()),
            store: Some(SnapshotStore::new(path.into())),
        });
        let worker_state = Arc::clone(&shared);
        let persister =
            Persister::spawn(move || worker_state.persist()).map_err(CacheError::Worker)?;
        Ok(Self {
            shared,
            persister: Some(persister),
        })
    }

    /// Snapshot file, when the cache has one.
    #[must_use]
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.shared.store.as_ref().map(SnapshotStore::path)
    }

    /// Returns the cached sequence for `kind`, or `None` if never filled.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Poisoned`] if the lock is poisoned.
    pub fn get(&self, kind: EntityKind) -> Result<Option<Vec<Entity>>, CacheError> {
        Ok(self.shared.lock()?.get(&kind).cloned())
    }

    /// Whether `kind` has been filled.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Poisoned`] if the lock is poisoned.
    pub fn contains(&self, kind: EntityKind) -> Result<bool, CacheError> {
        Ok(self.shared.lock()?.contains_key(&kind))
    }

    /// Stores fetched entities for `kind`.
    ///
    /// An absent kind is set to the entities given. A present kind is only
    /// extended, and only with entities whose ID it does not hold yet, so an
    /// earlier fill always wins over a later duplicate fetch.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Entity`] if any entity is of another kind, and
    /// [`CacheError::Poisoned`] if the lock is poisoned.
    pub fn fill(&self, kind: EntityKind, entities: Vec<Entity>) -> Result<(), CacheError> {
        if let Some(stray) = entities.iter().find(|entity| entity.kind() != kind) {
            return Err(EntityError::malformed(
                kind.name(),
                format!("cannot cache a {} entity under {kind}", stray.kind()),
            )
            .into());
        }

        let mut entries = self.shared.lock()?;
        let sequence = entries.entry(kind).or_default();
        let before = sequence.len();
        for entity in entities {
            if !sequence.iter().any(|existing| existing.id() == entity.id()) {
                sequence.push(entity);
            }
        }
        let added = sequence.len() - before;
        drop(entries);

        debug!(target: CACHE_TARGET, kind = %kind, added, "cache filled");
        self.mark_dirty();
        Ok(())
    }

    /// Finds the entity of `kind` with the given ID.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Poisoned`] if the lock is poisoned.
    pub fn lookup(&self, kind: EntityKind, id: i64) -> Result<Option<Entity>, CacheError> {
        Ok(self
            .shared
            .lock()?
            .get(&kind)
            .and_then(|sequence| sequence.iter().find(|entity| entity.id() == id))
            .cloned())
    }

    /// Appends a new entity built from `fields` and returns its ID.
    ///
    /// The ID is one more than the largest ID held for the kind, or `1` when
    /// there is none.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Entity`] when the fields do not match the
    /// kind's schema; the cache is left untouched.
    pub fn append(&self, kind: EntityKind, fields: Map<String, Value>) -> Result<i64, CacheError> {
        let mut entries = self.shared.lock()?;
        let id = match entries
            .get(&kind)
            .and_then(|sequence| sequence.iter().map(Entity::id).max())
        {
            None => 1,
            Some(max) => max.checked_add(1).ok_or_else(|| {
                EntityError::malformed(kind.name(), "no identifiers left to assign")
            })?,
        };
        let entity = kind.build(id, fields)?;
        entries.entry(kind).or_default().push(entity);
        drop(entries);

        debug!(target: CACHE_TARGET, kind = %kind, id, "entity appended");
        self.mark_dirty();
        Ok(id)
    }

    /// Removes the entity of `kind` with the given ID.
    ///
    /// Returns `false`, leaving the cache untouched, when there is none.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Poisoned`] if the lock is poisoned.
    pub fn remove(&self, kind: EntityKind, id: i64) -> Result<bool, CacheError> {
        let mut entries = self.shared.lock()?;
        let Some(sequence) = entries.get_mut(&kind) else {
            return Ok(false);
        };
        let Some(position) = sequence.iter().position(|entity| entity.id() == id) else {
            return Ok(false);
        };
        sequence.remove(position);
        drop(entries);

        debug!(target: CACHE_TARGET, kind = %kind, id, "entity removed");
        self.mark_dirty();
        Ok(true)
    }

    /// Replaces the cache contents with the snapshot file.
    ///
    /// A missing file leaves the cache empty. Returns the number of kinds
    /// loaded.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::CacheCorruption`] when the file does not hold the
    /// expected document and [`CacheError::SnapshotIo`] when it cannot be read.
    pub fn load_snapshot(&self) -> Result<usize, CacheError> {
        let Some(store) = &self.shared.store else {
            return Ok(0);
        };
        let loaded = store.load()?;
        let kinds = loaded.len();
        *self.shared.lock()? = loaded;
        info!(
            target: CACHE_TARGET,
            path = %store.path().display(),
            kinds,
            "cache snapshot loaded"
        );
        Ok(kinds)
    }

    /// Writes the snapshot file now, on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::SnapshotIo`] or [`CacheError::SnapshotEncode`]
    /// when the write fails.
    pub fn save_snapshot(&self) -> Result<(), CacheError> {
        self.shared.persist()
    }

    fn mark_dirty(&self) {
        if let Some(persister) = &self.persister {
            persister.mark_dirty();
        }
    }
}

impl Default for EntityCache {
    fn default() -> Self {
        Self::in_memory()
    }
}
