//! Name-to-kind resolution.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::kind::TYPE_KEY;
use super::{Entity, EntityError, EntityKind};

/// Maps kind names and route names onto [`EntityKind`]s.
///
/// Lookups are case-insensitive. The registry is built once at startup and
/// shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    kinds: Vec<EntityKind>,
    by_name: BTreeMap<String, EntityKind>,
}

impl EntityRegistry {
    /// Registers the given kinds under their names and routes.
    pub fn new(kinds: impl IntoIterator<Item = EntityKind>) -> Self {
        let mut registry = Self {
            kinds: Vec::new(),
            by_name: BTreeMap::new(),
        };
        for kind in kinds {
            if registry.kinds.contains(&kind) {
                continue;
            }
            registry.kinds.push(kind);
            registry
                .by_name
                .insert(kind.name().to_ascii_lowercase(), kind);
            registry.by_name.insert(kind.route().to_owned(), kind);
        }
        registry
    }

    /// Registry holding all eight kinds.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(EntityKind::ALL)
    }

    /// Registered kinds in registration order.
    #[must_use]
    pub fn kinds(&self) -> &[EntityKind] {
        &self.kinds
    }

    /// Resolves a kind from its name or route.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::UnknownEntityKind`] when nothing matches.
    pub fn resolve(&self, name: &str) -> Result<EntityKind, EntityError> {
        self.by_name
            .get(&name.trim().to_ascii_lowercase())
            .copied()
            .ok_or_else(|| EntityError::unknown(name))
    }

    /// Reconstructs a typed entity from a document tagged with `type`.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::MalformedEntity`] when the tag is missing or
    /// not a string, [`EntityError::UnknownEntityKind`] when it does not
    /// resolve, and schema errors from [`EntityKind::decode`].
    pub fn reconstruct(&self, mut document: Map<String, Value>) -> Result<Entity, EntityError> {
        let kind = match document.remove(TYPE_KEY) {
            Some(Value::String(name)) => self.resolve(&name)?,
            Some(_) => {
                return Err(EntityError::malformed(
                    "entity",
                    "`type` tag must be a string",
                ));
            }
            None => return Err(EntityError::malformed("entity", "missing `type` tag")),
        };
        kind.decode(document)
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
