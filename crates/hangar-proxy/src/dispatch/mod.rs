//! Per-verb orchestration of the cache and the backend.
//!
//! Reads are served from the cache once a kind is filled. A miss fetches the
//! whole kind from the backend and fills the cache with it. Creates and
//! deletes only touch the cache. Two concurrent misses on one kind may both
//! reach the backend; the cache keeps the first fill and ignores IDs it
//! already holds.

mod errors;

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

pub use self::errors::{DispatchError, RETRIEVAL_FAILED_MESSAGE};
use crate::cache::EntityCache;
use crate::client::BackendTransport;
use crate::codec::{ProxyRequest, ResponseDecoder};
use crate::entity::{Entity, EntityError, EntityKind, EntityRegistry, TYPE_KEY};

const DISPATCH_TARGET: &str = "hangar_proxy::dispatch";

/// Routes CRUD operations to the cache or the backend.
#[derive(Debug)]
pub struct Dispatcher<T> {
    registry: Arc<EntityRegistry>,
    cache: Arc<EntityCache>,
    transport: T,
}

impl<T: BackendTransport> Dispatcher<T> {
    /// Builds a dispatcher over shared registry and cache instances.
    pub fn new(registry: Arc<EntityRegistry>, cache: Arc<EntityCache>, transport: T) -> Self {
        Self {
            registry,
            cache,
            transport,
        }
    }

    /// Kind registry used to resolve create bodies.
    #[must_use]
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Shared cache.
    #[must_use]
    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    /// Lists every entity of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Backend`] when the backend cannot be reached
    /// and [`DispatchError::RetrievalFailed`] when its response does not
    /// decode. The cache is untouched in both cases.
    pub fn list(&self, kind: EntityKind) -> Result<Vec<Entity>, DispatchError> {
        if let Some(cached) = self.cache.get(kind)? {
            debug!(target: DISPATCH_TARGET, kind = %kind, count = cached.len(), "cache hit");
            return Ok(cached);
        }
        self.fetch(kind)
    }

    /// Returns the entity of `kind` with the given ID.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NotFound`] when no such entity exists, and
    /// the [`Dispatcher::list`] errors when the kind must be fetched first.
    pub fn get(&self, kind: EntityKind, id: i64) -> Result<Entity, DispatchError> {
        self.ensure_cached(kind)?;
        self.cache
            .lookup(kind, id)?
            .ok_or(DispatchError::NotFound { kind, id })
    }

    /// Creates an entity from a request body and returns its new ID.
    ///
    /// A `type` field in the body selects the kind, resolved by name or
    /// route; otherwise `kind` is used. The kind is fetched first when not
    /// cached, so new IDs follow the backend's.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownKind`] for an unresolvable `type`,
    /// [`DispatchError::InvalidEntity`] when the body does not fit the
    /// schema, and the [`Dispatcher::list`] errors from the initial fetch.
    pub fn create(&self, kind: EntityKind, mut body: Map<String, Value>) -> Result<i64, DispatchError> {
        let target = match body.remove(TYPE_KEY) {
            None => kind,
            Some(Value::String(name)) => self
                .registry
                .resolve(&name)
                .map_err(DispatchError::UnknownKind)?,
            Some(_) => {
                return Err(DispatchError::InvalidEntity(EntityError::MalformedEntity {
                    kind: kind.name().to_owned(),
                    reason: "`type` must be a string".to_owned(),
                }));
            }
        };

        self.ensure_cached(target)?;
        let id = self.cache.append(target, body)?;
        info!(target: DISPATCH_TARGET, kind = %target, id, "entity created");
        Ok(id)
    }

    /// Deletes the entity of `kind` with the given ID.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NotFound`] when no such entity exists, and
    /// the [`Dispatcher::list`] errors when the kind must be fetched first.
    pub fn delete(&self, kind: EntityKind, id: i64) -> Result<(), DispatchError> {
        self.ensure_cached(kind)?;
        if !self.cache.remove(kind, id)? {
            return Err(DispatchError::NotFound { kind, id });
        }
        info!(target: DISPATCH_TARGET, kind = %kind, id, "entity deleted");
        Ok(())
    }

    fn ensure_cached(&self, kind: EntityKind) -> Result<(), DispatchError> {
        if self.cache.contains(kind)? {
            return Ok(());
        }
        self.fetch(kind).map(drop)
    }

    fn fetch(&self, kind: EntityKind) -> Result<Vec<Entity>, DispatchError> {
        debug!(target: DISPATCH_TARGET, kind = %kind, "cache miss; fetching from backend");
        let request = ProxyRequest::read(kind).encode()?;
        let reply = self.transport.send(&request).inspect_err(|error| {
            warn!(target: DISPATCH_TARGET, kind = %kind, error = %error, "backend request failed");
        })?;

        let entities = ResponseDecoder::for_kind(&self.registry, kind)
            .decode(&reply)
            .map_err(|source| {
                warn!(
                    target: DISPATCH_TARGET,
                    kind = %kind,
                    error = %source,
                    "backend response rejected"
                );
                DispatchError::RetrievalFailed { kind, source }
            })?;

        self.cache.fill(kind, entities.clone())?;
        debug!(target: DISPATCH_TARGET, kind = %kind, count = entities.len(), "kind cached");
        Ok(entities)
    }
}
