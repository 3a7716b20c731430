//! Proxy client and read cache for the hangar entity service.
//!
//! The data service behind the gateway is reachable only through a compact,
//! JSON-over-TCP protocol served by a pool of listener ports. This crate holds
//! everything needed to talk to it and to shield it from repeated reads:
//!
//! - [`ports`] resolves a port hint and listener count into the concrete port
//!   pool, and hands ports out round-robin.
//! - [`client`] opens one connection per request to the next port in the pool
//!   and returns the raw response text.
//! - [`codec`] encodes CRUD requests and decodes backend documents into typed
//!   [`Entity`] values.
//! - [`entity`] defines the eight entity kinds, their field schemas and the
//!   registry that maps kind names onto them.
//! - [`cache`] keeps one ID-unique sequence per kind, filled lazily and
//!   snapshotted to disk by a background worker.
//! - [`dispatch`] decides, per CRUD verb, whether a request is served from the
//!   cache or falls through to the backend.
//!
//! ## Request flow
//!
//! ```text
//! gateway -> Dispatcher -> EntityCache (hit)
//!                       -> ProxyRequest + ProxyClient -> ResponseDecoder -> EntityCache::fill
//! ```
//!
//! Creates and deletes only touch the cache; every mutation marks the cache
//! dirty and the persistence worker rewrites the snapshot shortly after.

pub mod cache;
pub mod client;
pub mod codec;
pub mod dispatch;
pub mod entity;
pub mod ports;

pub use cache::{CacheError, EntityCache};
pub use client::{BackendTransport, ClientError, ProxyClient};
pub use codec::{DecodeError, EncodeError, EntityRef, ProxyRequest, RequestVerb, ResponseDecoder};
pub use dispatch::{DispatchError, Dispatcher, RETRIEVAL_FAILED_MESSAGE};
pub use entity::{Entity, EntityError, EntityKind, EntityRegistry, FieldSpec, FieldType};
pub use ports::{PortError, PortPool, PortSpec, PortValue, find_ports};
