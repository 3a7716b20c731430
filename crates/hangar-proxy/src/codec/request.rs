//! Request documents sent to the backend.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::EncodeError;
use crate::entity::EntityKind;

/// CRUD verb of a backend request.
///
/// Parses case-insensitively and serialises in uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum RequestVerb {
    /// Create entities.
    Create,
    /// Read entities.
    Read,
    /// Update entities.
    Update,
    /// Delete entities.
    Delete,
}

/// Entity reference in a request's `entities` list: an ID or an ID string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    /// Numeric identifier.
    Id(i64),
    /// Identifier as text.
    Text(String),
}

impl From<i64> for EntityRef {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for EntityRef {
    fn from(id: &str) -> Self {
        Self::Text(id.to_owned())
    }
}

impl From<String> for EntityRef {
    fn from(id: String) -> Self {
        Self::Text(id)
    }
}

/// A request document for one verb against one entity kind.
///
/// Defaults to no limit, all details and an empty entity list.
///
/// # Examples
///
/// ```
/// use hangar_proxy::{EntityKind, ProxyRequest};
///
/// let line = ProxyRequest::read(EntityKind::Facility).encode().unwrap();
/// assert_eq!(
///     line,
///     r#"{"type":"READ","entityName":"Facility","limit":-1,"requestingAllDetails":true,"entities":[]}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    #[serde(rename = "type")]
    verb: RequestVerb,
    entity_name: &'static str,
    limit: i64,
    requesting_all_details: bool,
    entities: Vec<EntityRef>,
}

impl ProxyRequest {
    /// Limit value meaning "no limit".
    pub const UNLIMITED: i64 = -1;

    /// Starts a request with default options.
    #[must_use]
    pub fn new(verb: RequestVerb, kind: EntityKind) -> Self {
        Self {
            verb,
            entity_name: kind.name(),
            limit: Self::UNLIMITED,
            requesting_all_details: true,
            entities: Vec::new(),
        }
    }

    /// Starts a `READ` request.
    #[must_use]
    pub fn read(kind: EntityKind) -> Self {
        Self::new(RequestVerb::Read, kind)
    }

    /// Caps the number of returned entities.
    #[must_use]
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the `requestingAllDetails` flag.
    #[must_use]
    pub fn all_details(mut self, all: bool) -> Self {
        self.requesting_all_details = all;
        self
    }

    /// Restricts the request to the given entity IDs.
    #[must_use]
    pub fn with_entities<I>(mut self, entities: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<EntityRef>,
    {
        self.entities = entities.into_iter().map(Into::into).collect();
        self
    }

    /// The request's verb.
    #[must_use]
    pub fn verb(&self) -> RequestVerb {
        self.verb
    }

    /// Kind name carried in `entityName`.
    #[must_use]
    pub fn entity_name(&self) -> &'static str {
        self.entity_name
    }

    /// Serialises the request to its single-line JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if serialisation fails.
    pub fn encode(&self) -> Result<String, EncodeError> {
        serde_json::to_string(self).map_err(|source| EncodeError {
            verb: self.verb.to_string(),
            entity_name: self.entity_name.to_owned(),
            source,
        })
    }
}
