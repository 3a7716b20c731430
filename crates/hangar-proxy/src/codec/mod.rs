//! Wire codec for the backend protocol.
//!
//! Requests are single JSON objects:
//!
//! ```json
//! {"type": "READ", "entityName": "Facility", "limit": -1,
//!  "requestingAllDetails": true, "entities": []}
//! ```
//!
//! Responses carry an `error` string, empty on success, and a list of
//! camelCase entity documents in which the entity's own identifier appears as
//! `<kind>Id`.

mod case;
mod errors;
mod request;
mod response;

pub use self::case::to_snake_case;
pub use self::errors::{DecodeError, EncodeError};
pub use self::request::{EntityRef, ProxyRequest, RequestVerb};
pub use self::response::ResponseDecoder;
