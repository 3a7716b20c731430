//! Gateway request lines.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use super::GatewayError;

/// Methods the route table knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Read a collection or a single entity.
    Get,
    /// Create an entity.
    Post,
    /// Delete an entity.
    Delete,
}

impl FromStr for Method {
    type Err = GatewayError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "DELETE" => Ok(Self::Delete),
            other => Err(GatewayError::malformed(format!("unknown method `{other}`"))),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        })
    }
}

/// One request read from a gateway connection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayRequest {
    /// HTTP-style method name.
    pub method: String,
    /// Request path, e.g. `/customer/3`.
    pub path: String,
    /// Create payload; ignored by other methods.
    #[serde(default)]
    pub body: Option<Value>,
}

impl GatewayRequest {
    /// Builds a request without a body.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            body: None,
        }
    }

    /// Attaches a body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Parses a request line.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MalformedRequest`] when the line is not a JSON
    /// object with string `method` and `path` fields.
    pub fn parse(line: &[u8]) -> Result<Self, GatewayError> {
        serde_json::from_slice(line).map_err(|error| GatewayError::malformed(error.to_string()))
    }

    /// Method, when it is one the route table knows.
    #[must_use]
    pub fn known_method(&self) -> Option<Method> {
        self.method.parse().ok()
    }
}
