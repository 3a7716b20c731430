//! Gateway responses and their wire framing.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;

use super::GatewayError;

/// One response line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// JSON payload.
    pub body: Value,
}

impl GatewayResponse {
    /// `200` with a body.
    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    /// `204` with a null body.
    #[must_use]
    pub fn no_content() -> Self {
        Self {
            status: 204,
            body: Value::Null,
        }
    }

    /// Response describing a failure.
    #[must_use]
    pub fn from_error(error: &GatewayError) -> Self {
        Self {
            status: error.status(),
            body: error.body(),
        }
    }
}

/// Writes responses as newline-terminated JSON.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Wraps an output stream.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one response line and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub fn write(&mut self, response: &GatewayResponse) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, response)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}
