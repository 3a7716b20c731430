//! Connection handler that maps gateway requests onto the dispatcher.

use std::io::{self, Read, Write};
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, warn};

use hangar_proxy::{BackendTransport, Dispatcher, EntityKind};

use super::{
    GATEWAY_TARGET, GatewayError, GatewayRequest, GatewayResponse, Method, ResponseWriter, Route,
};
use crate::transport::{ConnectionHandler, ConnectionStream, RequestReadError, read_request_line};

const ROOT_GREETING: &str = "Success!";

/// Serves one request per connection against a shared dispatcher.
pub struct GatewayHandler<T> {
    dispatcher: Arc<Dispatcher<T>>,
}

impl<T: BackendTransport> GatewayHandler<T> {
    /// Builds a handler over a dispatcher shared with other connections.
    pub fn new(dispatcher: Arc<Dispatcher<T>>) -> Self {
        Self { dispatcher }
    }

    /// Produces the response for one request. Never fails: every error
    /// becomes a response with the matching status.
    pub fn respond(&self, request: &GatewayRequest) -> GatewayResponse {
        let response = self
            .route(request)
            .unwrap_or_else(|error| GatewayResponse::from_error(&error));
        if response.status >= 500 {
            warn!(
                target: GATEWAY_TARGET,
                method = %request.method,
                path = %request.path,
                status = response.status,
                "request failed"
            );
        } else {
            debug!(
                target: GATEWAY_TARGET,
                method = %request.method,
                path = %request.path,
                status = response.status,
                "request served"
            );
        }
        response
    }

    fn route(&self, request: &GatewayRequest) -> Result<GatewayResponse, GatewayError> {
        let route = Route::parse(&request.path)?;
        match (route, request.known_method()) {
            (Route::Root, Some(Method::Get)) => Ok(GatewayResponse::ok(Value::from(ROOT_GREETING))),
            (Route::Healthcheck, Some(Method::Get)) => Ok(GatewayResponse::no_content()),
            (Route::Collection(kind), Some(Method::Get)) => self.list(kind),
            (Route::Collection(kind), Some(Method::Post)) => self.create(kind, request.body.as_ref()),
            (Route::Item(kind, id), Some(Method::Get)) => {
                let entity = self.dispatcher.get(kind, id)?;
                Ok(GatewayResponse::ok(serde_json::to_value(entity)?))
            }
            (Route::Item(kind, id), Some(Method::Delete)) => {
                self.dispatcher.delete(kind, id)?;
                Ok(GatewayResponse::ok(json!({"success": true})))
            }
            _ => Err(GatewayError::MethodNotAllowed {
                method: request.method.clone(),
                path: request.path.clone(),
            }),
        }
    }

    fn list(&self, kind: EntityKind) -> Result<GatewayResponse, GatewayError> {
        let entities = self.dispatcher.list(kind)?;
        Ok(GatewayResponse::ok(serde_json::to_value(entities)?))
    }

    fn create(&self, kind: EntityKind, body: Option<&Value>) -> Result<GatewayResponse, GatewayError> {
        let Some(Value::Object(fields)) = body else {
            return Err(GatewayError::malformed("create body must be a JSON object"));
        };
        let id = self.dispatcher.create(kind, fields.clone())?;
        Ok(GatewayResponse::ok(json!({"success": true, "ID": id})))
    }

    fn serve<S: Read + Write>(&self, stream: &mut S) -> io::Result<()> {
        let response = match read_request_line(stream) {
            Ok(Some(line)) => match GatewayRequest::parse(&line) {
                Ok(request) => self.respond(&request),
                Err(error) => {
                    debug!(target: GATEWAY_TARGET, error = %error, "malformed request line");
                    GatewayResponse::from_error(&error)
                }
            },
            Ok(None) => {
                debug!(target: GATEWAY_TARGET, "client disconnected without request");
                return Ok(());
            }
            Err(error @ RequestReadError::TooLarge { .. }) => {
                debug!(target: GATEWAY_TARGET, error = %error, "oversized request line");
                GatewayResponse::from_error(&GatewayError::malformed(error.to_string()))
            }
            Err(RequestReadError::Io(error)) => return Err(error),
        };
        ResponseWriter::new(stream).write(&response)
    }
}

impl<T: BackendTransport + 'static> ConnectionHandler for GatewayHandler<T> {
    fn handle(&self, mut stream: ConnectionStream) {
        if let Err(error) = self.serve(&mut stream) {
            warn!(target: GATEWAY_TARGET, error = %error, "gateway connection failed");
        }
    }
}
