//! JSONL route adapter in front of the dispatcher.
//!
//! Each connection carries one request line of the form
//! `{"method": "GET", "path": "/facility/42", "body": null}` and receives one
//! line `{"status": 200, "body": ...}` before the gateway closes it. Paths
//! follow the HTTP surface the gateway replaces:
//!
//! | Method | Path | Outcome |
//! |---|---|---|
//! | `GET` | `/` | `200 "Success!"` |
//! | `GET` | `/healthcheck` | `204 null` |
//! | `GET` | `/<route>` | every entity of the kind |
//! | `POST` | `/<route>` | `{"success": true, "ID": n}` |
//! | `GET` | `/<route>/<id>` | one entity |
//! | `DELETE` | `/<route>/<id>` | `{"success": true}` |

mod errors;
mod handler;
mod request;
mod response;
mod routes;

pub use self::errors::GatewayError;
pub use self::handler::GatewayHandler;
pub use self::request::{GatewayRequest, Method};
pub use self::response::{GatewayResponse, ResponseWriter};
pub use self::routes::Route;

const GATEWAY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::gateway");
