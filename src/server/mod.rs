//! Per-request types and the HTTP transport.
//!
//! Handlers see a [`Context`] wrapping a transport-independent [`Request`];
//! [`HttpServer`] adapts real HTTP connections to the
//! [`LiveRouter`](crate::router::LiveRouter).

mod context;
mod http_server;
mod request;
mod response;

pub use context::Context;
pub use http_server::{HttpServer, ServerHandle, DEFAULT_MAX_BODY_BYTES};
pub use request::{parse_query, ParamVec, Request, MAX_INLINE_PARAMS};
pub use response::Response;
