//! # Router Module
//!
//! The live half of registration: method + path templates mapped to handler
//! chains.
//!
//! ## Overview
//!
//! [`RouteTable`] is the collaborator interface the
//! [`Registry`](crate::registry::Registry) registers against; [`LiveRouter`]
//! is the bundled implementation, a radix tree over path segments.
//!
//! Templates use gin-style markers:
//!
//! | Segment | Matches |
//! |---------|---------|
//! | `users` | exactly `users` |
//! | `:id` | any single segment, captured as `id` |
//! | `*path` | the rest of the path (last segment only), captured as `path` |
//!
//! ## Example
//!
//! ```rust
//! use gantry::router::{handler, LiveRouter, RouteTable};
//! use gantry::server::Request;
//! use http::Method;
//!
//! let mut router = LiveRouter::new();
//! router
//!     .handle(
//!         Method::GET,
//!         "/users/:id",
//!         vec![handler(|ctx| {
//!             let id = ctx.param("id").unwrap_or_default().to_string();
//!             ctx.text(200, &id);
//!         })],
//!     )
//!     .unwrap();
//!
//! let res = router.dispatch(Request::new(Method::GET, "/users/42"));
//! assert_eq!(res.body, b"42");
//! ```

mod core;
mod error;
mod radix;
#[cfg(test)]
mod tests;

pub use core::{handler, Handler, LiveRouter, Route, RouteMatch, RouteTable};
pub use error::RouterError;
