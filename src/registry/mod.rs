//! # Registry Module
//!
//! Declarative service registration feeding both the live router and the
//! contract document.
//!
//! ## Overview
//!
//! A [`Service`] groups [`Route`]s under a tag, a base path and an optional
//! default [`Security`](crate::security::Security). Each route carries a
//! [`RequestSpec`] and [`ResponseSpec`] describing its parameters and bodies
//! with reflectable example values, plus the handler that serves it.
//!
//! [`Registry::register`] walks the routes and for each one:
//!
//! 1. resolves the full path (absolute route paths win, relative ones join the
//!    service path) and its contract form (`/users/:id` → `/users/{id}`)
//! 2. rejects duplicate method + path pairs, double bodies and bodies on
//!    GET/HEAD
//! 3. compiles parameters and body content, merging component schemas
//! 4. applies security (route first, then service, [`NoSecurity`] opts out):
//!    requirement and schemes in the contract, a permission code in the
//!    summary, the auth check in front of the handler
//! 5. registers the chain with the router
//!
//! Errors are returned, never panicked; startup code decides whether to abort.
//!
//! [`NoSecurity`]: crate::security::NoSecurity

mod core;
mod error;
mod extract;
mod permission;
mod service;
#[cfg(test)]
mod tests;

pub use core::{contract_path, full_path, route_key, ContractHandle, Registry};
pub use error::RegistryError;
pub use extract::template_params;
pub use permission::{permission_code, Permission};
pub use service::{RequestSpec, ResponseSpec, Route, RouteHandler, Service, Shape};
