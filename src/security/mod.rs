//! # Security Module
//!
//! Pluggable authentication for routes and services.
//!
//! ## Overview
//!
//! A [`Security`] capability contributes two things at registration time:
//!
//! 1. **Runtime check**: [`Security::auth`] runs before the route's handler and
//!    may abort the chain (typically with a 401).
//! 2. **Contract metadata**: the scheme definitions it relies on
//!    ([`Security::security_schemes`]) and the requirement attached to each
//!    secured operation ([`Security::security_requirement`]).
//!
//! Routes inherit their service's security unless they set their own. The
//! [`NoSecurity`] sentinel opts a single route out of an inherited default.
//!
//! ## Providers
//!
//! - [`JwtAuth`] - HMAC-signed bearer tokens carrying a typed principal
//! - [`ApiKeySecurity`] - static keys from a header, query parameter or cookie
//!
//! ## Example
//!
//! ```rust
//! use gantry::security::{JwtAlgorithm, JwtAuth};
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//!
//! #[derive(Clone, Serialize, Deserialize)]
//! struct User {
//!     id: u64,
//! }
//!
//! let auth = JwtAuth::<User>::new("secret", "user_auth", JwtAlgorithm::HS256, Duration::from_secs(3600));
//! let token = auth.generate_token(&User { id: 7 }).unwrap();
//! assert_eq!(auth.parse_token(&token).unwrap().id, 7);
//! ```

mod api_key;
mod error;
mod jwt;

pub use api_key::ApiKeySecurity;
pub use error::AuthError;
pub use jwt::{JwtAlgorithm, JwtAuth};

use crate::contract::{SecurityRequirement, SecuritySchemes};
use crate::server::Context;
use std::sync::Arc;

/// Authentication capability attached to routes or services.
pub trait Security: Send + Sync {
    /// Per-request check. Abort `ctx` to reject the request.
    fn auth(&self, ctx: &mut Context);

    /// Scheme definitions this capability needs in `components.securitySchemes`.
    fn security_schemes(&self) -> SecuritySchemes;

    /// Requirement added to every operation it protects.
    fn security_requirement(&self) -> SecurityRequirement;

    /// True only for the [`NoSecurity`] sentinel.
    fn is_noop(&self) -> bool {
        false
    }
}

/// Sentinel that disables security for a route, including an inherited
/// service default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSecurity;

impl NoSecurity {
    /// Shared handle, convenient for `Route::security`.
    #[must_use]
    pub fn shared() -> Arc<dyn Security> {
        Arc::new(NoSecurity)
    }
}

impl Security for NoSecurity {
    fn auth(&self, _ctx: &mut Context) {}

    fn security_schemes(&self) -> SecuritySchemes {
        SecuritySchemes::new()
    }

    fn security_requirement(&self) -> SecurityRequirement {
        SecurityRequirement::new()
    }

    fn is_noop(&self) -> bool {
        true
    }
}
