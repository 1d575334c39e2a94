//! # Contract Module
//!
//! In-memory model of the generated API contract (an OpenAPI 3.0 document).
//!
//! ## Overview
//!
//! The [`ContractDocument`] is mutated only by the
//! [`Registry`](crate::registry::Registry) while services are registered. Once
//! registration is finished it is frozen behind an `Arc` and read concurrently,
//! e.g. by the docs service serving `openapi.json`.
//!
//! All maps in the document are ordered, so serializing an unchanged document
//! twice produces byte-identical output.
//!
//! ## Example
//!
//! ```rust
//! use gantry::contract::{ContractDocument, Info};
//!
//! let doc = ContractDocument::new(Info {
//!     title: "Admin API".into(),
//!     version: "1.0.0".into(),
//!     ..Info::default()
//! });
//! let json = doc.to_json().unwrap();
//! assert!(json.starts_with(r#"{"openapi":"3.0.0""#));
//! ```

pub mod contents;
mod types;

pub use types::{
    ApiKeyLocation, Components, Contact, Content, ContractDocument, Info, License, MediaType,
    OAuthFlow, OAuthFlows, Operation, Parameter, ParameterLocation, PathItem, RequestBody,
    ResponseBody, SecurityRequirement, SecurityRoute, SecurityScheme, SecuritySchemeType,
    SecuritySchemes, Server, Tag,
};

use crate::schema::Schema;
use std::collections::BTreeMap;
use std::fmt;

/// OpenAPI version emitted by default.
pub const OPENAPI_VERSION: &str = "3.0.0";

/// A security scheme name is already defined differently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeConflict {
    pub name: String,
}

impl fmt::Display for SchemeConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "security scheme '{}' is already defined", self.name)
    }
}

impl std::error::Error for SchemeConflict {}

impl ContractDocument {
    /// Empty document with the default OpenAPI version.
    #[must_use]
    pub fn new(info: Info) -> Self {
        Self {
            openapi: OPENAPI_VERSION.to_string(),
            info,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_servers(mut self, servers: Vec<Server>) -> Self {
        self.servers = servers;
        self
    }

    /// Merge component schemas discovered by a compilation pass.
    ///
    /// Names are unique per type, route scope and field namespace, so an
    /// existing entry under the same name describes the same shape and is
    /// simply replaced.
    pub fn add_schemas(&mut self, schemas: BTreeMap<String, Schema>) {
        self.components.schemas.extend(schemas);
    }

    /// Add one security scheme.
    ///
    /// Returns `Ok(false)` when an identical definition already exists under
    /// `name`.
    ///
    /// # Errors
    ///
    /// [`SchemeConflict`] when `name` is defined with a different definition.
    pub fn insert_security_scheme(
        &mut self,
        name: &str,
        scheme: SecurityScheme,
    ) -> Result<bool, SchemeConflict> {
        match self.components.security_schemes.get(name) {
            Some(existing) if *existing == scheme => Ok(false),
            Some(_) => Err(SchemeConflict {
                name: name.to_string(),
            }),
            None => {
                self.components
                    .security_schemes
                    .insert(name.to_string(), scheme);
                Ok(true)
            }
        }
    }

    /// Pre-register security schemes, independent of any route.
    ///
    /// # Errors
    ///
    /// [`SchemeConflict`] for the first name that is already present. Nothing is
    /// inserted in that case.
    pub fn merge_security_schemes(&mut self, schemes: SecuritySchemes) -> Result<(), SchemeConflict> {
        if let Some(name) = schemes
            .keys()
            .find(|name| self.components.security_schemes.contains_key(*name))
        {
            return Err(SchemeConflict { name: name.clone() });
        }
        self.components.security_schemes.extend(schemes);
        Ok(())
    }

    #[must_use]
    pub fn operation(&self, path: &str, method: &str) -> Option<&Operation> {
        self.paths
            .get(path)
            .and_then(|item| item.get(&method.to_ascii_lowercase()))
    }

    #[must_use]
    pub fn has_operation(&self, path: &str, method: &str) -> bool {
        self.operation(path, method).is_some()
    }

    /// Secured operations grouped by their first tag.
    #[must_use]
    pub fn security_routes(&self) -> BTreeMap<String, Vec<SecurityRoute>> {
        let mut routes: BTreeMap<String, Vec<SecurityRoute>> = BTreeMap::new();
        for (path, item) in &self.paths {
            for (method, op) in item {
                if op.security.is_empty() {
                    continue;
                }
                let tag = op.tags.first().cloned().unwrap_or_default();
                routes.entry(tag).or_default().push(SecurityRoute {
                    method: method.clone(),
                    path: path.clone(),
                });
            }
        }
        routes
    }

    /// Compact JSON rendering.
    ///
    /// # Errors
    ///
    /// Only if serialization fails, which the document's types do not do in
    /// practice.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Indented JSON rendering, used by the `contract` command.
    ///
    /// # Errors
    ///
    /// See [`to_json`](Self::to_json).
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
