use super::Security;
use crate::contract::{ApiKeyLocation, SecurityRequirement, SecurityScheme, SecuritySchemes};
use crate::server::Context;
use serde_json::json;
use std::collections::HashSet;
use tracing::debug;

/// Static API key check against a fixed key set.
///
/// # Example
///
/// ```rust
/// use gantry::contract::ApiKeyLocation;
/// use gantry::security::ApiKeySecurity;
///
/// let keys = ApiKeySecurity::new("api_key", ApiKeyLocation::Header, "X-API-Key")
///     .with_key("k-123");
/// ```
pub struct ApiKeySecurity {
    scheme: String,
    location: ApiKeyLocation,
    param: String,
    keys: HashSet<String>,
}

impl ApiKeySecurity {
    /// `scheme` names the contract entry, `param` the header, query parameter
    /// or cookie carrying the key.
    #[must_use]
    pub fn new(scheme: &str, location: ApiKeyLocation, param: &str) -> Self {
        Self {
            scheme: scheme.to_string(),
            location,
            param: param.to_string(),
            keys: HashSet::new(),
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: &str) -> Self {
        self.keys.insert(key.to_string());
        self
    }

    #[must_use]
    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys.extend(keys.into_iter().map(Into::into));
        self
    }

    fn extract<'c>(&self, ctx: &'c Context) -> Option<&'c str> {
        match self.location {
            ApiKeyLocation::Header => ctx.header(&self.param),
            ApiKeyLocation::Query => ctx.query(&self.param),
            ApiKeyLocation::Cookie => ctx.request().cookie(&self.param),
        }
    }
}

impl Security for ApiKeySecurity {
    fn auth(&self, ctx: &mut Context) {
        let Some(key) = self.extract(ctx) else {
            debug!(scheme = %self.scheme, "API key missing");
            ctx.abort_with_json(401, &json!({"error": "API key required"}));
            return;
        };
        if !self.keys.contains(key) {
            debug!(scheme = %self.scheme, "API key rejected");
            ctx.abort_with_json(401, &json!({"error": "Invalid API key"}));
        }
    }

    fn security_schemes(&self) -> SecuritySchemes {
        SecuritySchemes::from([(
            self.scheme.clone(),
            SecurityScheme::api_key(self.param.clone(), self.location),
        )])
    }

    fn security_requirement(&self) -> SecurityRequirement {
        SecurityRequirement::from([(self.scheme.clone(), Vec::new())])
    }
}
