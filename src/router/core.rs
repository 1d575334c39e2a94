use super::error::RouterError;
use super::radix::RadixTree;
use crate::server::{Context, ParamVec, Request, Response};
use http::Method;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// One link of a handler chain.
pub type Handler = Arc<dyn Fn(&mut Context) + Send + Sync>;

/// Wrap a closure or function as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&mut Context) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Collaborator that accepts route registrations.
///
/// `path` uses `:name` for named segments and `*name` for a trailing
/// catch-all. Handlers in `chain` run in order until one aborts.
pub trait RouteTable {
    /// # Errors
    ///
    /// [`RouterError::Conflict`] when `method` is already registered on `path`,
    /// [`RouterError::InvalidPath`] for a malformed template.
    fn handle(&mut self, method: Method, path: &str, chain: Vec<Handler>) -> Result<(), RouterError>;
}

/// A registered route.
pub struct Route {
    pub method: Method,
    /// Full template including the mount prefix, e.g. `/api/users/:id`.
    pub pattern: String,
    pub chain: Vec<Handler>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("handlers", &self.chain.len())
            .finish()
    }
}

/// Result of successfully matching a request path to a route
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    /// Captured `:name` / `*name` values.
    pub path_params: ParamVec,
}

impl RouteMatch {
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Radix-tree router that executes handler chains.
///
/// Built during startup through [`RouteTable::handle`], then shared read-only
/// (typically behind an `Arc`) by the transport.
#[derive(Default)]
pub struct LiveRouter {
    tree: RadixTree,
    prefix: String,
    routes: Vec<(Method, String)>,
}

impl LiveRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Router mounting every route under `prefix` (e.g. `/api`).
    #[must_use]
    pub fn with_prefix(prefix: &str) -> Self {
        let trimmed = prefix.trim_matches('/');
        Self {
            prefix: if trimmed.is_empty() {
                String::new()
            } else {
                format!("/{trimmed}")
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered `(method, pattern)` pairs in registration order.
    #[must_use]
    pub fn routes(&self) -> &[(Method, String)] {
        &self.routes
    }

    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let (route, path_params) = self.tree.search(method, path)?;
        Some(RouteMatch { route, path_params })
    }

    /// Run the matching chain for `request`.
    ///
    /// Unmatched requests get a JSON 404.
    #[must_use]
    pub fn dispatch(&self, request: Request) -> Response {
        let Some(matched) = self.route(&request.method, &request.path) else {
            debug!(method = %request.method, path = %request.path, "No route matched");
            return Response::json(404, &serde_json::json!({"error": "Not Found"}));
        };

        let mut ctx = Context::new(request, matched.path_params);
        let request_id = ctx.request_id();
        debug!(
            %request_id,
            method = %matched.route.method,
            route_pattern = %matched.route.pattern,
            "Route matched"
        );
        for link in &matched.route.chain {
            link(&mut ctx);
            if ctx.is_aborted() {
                debug!(%request_id, status = ctx.response().status, "Handler chain aborted");
                break;
            }
        }
        ctx.into_response()
    }
}

impl RouteTable for LiveRouter {
    fn handle(&mut self, method: Method, path: &str, chain: Vec<Handler>) -> Result<(), RouterError> {
        let pattern = match path.trim_start_matches('/') {
            "" if self.prefix.is_empty() => "/".to_string(),
            "" => self.prefix.clone(),
            rest => format!("{}/{}", self.prefix, rest),
        };
        let route = Arc::new(Route {
            method: method.clone(),
            pattern: pattern.clone(),
            chain,
        });
        self.tree.insert(method.clone(), route)?;
        info!(method = %method, route_pattern = %pattern, "Route registered");
        self.routes.push((method, pattern));
        Ok(())
    }
}
