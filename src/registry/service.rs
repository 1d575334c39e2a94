use crate::contract::Content;
use crate::router::Handler;
use crate::schema::Reflect;
use crate::security::Security;
use std::fmt;
use std::sync::Arc;

/// Reflectable value stored in a request or response description.
pub type Shape = Box<dyn Reflect + Send + Sync>;

/// What a route accepts.
///
/// Each source is an example value whose type describes the shape; only the
/// type matters, except for string-keyed maps and `serde_json::Value`, whose
/// current entries are described.
#[derive(Default)]
pub struct RequestSpec {
    pub description: String,
    /// Header parameters, named through the `header` namespace.
    pub header: Option<Shape>,
    /// Query parameters, named through the `form` namespace.
    pub query: Option<Shape>,
    /// Refines parameters taken from the path template (`path` namespace).
    pub path: Option<Shape>,
    /// `application/json` body.
    pub json: Option<Shape>,
    /// `application/x-www-form-urlencoded` body, or `multipart/form-data` when
    /// any property is binary.
    pub form: Option<Shape>,
    /// `application/xml` body.
    pub xml: Option<Shape>,
    /// Raw content map, merged over whatever the typed body produced.
    pub contents: Content,
}

impl RequestSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    #[must_use]
    pub fn header<T: Reflect + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.header = Some(Box::new(value));
        self
    }

    #[must_use]
    pub fn query<T: Reflect + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.query = Some(Box::new(value));
        self
    }

    #[must_use]
    pub fn path<T: Reflect + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.path = Some(Box::new(value));
        self
    }

    #[must_use]
    pub fn json<T: Reflect + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.json = Some(Box::new(value));
        self
    }

    #[must_use]
    pub fn form<T: Reflect + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.form = Some(Box::new(value));
        self
    }

    #[must_use]
    pub fn xml<T: Reflect + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.xml = Some(Box::new(value));
        self
    }

    #[must_use]
    pub fn contents(mut self, contents: Content) -> Self {
        self.contents.extend(contents);
        self
    }

    /// Number of typed bodies declared.
    pub(crate) fn body_kinds(&self) -> usize {
        [&self.json, &self.form, &self.xml]
            .iter()
            .filter(|b| b.is_some())
            .count()
    }

    pub(crate) fn has_body(&self) -> bool {
        self.body_kinds() > 0 || !self.contents.is_empty()
    }
}

/// What a route returns.
pub struct ResponseSpec {
    /// Status code the content is documented under.
    pub status: u16,
    pub description: String,
    pub json: Option<Shape>,
    pub xml: Option<Shape>,
    pub contents: Content,
}

impl Default for ResponseSpec {
    fn default() -> Self {
        Self {
            status: 200,
            description: String::new(),
            json: None,
            xml: None,
            contents: Content::new(),
        }
    }
}

impl ResponseSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    #[must_use]
    pub fn json<T: Reflect + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.json = Some(Box::new(value));
        self
    }

    #[must_use]
    pub fn xml<T: Reflect + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.xml = Some(Box::new(value));
        self
    }

    #[must_use]
    pub fn contents(mut self, contents: Content) -> Self {
        self.contents.extend(contents);
        self
    }
}

/// Request and response descriptions plus the function that serves them.
pub struct RouteHandler {
    pub request: RequestSpec,
    pub response: ResponseSpec,
    pub handle: Handler,
}

impl RouteHandler {
    #[must_use]
    pub fn new(handle: Handler) -> Self {
        Self {
            request: RequestSpec::default(),
            response: ResponseSpec::default(),
            handle,
        }
    }
}

/// One operation of a [`Service`].
pub struct Route {
    /// HTTP method, any case.
    pub method: String,
    /// Absolute (`/health`) or relative to the service path (`:id`, `""`).
    pub path: String,
    pub summary: String,
    pub description: String,
    pub deprecated: bool,
    /// Overrides the service default. [`NoSecurity`](crate::security::NoSecurity)
    /// opts out of it.
    pub security: Option<Arc<dyn Security>>,
    pub handler: RouteHandler,
}

impl Route {
    #[must_use]
    pub fn new(method: &str, path: &str, handle: Handler) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            summary: String::new(),
            description: String::new(),
            deprecated: false,
            security: None,
            handler: RouteHandler::new(handle),
        }
    }

    #[must_use]
    pub fn get(path: &str, handle: Handler) -> Self {
        Self::new("GET", path, handle)
    }

    #[must_use]
    pub fn post(path: &str, handle: Handler) -> Self {
        Self::new("POST", path, handle)
    }

    #[must_use]
    pub fn put(path: &str, handle: Handler) -> Self {
        Self::new("PUT", path, handle)
    }

    #[must_use]
    pub fn delete(path: &str, handle: Handler) -> Self {
        Self::new("DELETE", path, handle)
    }

    #[must_use]
    pub fn summary(mut self, summary: &str) -> Self {
        self.summary = summary.to_string();
        self
    }

    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    #[must_use]
    pub fn request(mut self, request: RequestSpec) -> Self {
        self.handler.request = request;
        self
    }

    #[must_use]
    pub fn response(mut self, response: ResponseSpec) -> Self {
        self.handler.response = response;
        self
    }

    /// Same route, protected by `security`.
    #[must_use]
    pub fn with_security(mut self, security: Arc<dyn Security>) -> Self {
        self.security = Some(security);
        self
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("summary", &self.summary)
            .field("secured", &self.security.is_some())
            .finish()
    }
}

/// Named group of routes sharing a tag, base path and default security.
pub struct Service {
    pub tag: String,
    pub description: String,
    /// Base path for relative route paths, e.g. `/users`.
    pub path: String,
    /// Inherited by routes without their own security.
    pub security: Option<Arc<dyn Security>>,
    pub routes: Vec<Route>,
}

impl Service {
    #[must_use]
    pub fn new(tag: &str, path: &str) -> Self {
        Self {
            tag: tag.to_string(),
            description: String::new(),
            path: path.to_string(),
            security: None,
            routes: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    #[must_use]
    pub fn security(mut self, security: Arc<dyn Security>) -> Self {
        self.security = Some(security);
        self
    }

    #[must_use]
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("tag", &self.tag)
            .field("path", &self.path)
            .field("routes", &self.routes)
            .finish()
    }
}
