use super::error::RegistryError;
use super::extract::Extractor;
use super::permission::Permission;
use super::service::{Route, Service};
use crate::contract::{ContractDocument, Operation, RequestBody, ResponseBody, Tag};
use crate::router::{handler, Handler, RouteTable};
use crate::schema::SchemaCompiler;
use crate::security::Security;
use http::Method;
use once_cell::sync::OnceCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Resolve a route path against its service's base path.
///
/// Absolute route paths are used as-is, an empty one stands for the base path,
/// anything else is joined to the base with a single `/`.
#[must_use]
pub fn full_path(base: &str, route: &str) -> String {
    if route.starts_with('/') {
        return route.to_string();
    }
    let base = base.trim_end_matches('/');
    match (base.is_empty(), route.is_empty()) {
        (true, true) => "/".to_string(),
        (false, true) => base.to_string(),
        (true, false) => format!("/{route}"),
        (false, false) => format!("{base}/{route}"),
    }
}

/// Router template to contract path: `:id` and `*rest` become `{id}`, `{rest}`.
#[must_use]
pub fn contract_path(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.strip_prefix([':', '*']) {
            Some(name) => format!("{{{name}}}"),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Per-route scope for schema naming, e.g. `users-id-get` for `GET /users/:id`.
#[must_use]
pub fn route_key(full_path: &str, method: &str) -> String {
    let mut parts: Vec<String> = full_path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.trim_start_matches([':', '*'])
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
                .collect()
        })
        .collect();
    parts.push(method.to_ascii_lowercase());
    parts.join("-")
}

fn is_read_only(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

/// Shared slot holding the finished contract document.
///
/// Clones observe the same slot. It is empty until [`Registry::finish`]
/// publishes the document, so services registered earlier (such as the docs
/// service) can hold a handle before the document exists.
#[derive(Clone, Default)]
pub struct ContractHandle {
    slot: Arc<OnceCell<Arc<ContractDocument>>>,
}

impl ContractHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self) -> Option<&Arc<ContractDocument>> {
        self.slot.get()
    }

    #[must_use]
    pub fn is_published(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Returns `false` if a document was already published.
    pub fn publish(&self, document: Arc<ContractDocument>) -> bool {
        self.slot.set(document).is_ok()
    }
}

/// Everything about a route that is decided before anything is mutated.
struct PreparedRoute {
    method: Method,
    full_path: String,
    contract_path: String,
    operation: Operation,
    definitions: BTreeMap<String, crate::schema::Schema>,
    security: Option<Arc<dyn Security>>,
    permission: Option<Permission>,
    handle: Handler,
}

/// Merges services into a contract document and a live router.
///
/// Registration is a startup step: call [`register`](Self::register) for every
/// service group, then [`finish`](Self::finish) to freeze the document and get
/// the router back.
///
/// ```rust
/// use gantry::contract::{ContractDocument, Info};
/// use gantry::registry::{Registry, Route, Service};
/// use gantry::router::{handler, LiveRouter};
///
/// let mut registry = Registry::new(ContractDocument::new(Info::default()), LiveRouter::new());
/// registry
///     .register([Service::new("Health", "/health")
///         .route(Route::get("", handler(|ctx| ctx.text(200, "ok"))))])
///     .unwrap();
/// let (doc, router) = registry.finish();
/// assert!(doc.has_operation("/health", "get"));
/// assert_eq!(router.len(), 1);
/// ```
pub struct Registry<R: RouteTable> {
    document: ContractDocument,
    router: R,
    compiler: SchemaCompiler,
    permissions: BTreeMap<String, Vec<Permission>>,
    // handler address -> permission code of the route that owns it
    secured_handlers: HashMap<usize, String>,
    contract: ContractHandle,
}

impl<R: RouteTable> Registry<R> {
    /// Registry over the process-wide schema name table.
    pub fn new(document: ContractDocument, router: R) -> Self {
        Self {
            document,
            router,
            compiler: SchemaCompiler::global(),
            permissions: BTreeMap::new(),
            secured_handlers: HashMap::new(),
            contract: ContractHandle::new(),
        }
    }

    #[must_use]
    pub fn with_compiler(mut self, compiler: SchemaCompiler) -> Self {
        self.compiler = compiler;
        self
    }

    /// Handle that receives the document on [`finish`](Self::finish).
    #[must_use]
    pub fn contract_handle(&self) -> ContractHandle {
        self.contract.clone()
    }

    #[must_use]
    pub fn document(&self) -> &ContractDocument {
        &self.document
    }

    /// Mutable access for pre-registration setup, such as
    /// [`ContractDocument::merge_security_schemes`].
    pub fn document_mut(&mut self) -> &mut ContractDocument {
        &mut self.document
    }

    #[must_use]
    pub fn router(&self) -> &R {
        &self.router
    }

    /// Permissions of all secured routes, grouped by service tag.
    #[must_use]
    pub fn permissions(&self) -> &BTreeMap<String, Vec<Permission>> {
        &self.permissions
    }

    /// Register services in order, stopping at the first error.
    ///
    /// Routes registered before the failing one stay registered; the failing
    /// route itself leaves neither the document nor the router changed.
    ///
    /// # Errors
    ///
    /// Any [`RegistryError`]; all of them are configuration mistakes.
    pub fn register<I>(&mut self, services: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = Service>,
    {
        for service in services {
            self.register_service(service)?;
        }
        Ok(())
    }

    /// Register a single service.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn register_service(&mut self, service: Service) -> Result<(), RegistryError> {
        let Service {
            tag,
            description,
            path,
            security,
            routes,
        } = service;

        self.document.tags.push(Tag {
            name: tag.clone(),
            description,
        });

        let count = routes.len();
        for route in routes {
            let prepared = self
                .prepare(&tag, &path, security.as_ref(), route)
                .inspect_err(|e| error!(service = %tag, error = %e, "Route rejected"))?;
            self.commit(&tag, prepared)
                .inspect_err(|e| error!(service = %tag, error = %e, "Route rejected"))?;
        }
        info!(service = %tag, base_path = %path, routes = count, "Service registered");
        Ok(())
    }

    /// Validate a route and compute its contract entry without mutating
    /// the document, the router or the permission table.
    fn prepare(
        &self,
        tag: &str,
        base: &str,
        service_security: Option<&Arc<dyn Security>>,
        route: Route,
    ) -> Result<PreparedRoute, RegistryError> {
        let Route {
            method,
            path: route_path,
            summary,
            description,
            deprecated,
            security,
            handler: route_handler,
        } = route;

        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes()).map_err(|_| {
            RegistryError::InvalidMethod {
                service: tag.to_string(),
                method: method.clone(),
            }
        })?;
        let lower = method.as_str().to_ascii_lowercase();

        let full_path = full_path(base, &route_path);
        let contract_path = contract_path(&full_path);

        if self.document.has_operation(&contract_path, &lower) {
            return Err(RegistryError::DuplicateRoute {
                service: tag.to_string(),
                path: route_path,
                method: lower,
            });
        }

        let request = &route_handler.request;
        if request.body_kinds() > 1 {
            return Err(RegistryError::MultipleBodies {
                service: tag.to_string(),
                path: route_path,
                method: lower,
            });
        }
        if is_read_only(&method) && request.has_body() {
            return Err(RegistryError::BodyOnReadOnlyMethod {
                service: tag.to_string(),
                path: route_path,
                method: lower,
            });
        }

        let security = security
            .or_else(|| service_security.cloned())
            .filter(|s| !s.is_noop());

        let mut permission = None;
        if let Some(security) = &security {
            for (name, scheme) in security.security_schemes() {
                if let Some(existing) = self.document.components.security_schemes.get(&name) {
                    if *existing != scheme {
                        return Err(RegistryError::ConflictingSecurityScheme {
                            service: tag.to_string(),
                            name,
                        });
                    }
                }
            }
            if let Some(owner) = self.secured_handlers.get(&handler_address(&route_handler.handle)) {
                return Err(RegistryError::HandlerReused {
                    service: tag.to_string(),
                    path: route_path,
                    method: lower,
                    owner: owner.clone(),
                });
            }
            permission = Some(Permission::new(tag, &lower, &contract_path));
        }

        let scope = route_key(&full_path, &lower);
        let mut extractor = Extractor::new(&self.compiler, &scope);
        let parameters = extractor.parameters(request, &full_path);
        let request_content = extractor.request_content(request);
        let response_content = extractor.response_content(&route_handler.response);
        let definitions = extractor.into_definitions();

        let mut operation = Operation {
            tags: vec![tag.to_string()],
            summary,
            description,
            request_body: (!request_content.is_empty()).then(|| RequestBody {
                description: request.description.clone(),
                content: request_content,
                required: false,
            }),
            parameters,
            responses: BTreeMap::from([(
                route_handler.response.status.to_string(),
                ResponseBody {
                    description: route_handler.response.description.clone(),
                    content: response_content,
                },
            )]),
            deprecated,
            security: Vec::new(),
        };
        if let (Some(security), Some(permission)) = (&security, &permission) {
            operation.security.push(security.security_requirement());
            operation.summary = format!("{} (permission: {})", operation.summary, permission.code);
        }

        Ok(PreparedRoute {
            method,
            full_path,
            contract_path,
            operation,
            definitions,
            security,
            permission,
            handle: route_handler.handle,
        })
    }

    fn commit(&mut self, tag: &str, prepared: PreparedRoute) -> Result<(), RegistryError> {
        let PreparedRoute {
            method,
            full_path,
            contract_path,
            operation,
            definitions,
            security,
            permission,
            handle,
        } = prepared;

        let mut chain: Vec<Handler> = Vec::with_capacity(3);
        if let Some(permission) = &permission {
            let permission = permission.clone();
            chain.push(handler(move |ctx| ctx.set_permission(permission.clone())));
        }
        if let Some(security) = &security {
            let security = Arc::clone(security);
            chain.push(handler(move |ctx| security.auth(ctx)));
        }
        let address = handler_address(&handle);
        chain.push(handle);

        // the router is the only step that can still fail
        self.router
            .handle(method.clone(), &full_path, chain)
            .map_err(|source| RegistryError::Router {
                service: tag.to_string(),
                source,
            })?;

        if let Some(security) = &security {
            for (name, scheme) in security.security_schemes() {
                // conflicts were ruled out in prepare
                match self.document.insert_security_scheme(&name, scheme) {
                    Ok(true) => debug!(service = %tag, scheme = %name, "Security scheme added"),
                    Ok(false) => {}
                    Err(e) => error!(service = %tag, error = %e, "Security scheme rejected after validation"),
                }
            }
        }
        if let Some(permission) = permission {
            self.secured_handlers.insert(address, permission.code.clone());
            self.permissions
                .entry(tag.to_string())
                .or_default()
                .push(permission);
        }
        self.document.add_schemas(definitions);
        debug!(
            service = %tag,
            method = %method,
            path = %full_path,
            contract_path = %contract_path,
            secured = security.is_some(),
            "Route added to contract"
        );
        self.document
            .paths
            .entry(contract_path)
            .or_default()
            .insert(method.as_str().to_ascii_lowercase(), operation);
        Ok(())
    }

    /// Freeze the document, publish it to the [`ContractHandle`] and hand the
    /// router back for serving.
    pub fn finish(self) -> (Arc<ContractDocument>, R) {
        let document = Arc::new(self.document);
        if !self.contract.publish(Arc::clone(&document)) {
            debug!("Contract handle already held a document, keeping the first");
        }
        info!(
            paths = document.paths.len(),
            schemas = document.components.schemas.len(),
            "Contract document finished"
        );
        (document, self.router)
    }
}

fn handler_address(handle: &Handler) -> usize {
    Arc::as_ptr(handle) as *const () as usize
}
