//! # Gantry
//!
//! **Gantry** registers HTTP services declaratively and keeps two artifacts in
//! lockstep: the live routing table and an [OpenAPI 3.0](https://spec.openapis.org/oas/v3.0.3)
//! contract document describing it.
//!
//! ## Overview
//!
//! A service is a tagged group of routes under a base path. Each route names
//! its request and response *shapes* as ordinary Rust types deriving
//! [`Reflect`](schema::Reflect). Registration compiles those shapes into
//! schemas, expands them into parameters and body contents, attaches security
//! and a permission code, mounts the handler chain on the router and writes
//! the operation into the contract, all or nothing per route.
//!
//! ## Architecture
//!
//! - **[`schema`]** - type introspection: Rust types to normalized schema nodes
//! - **[`registry`]** - services, routes, parameter/content extraction and registration
//! - **[`contract`]** - the OpenAPI document model and content-type helpers
//! - **[`security`]** - pluggable authentication (JWT, API keys) with contract metadata
//! - **[`router`]** - radix-tree routing of handler chains
//! - **[`server`]** - request/response/context types and the HTTP transport
//! - **[`docs`]** - `openapi.json`, `error_codes.json`, Swagger UI and ReDoc for the finished contract
//! - **[`errs`]** - application error codes and the JSON response envelope
//! - **[`config`]** - YAML configuration seeded on first use
//! - **[`ioc`]** - memoized shared instances with ordered shutdown
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`cli`]** - `serve`, `contract` and `permissions` commands
//!
//! ### Registration Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant App
//!     participant Registry
//!     participant Extractor
//!     participant Compiler as SchemaCompiler
//!     participant Router
//!     participant Doc as ContractDocument
//!
//!     App->>Registry: register(services)
//!     loop every route
//!         Registry->>Registry: validate method, duplicates, body rules
//!         Registry->>Extractor: parameters / request / response
//!         Extractor->>Compiler: compile(shape, namespace)
//!         Compiler-->>Extractor: schema + definitions
//!         Extractor-->>Registry: parameters, contents, definitions
//!         Registry->>Router: handle(method, path, chain)
//!         Registry->>Doc: schemes, schemas, operation
//!     end
//!     App->>Registry: finish()
//!     Registry-->>App: Arc<ContractDocument>, router
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use gantry::contract::{ContractDocument, Info};
//! use gantry::registry::{Registry, RequestSpec, ResponseSpec, Route, Service};
//! use gantry::router::{handler, LiveRouter};
//! use gantry::schema::Reflect;
//! use gantry::server::Request;
//! use http::Method;
//!
//! #[derive(Default, Reflect)]
//! struct Greeting {
//!     #[reflect(json = "message", required)]
//!     message: String,
//! }
//!
//! let hello = Service::new("Hello", "/hello").route(
//!     Route::get("", handler(|ctx| ctx.json(200, &serde_json::json!({"message": "hi"}))))
//!         .response(ResponseSpec::new().json(Greeting::default())),
//! );
//!
//! let mut registry = Registry::new(ContractDocument::new(Info::default()), LiveRouter::new());
//! registry.register([hello]).unwrap();
//! let (contract, router) = registry.finish();
//!
//! assert!(contract.has_operation("/hello", "get"));
//! assert_eq!(router.dispatch(Request::new(Method::GET, "/hello")).status, 200);
//! ```
//!
//! ## Running the Sample Binary
//!
//! ```bash
//! cargo run --bin gantry -- serve
//! # http://localhost:8080/api/v1/docs/swagger.html
//! cargo run --bin gantry -- contract --output openapi.json
//! ```
//!
//! Log output is controlled by `RUST_LOG` and the `GANTRY_LOG_*` variables read
//! by [`logging::LogConfig::from_env`].

extern crate self as gantry;

pub mod cli;
pub mod config;
pub mod contract;
pub mod docs;
pub mod errs;
pub mod ioc;
pub mod logging;
pub mod registry;
pub mod router;
pub mod schema;
pub mod security;
pub mod server;

pub use contract::ContractDocument;
pub use registry::{Registry, RegistryError, Route, Service};
pub use schema::Reflect;
