//! # Docs Module
//!
//! Service exposing the finished contract document and two viewer pages.
//!
//! | Route | Content |
//! |-------|---------|
//! | `GET /docs/openapi.json` | the contract document, serialized once |
//! | `GET /docs/swagger.html` | Swagger UI loading `openapi.json` |
//! | `GET /docs/redoc.html` | ReDoc loading `openapi.json` |
//! | `GET /docs/error_codes.json` | the [`ErrorCodes`] table, serialized on first request |
//!
//! The service is registered like any other, before the document is finished,
//! so it reads the document through a [`ContractHandle`]. Until
//! [`Registry::finish`](crate::registry::Registry::finish) publishes it,
//! `openapi.json` answers 503.

use crate::contract::contents::{self, APPLICATION_JSON, TEXT_HTML};
use crate::errs::{Code, ErrorCodes};
use crate::registry::{ContractHandle, ResponseSpec, Route, Service};
use crate::router::handler;
use once_cell::sync::OnceCell;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

pub const DOCS_TAG: &str = "Docs";
pub const DOCS_PATH: &str = "/docs";

const SWAGGER_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <meta name="description" content="SwaggerUI" />
    <title>SwaggerUI</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css" />
  </head>
  <body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js" crossorigin></script>
  <script src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js" crossorigin></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({
        url: "openapi.json",
        dom_id: '#swagger-ui',
        deepLinking: true,
        presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
        plugins: [SwaggerUIBundle.plugins.DownloadUrl],
        layout: "StandaloneLayout",
        persistAuthorization: true,
      });
    };
  </script>
  </body>
</html>
"#;

const REDOC_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>API Documentation</title>
</head>
<body>
    <redoc spec-url="openapi.json"></redoc>
    <script src="https://unpkg.com/redoc@2.2.0/bundles/redoc.standalone.js"></script>
</body>
</html>
"#;

/// Docs service reading the contract through `contract` and listing `codes`.
#[must_use]
pub fn service(contract: ContractHandle, codes: Arc<ErrorCodes>) -> Service {
    let cache: Arc<OnceCell<Vec<u8>>> = Arc::new(OnceCell::new());
    let codes_cache: Arc<OnceCell<Vec<u8>>> = Arc::new(OnceCell::new());

    let failures = Arc::clone(&codes);
    let openapi = handler(move |ctx| {
        let Some(document) = contract.get() else {
            ctx.abort_with_json(503, &json!({"error": "Contract document not ready"}));
            return;
        };
        match cache.get_or_try_init(|| serde_json::to_vec(document.as_ref())) {
            Ok(body) => ctx.bytes(200, APPLICATION_JSON, body.clone()),
            Err(e) => {
                error!(error = %e, "Failed to serialize contract document");
                ctx.abort_with_json(500, &failures.failure::<()>(Code::INTERNAL_SERVER_ERROR));
            }
        }
    });

    // codes are registered during startup, so the first request sees them all
    let error_codes = handler(move |ctx| {
        match codes_cache.get_or_try_init(|| codes.to_json()) {
            Ok(body) => ctx.bytes(200, APPLICATION_JSON, body.clone()),
            Err(e) => {
                error!(error = %e, "Failed to serialize error codes");
                ctx.abort_with_json(500, &codes.failure::<()>(Code::INTERNAL_SERVER_ERROR));
            }
        }
    });

    Service::new(DOCS_TAG, DOCS_PATH)
        .description("API documentation")
        .route(
            Route::get("openapi.json", openapi)
                .summary("Contract document")
                .response(ResponseSpec::new().contents(contents::json())),
        )
        .route(
            Route::get(
                "swagger.html",
                handler(|ctx| ctx.bytes(200, TEXT_HTML, SWAGGER_HTML.as_bytes().to_vec())),
            )
            .summary("Swagger UI")
            .response(ResponseSpec::new().contents(contents::text_html())),
        )
        .route(
            Route::get(
                "redoc.html",
                handler(|ctx| ctx.bytes(200, TEXT_HTML, REDOC_HTML.as_bytes().to_vec())),
            )
            .summary("ReDoc")
            .response(ResponseSpec::new().contents(contents::text_html())),
        )
        .route(
            Route::get("error_codes.json", error_codes)
                .summary("Application error codes")
                .response(ResponseSpec::new().contents(contents::json())),
        )
}

/// Log where the viewers are reachable for each configured server.
pub fn log_locations(servers: &[crate::contract::Server]) {
    for server in servers {
        info!(url = %format!("{}{DOCS_PATH}/swagger.html", server.url), "Serving Swagger UI");
        info!(url = %format!("{}{DOCS_PATH}/redoc.html", server.url), "Serving ReDoc");
    }
}
