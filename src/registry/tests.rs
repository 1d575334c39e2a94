use super::*;
use crate::contract::contents::{FORM_URLENCODED, MULTIPART_FORM};
use crate::contract::{ApiKeyLocation, ContractDocument, Info};
use crate::router::{handler, Handler, LiveRouter, RouterError};
use crate::schema::{FileUpload, Reflect, SchemaCompiler, TypeNames};
use crate::security::{ApiKeySecurity, JwtAlgorithm, JwtAuth, NoSecurity, Security};
use crate::server::Request;
use http::Method;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default, Reflect)]
struct Point {
    #[reflect(json = "x", required)]
    x: i64,
    #[reflect(json = "y", required)]
    y: i64,
}

#[derive(Default, Reflect)]
struct Segment {
    #[reflect(json = "from")]
    from: Point,
    #[reflect(json = "to")]
    to: Point,
}

#[derive(Default, Reflect)]
struct Upload {
    #[reflect(form = "title", required)]
    title: String,
    #[reflect(form = "attachment")]
    attachment: Option<FileUpload>,
}

#[derive(Default, Reflect)]
struct Note {
    #[reflect(form = "text")]
    text: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Reflect)]
struct User {
    #[reflect(json = "id")]
    id: u64,
}

fn registry() -> Registry<LiveRouter> {
    let doc = ContractDocument::new(Info {
        title: "test".into(),
        version: "1".into(),
        ..Info::default()
    });
    Registry::new(doc, LiveRouter::new()).with_compiler(SchemaCompiler::new(Arc::new(TypeNames::new())))
}

fn ok() -> Handler {
    handler(|ctx| ctx.text(200, "ok"))
}

fn jwt() -> Arc<JwtAuth<User>> {
    Arc::new(JwtAuth::new(
        "secret",
        "user_auth",
        JwtAlgorithm::HS256,
        Duration::from_secs(60),
    ))
}

#[test]
fn test_full_path_resolution() {
    assert_eq!(full_path("/foo", "/bar"), "/bar");
    assert_eq!(full_path("/foo", "bar"), "/foo/bar");
    assert_eq!(full_path("/foo", ""), "/foo");
    assert_eq!(full_path("/foo/", ":id"), "/foo/:id");
    assert_eq!(full_path("", ""), "/");
    assert_eq!(full_path("", "x"), "/x");
}

#[test]
fn test_contract_path_templating() {
    assert_eq!(contract_path("/foo/:id"), "/foo/{id}");
    assert_eq!(contract_path("/foo/*action"), "/foo/{action}");
    assert_eq!(contract_path("/foo/bar"), "/foo/bar");
    assert_eq!(contract_path("/"), "/");
    assert_eq!(contract_path("/a/:x/b/:y"), "/a/{x}/b/{y}");
}

#[test]
fn test_route_key() {
    assert_eq!(route_key("/users/:id", "GET"), "users-id-get");
    assert_eq!(route_key("/", "post"), "post");
    assert_eq!(route_key("/v1/files/*path", "put"), "v1-files-path-put");
}

#[test]
fn test_routes_land_in_document_and_router() {
    let mut reg = registry();
    reg.register([Service::new("Users", "/users")
        .description("User management")
        .route(Route::get("", ok()).summary("List users"))
        .route(Route::get(":id", ok()).summary("Get user"))
        .route(Route::post("", ok()).request(RequestSpec::new().json(Segment::default())))])
        .unwrap();
    let (doc, router) = reg.finish();

    assert_eq!(doc.tags.len(), 1);
    assert_eq!(doc.tags[0].name, "Users");
    assert_eq!(doc.tags[0].description, "User management");
    assert!(doc.has_operation("/users", "get"));
    assert!(doc.has_operation("/users", "post"));
    let get = doc.operation("/users/{id}", "get").unwrap();
    assert_eq!(get.summary, "Get user");
    assert_eq!(get.tags, vec!["Users"]);
    assert_eq!(get.parameters.len(), 1);
    assert_eq!(get.parameters[0].name, "id");
    assert!(get.request_body.is_none());
    assert!(get.responses.contains_key("200"));

    assert_eq!(router.len(), 3);
    let res = router.dispatch(Request::new(Method::GET, "/users/7"));
    assert_eq!(res.status, 200);
}

#[test]
fn test_nested_reuse_becomes_component_schema() {
    let mut reg = registry();
    reg.register([Service::new("Geo", "/geo")
        .route(Route::post("segments", ok()).request(RequestSpec::new().json(Segment::default())))
        .route(Route::put("segments", ok()).request(RequestSpec::new().json(Segment::default())))])
        .unwrap();
    let (doc, _) = reg.finish();

    assert!(doc.components.schemas.contains_key("Point"));
    let body = &doc.operation("/geo/segments", "post").unwrap().request_body;
    let schema = body.as_ref().unwrap().content["application/json"]
        .schema
        .as_ref()
        .unwrap();
    assert!(schema.reference.is_none());
    assert_eq!(schema.properties["from"].properties["x"].kind, Some(crate::schema::SchemaKind::Integer));
    assert_eq!(
        schema.properties["to"].reference.as_deref(),
        Some("#/components/schemas/Point")
    );
}

#[test]
fn test_duplicate_route_across_services() {
    let mut reg = registry();
    reg.register([Service::new("A", "/shared").route(Route::get("item", ok()))])
        .unwrap();
    let err = reg
        .register([Service::new("B", "/").route(Route::get("/shared/item", ok()))])
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::DuplicateRoute {
            service: "B".into(),
            path: "/shared/item".into(),
            method: "get".into(),
        }
    );
    assert_eq!(
        err.to_string(),
        "service B route /shared/item: method get already registered"
    );
    assert_eq!(reg.router().len(), 1);
}

#[test]
fn test_duplicate_detection_uses_contract_path() {
    let mut reg = registry();
    let err = reg
        .register([Service::new("Items", "/items")
            .route(Route::get(":id", ok()))
            .route(Route::get("*id", ok()))])
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateRoute { .. }));
}

#[test]
fn test_unreachable_renamed_param_route_is_rejected() {
    let mut reg = registry();
    let err = reg
        .register([Service::new("Users", "/users")
            .route(Route::get(":id", ok()))
            .route(Route::get(":uid", ok()))])
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Router {
            source: RouterError::Conflict { .. },
            ..
        }
    ));
    assert!(reg.document().has_operation("/users/{id}", "get"));
    assert!(reg.document().operation("/users/{uid}", "get").is_none());
    assert_eq!(reg.router().len(), 1);
}

#[test]
fn test_form_content_type_selection() {
    let mut reg = registry();
    reg.register([Service::new("Files", "/files")
        .route(Route::post("upload", ok()).request(RequestSpec::new().form(Upload::default())))
        .route(Route::post("note", ok()).request(RequestSpec::new().form(Note::default())))])
        .unwrap();
    let doc = reg.document();
    let upload = doc.operation("/files/upload", "post").unwrap();
    let content = &upload.request_body.as_ref().unwrap().content;
    assert!(content.contains_key(MULTIPART_FORM));
    let note = doc.operation("/files/note", "post").unwrap();
    assert!(note.request_body.as_ref().unwrap().content.contains_key(FORM_URLENCODED));
}

#[test]
fn test_body_rules_leave_no_partial_state() {
    let mut reg = registry();
    let err = reg
        .register([Service::new("Bad", "/bad").route(
            Route::post("", ok()).request(RequestSpec::new().json(Note::default()).form(Note::default())),
        )])
        .unwrap_err();
    assert!(matches!(err, RegistryError::MultipleBodies { .. }));

    let err = reg
        .register([Service::new("Bad", "/bad")
            .route(Route::get("", ok()).request(RequestSpec::new().json(Note::default())))])
        .unwrap_err();
    assert!(matches!(err, RegistryError::BodyOnReadOnlyMethod { .. }));

    assert!(reg.document().paths.is_empty());
    assert!(reg.router().is_empty());
}

#[test]
fn test_invalid_method() {
    let mut reg = registry();
    let err = reg
        .register([Service::new("X", "/x").route(Route::new("GE T", "", ok()))])
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidMethod { .. }));
}

#[test]
fn test_custom_response_status() {
    let mut reg = registry();
    reg.register([Service::new("Jobs", "/jobs").route(
        Route::post("", ok()).response(ResponseSpec::new().status(202).description("Accepted").json(User::default())),
    )])
    .unwrap();
    let op = reg.document().operation("/jobs", "post").unwrap();
    assert_eq!(op.responses["202"].description, "Accepted");
    assert!(op.responses["202"].content.contains_key("application/json"));
}

#[test]
fn test_security_inheritance_and_opt_out() {
    let mut reg = registry();
    let auth = jwt();
    reg.register([Service::new("Users", "/users")
        .security(auth.clone())
        .route(Route::get("info", ok()).summary("Info"))
        .route(Route::post("login", ok()).summary("Login").with_security(NoSecurity::shared()))])
        .unwrap();

    let code = permission_code("get", "/users/info");
    let doc = reg.document();
    let info = doc.operation("/users/info", "get").unwrap();
    assert_eq!(info.summary, format!("Info (permission: {code})"));
    assert_eq!(info.security, vec![auth.security_requirement()]);
    let login = doc.operation("/users/login", "post").unwrap();
    assert_eq!(login.summary, "Login");
    assert!(login.security.is_empty());
    assert!(doc.components.security_schemes.contains_key("user_auth"));

    let perms = &reg.permissions()["Users"];
    assert_eq!(perms.len(), 1);
    assert_eq!(perms[0].code, code);
    assert_eq!(perms[0].path, "/users/info");

    let routes = doc.security_routes();
    assert_eq!(routes["Users"].len(), 1);
}

#[test]
fn test_route_security_overrides_service() {
    let mut reg = registry();
    let keys = Arc::new(ApiKeySecurity::new("admin_key", ApiKeyLocation::Header, "X-Admin-Key"));
    reg.register([Service::new("Admin", "/admin")
        .security(jwt())
        .route(Route::delete(":id", ok()).with_security(keys))])
        .unwrap();
    let op = reg.document().operation("/admin/{id}", "delete").unwrap();
    assert!(op.security[0].contains_key("admin_key"));
    assert!(!reg.document().components.security_schemes.contains_key("user_auth"));
}

#[test]
fn test_conflicting_security_scheme() {
    let mut reg = registry();
    let header = Arc::new(ApiKeySecurity::new("key", ApiKeyLocation::Header, "X-Key"));
    let query = Arc::new(ApiKeySecurity::new("key", ApiKeyLocation::Query, "key"));
    reg.register([Service::new("A", "/a").security(header.clone()).route(Route::get("", ok()))])
        .unwrap();
    // identical definition is fine
    reg.register([Service::new("B", "/b").security(header).route(Route::get("", ok()))])
        .unwrap();
    let err = reg
        .register([Service::new("C", "/c").security(query).route(Route::get("", ok()))])
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::ConflictingSecurityScheme {
            service: "C".into(),
            name: "key".into(),
        }
    );
    assert!(!reg.document().paths.contains_key("/c"));
}

#[test]
fn test_shared_scheme_is_written_once() {
    let mut reg = registry();
    let keys = Arc::new(ApiKeySecurity::new("key", ApiKeyLocation::Header, "X-Key"));
    reg.register([
        Service::new("A", "/a")
            .security(keys.clone())
            .route(Route::get("", ok()))
            .route(Route::post("", ok())),
        Service::new("B", "/b").security(keys.clone()).route(Route::get("", ok())),
    ])
    .unwrap();
    let schemes = &reg.document().components.security_schemes;
    assert_eq!(schemes.len(), 1);
    assert_eq!(schemes["key"], keys.security_schemes()["key"]);
    assert_eq!(reg.document().security_routes()["A"].len(), 2);
}

#[test]
fn test_handler_reuse_on_secured_routes() {
    let mut reg = registry();
    let shared = ok();
    // unsecured reuse is allowed
    reg.register([Service::new("Open", "/open")
        .route(Route::get("a", shared.clone()))
        .route(Route::get("b", shared.clone()))])
        .unwrap();
    let err = reg
        .register([Service::new("Closed", "/closed")
            .security(jwt())
            .route(Route::get("a", shared.clone()))
            .route(Route::get("b", shared))])
        .unwrap_err();
    match err {
        RegistryError::HandlerReused { owner, path, .. } => {
            assert_eq!(owner, permission_code("get", "/closed/a"));
            assert_eq!(path, "b");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_secured_dispatch_sets_claims_and_permission() {
    let mut reg = registry();
    let auth = jwt();
    let reader = auth.clone();
    reg.register([Service::new("Me", "/me").security(auth.clone()).route(Route::get(
        "",
        handler(move |ctx| {
            let id = reader.user(ctx).map(|u| u.id).unwrap_or_default();
            let code = ctx.permission().map(|p| p.code.clone()).unwrap_or_default();
            ctx.json(200, &serde_json::json!({"id": id, "permission": code}));
        }),
    ))])
    .unwrap();
    let (_, router) = reg.finish();

    let res = router.dispatch(Request::new(Method::GET, "/me"));
    assert_eq!(res.status, 401);

    let token = auth.generate_token(&User { id: 9 }).unwrap();
    let req = Request::new(Method::GET, "/me").with_header("Authorization", &format!("Bearer {token}"));
    let res = router.dispatch(req);
    assert_eq!(res.status, 200);
    let body: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
    assert_eq!(body["id"], 9);
    assert_eq!(body["permission"], permission_code("get", "/me"));
}

#[test]
fn test_finish_publishes_contract() {
    let reg = registry();
    let handle = reg.contract_handle();
    assert!(!handle.is_published());
    let (doc, _) = reg.finish();
    assert!(Arc::ptr_eq(handle.get().unwrap(), &doc));
}

#[test]
fn test_serialization_is_stable() {
    let mut reg = registry();
    reg.register([
        Service::new("Geo", "/geo")
            .route(Route::post("segments", ok()).request(RequestSpec::new().json(Segment::default()))),
        Service::new("Files", "/files")
            .security(jwt())
            .route(Route::post("upload", ok()).request(RequestSpec::new().form(Upload::default()))),
    ])
    .unwrap();
    let (doc, _) = reg.finish();
    let first = doc.to_json().unwrap();
    let second = doc.to_json().unwrap();
    assert_eq!(first, second);
    let reparsed: ContractDocument = serde_json::from_str(&first).unwrap();
    assert_eq!(reparsed.to_json().unwrap(), first);
}
