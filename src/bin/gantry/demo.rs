//! Sample services mounted by the `gantry` binary: a JWT-protected users
//! service and a multipart upload endpoint.

use anyhow::Context as _;
use gantry::cli::AppContext;
use gantry::config::JwtConfig;
use gantry::errs::{send_error, Code, ErrorCodes};
use gantry::registry::{RequestSpec, ResponseSpec, Route, Service};
use gantry::router::handler;
use gantry::schema::{FileUpload, Reflect};
use gantry::security::{JwtAuth, Security};
use gantry::server::parse_query;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

const MISSING_CREDENTIALS: Code = Code(5001);
const TOKEN_ISSUE_FAILED: Code = Code(5002);

#[derive(Debug, Clone, Default, Serialize, Deserialize, Reflect)]
pub struct User {
    #[reflect(json = "id", required)]
    pub id: u64,
    #[reflect(json = "name", description = "Display name")]
    pub name: String,
}

#[derive(Default, Reflect)]
struct LoginForm {
    #[reflect(form = "username", required)]
    username: String,
    #[reflect(form = "password", required)]
    password: String,
}

#[derive(Default, Reflect)]
struct TokenReply {
    #[reflect(json = "token", required)]
    token: String,
}

#[derive(Default, Reflect)]
struct UserPath {
    #[reflect(path = "id", description = "User id")]
    id: u64,
}

#[derive(Default, Reflect)]
struct UploadForm {
    #[reflect(form = "title")]
    title: String,
    #[reflect(form = "file", required)]
    file: FileUpload,
}

#[derive(Default, Reflect)]
struct UploadReply {
    #[reflect(json = "size")]
    size: u64,
}

pub fn services(app: &AppContext) -> anyhow::Result<Vec<Service>> {
    let auth = app.container.get_or_try_init("user_auth", |_| {
        let config: JwtConfig = app
            .loader
            .load(JwtConfig::NAME, JwtConfig::SEED)
            .context("loading jwt configuration")?;
        JwtAuth::<User>::from_config(&config).context("configuring jwt")
    })?;
    app.codes
        .register([
            (MISSING_CREDENTIALS, "Username and password are required"),
            (TOKEN_ISSUE_FAILED, "Token could not be issued"),
        ])
        .context("registering error codes")?;
    Ok(vec![users(auth, Arc::clone(&app.codes)), upload()])
}

fn users(auth: Arc<JwtAuth<User>>, codes: Arc<ErrorCodes>) -> Service {
    let issuer = Arc::clone(&auth);
    let login = handler(move |ctx| {
        let form = parse_query(&String::from_utf8_lossy(&ctx.request().body));
        let field = |name: &str| {
            form.iter()
                .rev()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        };
        let username = field("username");
        if username.is_empty() || field("password").is_empty() {
            send_error(ctx, &codes, MISSING_CREDENTIALS, None);
            return;
        }
        let user = User { id: 1, name: username };
        match issuer.generate_token(&user) {
            Ok(token) => ctx.json(200, &json!({ "token": token })),
            Err(e) => send_error(ctx, &codes, TOKEN_ISSUE_FAILED, Some(&e)),
        }
    });

    let reader = Arc::clone(&auth);
    let info = handler(move |ctx| match reader.user(ctx) {
        Some(user) => ctx.json(200, &user),
        None => ctx.abort_with_json(401, &json!({"error": "Unauthorized"})),
    });

    let by_id = handler(|ctx| {
        let id = ctx.param("id").unwrap_or_default().to_string();
        match id.parse::<u64>() {
            Ok(id) => ctx.json(200, &User { id, name: format!("user-{id}") }),
            Err(_) => ctx.abort_with_json(400, &json!({"error": "invalid id"})),
        }
    });

    let secured: Arc<dyn Security> = auth;
    Service::new("Users", "/users")
        .description("Sign-in and profile lookup")
        .route(
            Route::post("login", login)
                .summary("Exchange credentials for a token")
                .request(RequestSpec::new().form(LoginForm::default()))
                .response(ResponseSpec::new().json(TokenReply::default())),
        )
        .route(
            Route::get("info", info)
                .summary("Current user")
                .with_security(Arc::clone(&secured))
                .response(ResponseSpec::new().json(User::default())),
        )
        .route(
            Route::get(":id", by_id)
                .summary("User by id")
                .with_security(secured)
                .request(RequestSpec::new().path(UserPath::default()))
                .response(ResponseSpec::new().json(User::default())),
        )
}

fn upload() -> Service {
    let save = handler(|ctx| {
        let size = ctx.request().body.len() as u64;
        ctx.json(200, &json!({ "size": size }));
    });
    Service::new("Files", "/files").route(
        Route::post("upload", save)
            .summary("Upload a file")
            .request(RequestSpec::new().form(UploadForm::default()))
            .response(ResponseSpec::new().json(UploadReply::default())),
    )
}
