//! CLI end-to-end: configuration seeding and contract export.

use clap::Parser;
use gantry::cli::{run_cli, AppContext, Cli};
use gantry::config::{JwtConfig, ServerConfig};
use gantry::registry::{Route, Service};
use gantry::router::handler;
use gantry::security::{JwtAuth, Security};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Serialize, Deserialize)]
struct Principal {
    id: u64,
}

fn services(app: &AppContext) -> anyhow::Result<Vec<Service>> {
    let jwt: JwtConfig = app.loader.load(JwtConfig::NAME, JwtConfig::SEED)?;
    let auth: Arc<dyn Security> = Arc::new(JwtAuth::<Principal>::from_config(&jwt)?);
    Ok(vec![Service::new("Orders", "/orders")
        .security(auth)
        .route(Route::get("", handler(|ctx| ctx.text(200, "[]"))))
        .route(Route::delete(":id", handler(|ctx| ctx.text(204, ""))))])
}

#[test]
fn test_contract_command_writes_document_and_seeds_config() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("openapi.json");
    let config_dir = dir.path().join("config");
    let cli = Cli::try_parse_from([
        "gantry",
        "--config-dir",
        config_dir.to_str().unwrap(),
        "contract",
        "--output",
        out.to_str().unwrap(),
    ])
    .unwrap();

    run_cli(cli, &services).unwrap();

    assert!(config_dir.join("server.yaml").exists());
    assert!(config_dir.join("jwt.yaml").exists());

    let doc: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(doc["info"]["title"], ServerConfig::default().api_title);
    assert!(doc["paths"]["/orders/{id}"]["delete"]["summary"]
        .as_str()
        .unwrap()
        .contains("(permission: "));
    assert!(doc["components"]["securitySchemes"]["user_auth"].is_object());
    assert!(doc["paths"]["/docs/openapi.json"]["get"].is_object());
}

#[test]
fn test_edited_config_is_respected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("server.yaml"),
        "api_title: Orders API\napi_version: 2.1.0\napi_root: /v2\n",
    )
    .unwrap();
    let out = dir.path().join("contract.json");
    let cli = Cli::try_parse_from([
        "gantry",
        "-c",
        dir.path().to_str().unwrap(),
        "contract",
        "--compact",
        "-o",
        out.to_str().unwrap(),
    ])
    .unwrap();
    run_cli(cli, &services).unwrap();

    let text = std::fs::read_to_string(&out).unwrap();
    assert!(!text.contains('\n'));
    let doc: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(doc["info"]["title"], "Orders API");
    assert_eq!(doc["info"]["version"], "2.1.0");
}

#[test]
fn test_factory_error_aborts_and_still_closes_resources() {
    let dir = tempfile::tempdir().unwrap();
    let closed = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&closed);
    let factory = move |app: &AppContext| -> anyhow::Result<Vec<Service>> {
        let flag = Arc::clone(&flag);
        app.container.register_closer("pool", move || {
            flag.store(true, Ordering::SeqCst);
            Ok::<(), std::io::Error>(())
        });
        anyhow::bail!("database unreachable")
    };
    let cli = Cli::try_parse_from(["gantry", "-c", dir.path().to_str().unwrap(), "permissions"]).unwrap();

    let err = run_cli(cli, &factory).unwrap_err();
    assert!(format!("{err:#}").contains("database unreachable"));
    assert!(closed.load(Ordering::SeqCst));
}
