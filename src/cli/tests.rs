//! Unit tests for CLI commands

use super::*;
use crate::config::ConfigLoader;
use crate::errs::{Code, ErrorCodes};
use crate::ioc::Container;
use crate::registry::{Route, Service};
use crate::router::handler;
use crate::server::Request;
use clap::Parser;
use http::Method;
use std::sync::Arc;

#[test]
fn test_all_commands_parse() {
    let commands = vec![
        vec!["gantry", "serve"],
        vec!["gantry", "serve", "--addr", "127.0.0.1:9000"],
        vec!["gantry", "contract", "--output", "openapi.json"],
        vec!["gantry", "contract", "--compact"],
        vec!["gantry", "--config-dir", "/etc/app", "permissions"],
    ];

    for args in commands {
        let cli = Cli::try_parse_from(&args);
        assert!(cli.is_ok(), "Failed to parse command: {:?}", args);
    }
}

#[test]
fn test_serve_addr_and_config_dir() {
    let cli = Cli::try_parse_from(["gantry", "serve", "--addr", "127.0.0.1:1", "-c", "conf"]).unwrap();
    assert_eq!(cli.config_dir.to_string_lossy(), "conf");
    match cli.command {
        Commands::Serve { addr } => assert_eq!(addr.as_deref(), Some("127.0.0.1:1")),
        other => panic!("Expected Serve command, got {other:?}"),
    }
}

#[test]
fn test_assemble_mounts_services_and_docs() {
    let dir = tempfile::tempdir().unwrap();
    let app = AppContext {
        loader: ConfigLoader::new(dir.path()),
        container: Container::new(),
        codes: Arc::new(ErrorCodes::new()),
    };
    let factory = |_: &AppContext| -> anyhow::Result<Vec<Service>> {
        Ok(vec![Service::new("Ping", "/ping")
            .route(Route::get("", handler(|ctx| ctx.text(200, "pong"))))])
    };
    let assembly = assemble(&app, &factory).unwrap();

    assert_eq!(assembly.config.api_root, "/api/v1");
    assert!(assembly.contract.has_operation("/ping", "get"));
    assert!(assembly.contract.has_operation("/docs/openapi.json", "get"));
    let tags: Vec<&str> = assembly.contract.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tags, vec!["Ping", "Docs"]);

    let res = assembly
        .router
        .dispatch(Request::new(Method::GET, "/api/v1/ping"));
    assert_eq!(res.body, b"pong");
    let res = assembly
        .router
        .dispatch(Request::new(Method::GET, "/api/v1/docs/openapi.json"));
    assert_eq!(res.status, 200);
}

#[test]
fn test_factory_codes_reach_docs() {
    let dir = tempfile::tempdir().unwrap();
    let app = AppContext {
        loader: ConfigLoader::new(dir.path()),
        container: Container::new(),
        codes: Arc::new(ErrorCodes::new()),
    };
    let factory = |app: &AppContext| -> anyhow::Result<Vec<Service>> {
        app.codes.register([(Code(7001), "Quota exceeded")])?;
        Ok(Vec::new())
    };
    let assembly = assemble(&app, &factory).unwrap();
    let res = assembly
        .router
        .dispatch(Request::new(Method::GET, "/api/v1/docs/error_codes.json"));
    assert_eq!(res.status, 200);
    assert!(String::from_utf8_lossy(&res.body).contains("Quota exceeded"));

    // a second assembly re-registers the same code
    let err = assemble(&app, &factory).err().unwrap();
    assert!(format!("{err:#}").contains("error code 7001 already registered"));
}

#[test]
fn test_assemble_reports_registration_errors() {
    let dir = tempfile::tempdir().unwrap();
    let app = AppContext {
        loader: ConfigLoader::new(dir.path()),
        container: Container::new(),
        codes: Arc::new(ErrorCodes::new()),
    };
    let factory = |_: &AppContext| -> anyhow::Result<Vec<Service>> {
        Ok(vec![Service::new("Dup", "/dup")
            .route(Route::get("", handler(|_| {})))
            .route(Route::get("/dup", handler(|_| {})))])
    };
    let err = assemble(&app, &factory).err().unwrap();
    let message = format!("{err:#}");
    assert!(message.contains("registering services"));
    assert!(message.contains("method get already registered"));
}
