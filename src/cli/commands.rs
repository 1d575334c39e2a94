use crate::config::{ConfigLoader, ServerConfig};
use crate::contract::ContractDocument;
use crate::errs::ErrorCodes;
use crate::ioc::Container;
use crate::registry::{Permission, Registry, Service};
use crate::router::LiveRouter;
use crate::server::HttpServer;
use anyhow::Context as _;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Command-line interface of a gantry application
#[derive(Parser, Debug)]
#[command(name = "gantry")]
#[command(about = "Declarative HTTP services with a generated OpenAPI contract", long_about = None)]
pub struct Cli {
    /// Directory holding `<name>.yaml` configuration files (seeded when missing)
    #[arg(short, long, env = "GANTRY_CONFIG_DIR", default_value = "config", global = true)]
    pub config_dir: PathBuf,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register every service and serve them over HTTP
    Serve {
        /// Listen address; defaults to 0.0.0.0 on the configured `http_port`
        #[arg(long)]
        addr: Option<String>,
    },
    /// Register every service and print the contract document
    Contract {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Single-line JSON instead of indented
        #[arg(long, default_value_t = false)]
        compact: bool,
    },
    /// List the permission codes of all secured routes
    Permissions,
}

/// Shared startup state handed to the service factory.
pub struct AppContext {
    pub loader: ConfigLoader,
    pub container: Container,
    /// Application error codes, listed by the docs service.
    pub codes: Arc<ErrorCodes>,
}

/// Builds the application's services from configuration and shared instances.
pub type ServiceFactory = dyn Fn(&AppContext) -> anyhow::Result<Vec<Service>>;

/// Result of registering every service.
pub struct Assembly {
    pub config: ServerConfig,
    pub contract: Arc<ContractDocument>,
    pub router: LiveRouter,
    pub permissions: BTreeMap<String, Vec<Permission>>,
}

/// Load the server configuration, register the factory's services plus the
/// docs service, and freeze the contract.
///
/// # Errors
///
/// Configuration load failures, factory failures and registration errors, each
/// with context.
pub fn assemble(app: &AppContext, factory: &ServiceFactory) -> anyhow::Result<Assembly> {
    let config: ServerConfig = app
        .loader
        .load(ServerConfig::NAME, ServerConfig::SEED)
        .context("loading server configuration")?;

    let router = LiveRouter::with_prefix(&config.api_root);
    let mut registry = Registry::new(config.contract_document(), router);
    let mut services = factory(app).context("building services")?;
    services.push(crate::docs::service(
        registry.contract_handle(),
        Arc::clone(&app.codes),
    ));
    registry
        .register(services)
        .context("registering services")?;

    let permissions = registry.permissions().clone();
    let (contract, router) = registry.finish();
    Ok(Assembly {
        config,
        contract,
        router,
        permissions,
    })
}

/// Run a parsed command line against the application's services.
///
/// # Errors
///
/// Anything that aborts startup, plus failures writing output or closing
/// resources.
pub fn run_cli(cli: Cli, factory: &ServiceFactory) -> anyhow::Result<()> {
    let app = AppContext {
        loader: ConfigLoader::new(&cli.config_dir),
        container: Container::new(),
        codes: Arc::new(ErrorCodes::new()),
    };
    let result = run_command(&cli.command, &app, factory);
    app.container.close().context("closing resources")?;
    result
}

fn run_command(command: &Commands, app: &AppContext, factory: &ServiceFactory) -> anyhow::Result<()> {
    match command {
        Commands::Serve { addr } => {
            let assembly = assemble(app, factory)?;
            crate::docs::log_locations(&assembly.contract.servers);
            let addr = addr
                .clone()
                .unwrap_or_else(|| format!("0.0.0.0:{}", assembly.config.http_port));
            let handle = HttpServer::new(Arc::new(assembly.router))
                .with_access_log(assembly.config.enable_logger)
                .with_max_body(assembly.config.max_body_bytes)
                .start(addr.as_str())
                .with_context(|| format!("binding {addr}"))?;
            handle
                .stop_on_signals()
                .context("installing signal handlers")?;
            handle
                .join()
                .map_err(|_| anyhow::anyhow!("HTTP server thread panicked"))?;
            info!("Shutdown complete");
            Ok(())
        }
        Commands::Contract { output, compact } => {
            let assembly = assemble(app, factory)?;
            let json = if *compact {
                assembly.contract.to_json()?
            } else {
                assembly.contract.to_json_pretty()?
            };
            match output {
                Some(path) => std::fs::write(path, json)
                    .with_context(|| format!("writing {}", path.display()))?,
                None => writeln!(std::io::stdout(), "{json}")?,
            }
            Ok(())
        }
        Commands::Permissions => {
            let assembly = assemble(app, factory)?;
            let mut out = std::io::stdout().lock();
            for (tag, permissions) in &assembly.permissions {
                writeln!(out, "{tag}")?;
                for p in permissions {
                    writeln!(out, "  {}  {:<7} {}", p.code, p.method.to_uppercase(), p.path)?;
                }
            }
            Ok(())
        }
    }
}
