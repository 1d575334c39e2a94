//! # Configuration Module
//!
//! Named YAML configuration sources with seed content.
//!
//! ## Overview
//!
//! Each logical configuration (`server`, `jwt`, ...) lives in
//! `<dir>/<name>.yaml`. The first time a name is loaded and the file does not
//! exist yet, the loader writes the seed text there, so a fresh checkout ends up
//! with commented, editable defaults on disk.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gantry::config::{ConfigLoader, ServerConfig};
//!
//! let loader = ConfigLoader::new("config");
//! let server: ServerConfig = loader.load(ServerConfig::NAME, ServerConfig::SEED)?;
//! let contract = server.contract_document();
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::contract::{ContractDocument, Info, Server};
use crate::server::DEFAULT_MAX_BODY_BYTES;
use anyhow::Context as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Loads named configuration files from one directory.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    dir: PathBuf,
}

impl ConfigLoader {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `name`.
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.yaml"))
    }

    /// Parse `<dir>/<name>.yaml`, writing `seed` there first if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error naming the file when the directory or seed cannot be
    /// written, the file cannot be read, or its content does not parse as `T`.
    pub fn load<T: DeserializeOwned>(&self, name: &str, seed: &str) -> anyhow::Result<T> {
        let path = self.path_for(name);
        if !path.exists() {
            fs::create_dir_all(&self.dir)
                .with_context(|| format!("creating config directory {}", self.dir.display()))?;
            fs::write(&path, seed)
                .with_context(|| format!("writing default config {}", path.display()))?;
            info!(config = %name, path = %path.display(), "Wrote default configuration");
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let value = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        debug!(config = %name, path = %path.display(), "Configuration loaded");
        Ok(value)
    }
}

/// Entry of the `api_servers` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiServer {
    pub url: String,
    #[serde(default)]
    pub description: String,
}

/// HTTP server and contract settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_title")]
    pub api_title: String,
    #[serde(default = "default_version")]
    pub api_version: String,
    #[serde(default)]
    pub api_servers: Vec<ApiServer>,
    #[serde(default = "default_port")]
    pub http_port: u16,
    /// Mount prefix of every registered route, e.g. `/api/v1`.
    #[serde(default)]
    pub api_root: String,
    #[serde(default = "default_true")]
    pub enable_logger: bool,
    /// Larger request bodies are answered with `413`.
    #[serde(default = "default_max_body")]
    pub max_body_bytes: u64,
}

fn default_title() -> String {
    "API Documentation".to_string()
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

fn default_max_body() -> u64 {
    DEFAULT_MAX_BODY_BYTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_title: default_title(),
            api_version: default_version(),
            api_servers: Vec::new(),
            http_port: default_port(),
            api_root: String::new(),
            enable_logger: true,
            max_body_bytes: default_max_body(),
        }
    }
}

impl ServerConfig {
    pub const NAME: &'static str = "server";

    pub const SEED: &'static str = r#"# Server config

# title for the contract document
api_title: "API Documentation"

# version of the api
api_version: "1.0.0"

# http port to listen on
http_port: 8080

# mount prefix of every route
api_root: "/api/v1"

# servers listed in the contract document
api_servers:
  - url: "http://localhost:8080/api/v1"
    description: "Local Server"

# log every request at info level
enable_logger: true

# request bodies above this size are rejected (10 MiB)
max_body_bytes: 10485760
"#;

    /// Empty contract document described by this configuration.
    #[must_use]
    pub fn contract_document(&self) -> ContractDocument {
        let info = Info {
            title: self.api_title.clone(),
            version: self.api_version.clone(),
            ..Info::default()
        };
        let servers = self
            .api_servers
            .iter()
            .map(|s| Server {
                url: s.url.clone(),
                description: s.description.clone(),
            })
            .collect();
        ContractDocument::new(info).with_servers(servers)
    }
}

/// Token signing settings for [`JwtAuth`](crate::security::JwtAuth).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_sign_method")]
    pub sign_method: String,
    /// Name of the security scheme in the contract document.
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Token lifetime in seconds.
    #[serde(default = "default_expires")]
    pub expires_secs: u64,
}

fn default_sign_method() -> String {
    "HS256".to_string()
}

fn default_scheme() -> String {
    "user_auth".to_string()
}

fn default_expires() -> u64 {
    168 * 3600
}

impl JwtConfig {
    pub const NAME: &'static str = "jwt";

    pub const SEED: &'static str = r#"# JWT config

# signing secret, change it in production
secret: "your_secret"

# HS256, HS384 or HS512
sign_method: "HS256"

# security scheme name in the contract document
scheme: "user_auth"

# token lifetime in seconds (7 days)
expires_secs: 604800
"#;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_seeded_then_loaded() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path().join("conf"));
        let cfg: ServerConfig = loader.load(ServerConfig::NAME, ServerConfig::SEED).unwrap();
        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.api_root, "/api/v1");
        assert_eq!(cfg.api_servers.len(), 1);
        assert_eq!(cfg.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        let written = fs::read_to_string(loader.path_for("server")).unwrap();
        assert_eq!(written, ServerConfig::SEED);
    }

    #[test]
    fn test_existing_file_wins_over_seed() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("jwt.yaml"), "secret: abc\nsign_method: HS512\n").unwrap();
        let loader = ConfigLoader::new(dir.path());
        let cfg: JwtConfig = loader.load(JwtConfig::NAME, JwtConfig::SEED).unwrap();
        assert_eq!(cfg.secret, "abc");
        assert_eq!(cfg.sign_method, "HS512");
        assert_eq!(cfg.scheme, "user_auth");
        assert_eq!(cfg.expires_secs, 604_800);
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("server.yaml"), "http_port: [not a port").unwrap();
        let loader = ConfigLoader::new(dir.path());
        let err = loader
            .load::<ServerConfig>(ServerConfig::NAME, ServerConfig::SEED)
            .unwrap_err();
        assert!(format!("{err:#}").contains("server.yaml"));
    }

    #[test]
    fn test_contract_document_from_config() {
        let cfg: ServerConfig = serde_yaml::from_str(ServerConfig::SEED).unwrap();
        let doc = cfg.contract_document();
        assert_eq!(doc.openapi, "3.0.0");
        assert_eq!(doc.info.title, "API Documentation");
        assert_eq!(doc.servers[0].url, "http://localhost:8080/api/v1");
    }

    #[test]
    fn test_body_cap_defaults_when_omitted() {
        let cfg: ServerConfig = serde_yaml::from_str("http_port: 9000\n").unwrap();
        assert_eq!(cfg.max_body_bytes, ServerConfig::default().max_body_bytes);
        let cfg: ServerConfig = serde_yaml::from_str("max_body_bytes: 1024\n").unwrap();
        assert_eq!(cfg.max_body_bytes, 1024);
    }
}
