use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub http_server: HttpServerConfig,
}

/// Connection settings for the OrientDB REST endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    /// `http` or `https`
    #[serde(default = "default_db_scheme")]
    pub scheme: String,
    /// Database name on the server
    pub database: String,
    #[serde(default = "default_db_user")]
    pub user: String,
    /// Name of the environment variable holding the password.
    #[serde(default = "default_password_env")]
    pub password_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_concurrent_queries")]
    pub max_concurrent_queries: usize,
}

/// Schema walk and persistence settings
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConfig {
    #[serde(default = "default_scheme_file")]
    pub scheme_file: PathBuf,
    #[serde(default = "default_vertex_root")]
    pub vertex_root: String,
    #[serde(default = "default_edge_root")]
    pub edge_root: String,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            scheme_file: default_scheme_file(),
            vertex_root: default_vertex_root(),
            edge_root: default_edge_root(),
            max_depth: default_max_depth(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// Directory with the visualization front-end, served as a fallback
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
            allowed_origins: Vec::new(),
            static_dir: None,
        }
    }
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    2480
}

fn default_db_scheme() -> String {
    "http".to_string()
}

fn default_db_user() -> String {
    "root".to_string()
}

fn default_password_env() -> String {
    "ORIENTDB_PASSWORD".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent_queries() -> usize {
    8
}

fn default_scheme_file() -> PathBuf {
    PathBuf::from("scheme.json")
}

fn default_vertex_root() -> String {
    "V".to_string()
}

fn default_edge_root() -> String {
    "E".to_string()
}

fn default_max_depth() -> usize {
    64
}

fn default_http_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in SCHEMEGRAPH_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        let config_path = std::env::var("SCHEMEGRAPH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        Self::from_file(&config_path)
    }

    /// Read and validate a specific config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.database.database.trim().is_empty() {
            anyhow::bail!("database.database must name the database to introspect");
        }

        if self.database.port == 0 {
            anyhow::bail!("database.port must be greater than 0");
        }

        if self.database.scheme != "http" && self.database.scheme != "https" {
            anyhow::bail!(
                "database.scheme must be \"http\" or \"https\", got {:?}",
                self.database.scheme
            );
        }

        if self.database.timeout_secs == 0 {
            anyhow::bail!("database.timeout_secs must be greater than 0");
        }

        if self.database.max_concurrent_queries == 0 {
            anyhow::bail!("database.max_concurrent_queries must be greater than 0");
        }

        if self.schema.vertex_root.is_empty() || self.schema.edge_root.is_empty() {
            anyhow::bail!("schema.vertex_root and schema.edge_root must not be empty");
        }

        if self.schema.vertex_root == self.schema.edge_root {
            anyhow::bail!(
                "schema.vertex_root and schema.edge_root must differ (both are {:?})",
                self.schema.vertex_root
            );
        }

        if self.schema.max_depth == 0 {
            anyhow::bail!("schema.max_depth must be greater than 0");
        }

        Ok(())
    }

    /// Base URL of the database REST API, e.g. `http://localhost:2480`
    pub fn database_url(&self) -> Result<url::Url> {
        let raw = format!(
            "{}://{}:{}",
            self.database.scheme, self.database.host, self.database.port
        );
        url::Url::parse(&raw).with_context(|| format!("Invalid database address: {}", raw))
    }

    /// Password for the database user, read from `database.password_env`.
    ///
    /// Only needed when talking to the database, so it is not checked by `load`.
    pub fn database_password(&self) -> Result<String> {
        std::env::var(&self.database.password_env).with_context(|| {
            format!(
                "Environment variable {} not set. Set it in your .env file or as an environment variable with the database password.",
                self.database.password_env
            )
        })
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.database.timeout_secs)
    }

    /// Get scheme file path
    pub fn scheme_file(&self) -> &Path {
        &self.schema.scheme_file
    }
}
