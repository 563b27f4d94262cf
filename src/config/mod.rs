pub mod toml_config;

use crate::core::emitter::OutputMode;
use crate::core::roles::RoleMap;
use crate::utils::error::Result;
use crate::utils::validation::{validate_positive_number, validate_url, Validate};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use toml_config::TomlConfig;

pub const DEFAULT_API_URL: &str = "http://10.10.10.2:8090/api/v1";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
pub const STATIC_INVENTORY_FILE: &str = "static.ini";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "hosting-inventory", version)]
#[command(about = "Dynamic Ansible inventory backed by the hosting platform API")]
pub struct CliConfig {
    /// Print the full inventory (default behaviour)
    #[arg(long)]
    pub list: bool,

    /// Print variables for a single host; always `{}` since they live in `_meta`
    #[arg(long, value_name = "HOSTNAME", num_args = 0..=1)]
    pub host: Option<Option<String>>,

    /// Optional TOML configuration file
    #[arg(long, env = "HOSTING_INVENTORY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the hosting API
    #[arg(long, env = "HOSTING_API_URL")]
    pub api_url: Option<String>,

    /// API key sent as X-API-Key; empty disables the header
    #[arg(long, env = "HOSTING_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "HOSTING_API_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Static INI inventory merged for hosts the API does not know
    #[arg(long, env = "HOSTING_STATIC_INVENTORY")]
    pub static_file: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl CliConfig {
    pub fn mode(&self) -> OutputMode {
        if self.list {
            return OutputMode::List;
        }
        match &self.host {
            Some(hostname) => OutputMode::Host(hostname.clone()),
            None => OutputMode::List,
        }
    }
}

/// Fully resolved settings for one inventory build.
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub static_path: PathBuf,
    pub roles: RoleMap,
}

impl InventoryConfig {
    /// Layers flags and environment over the optional TOML file over defaults.
    pub fn resolve(cli: &CliConfig) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                let file = TomlConfig::from_file(path)?;
                file.validate()?;
                file
            }
            None => TomlConfig::default(),
        };

        let base_url = cli
            .api_url
            .clone()
            .or_else(|| file.api.base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let api_key = cli
            .api_key
            .clone()
            .or_else(|| file.api.api_key.clone())
            .unwrap_or_default();

        let timeout_seconds = cli
            .timeout
            .or(file.api.timeout_seconds)
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS);

        let static_path = cli
            .static_file
            .clone()
            .or_else(|| file.static_path())
            .unwrap_or_else(default_static_path);

        let mut roles = RoleMap::default();
        roles.extend(file.roles);

        let config = Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout: Duration::from_secs(timeout_seconds),
            static_path,
            roles,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Validate for InventoryConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api.base_url", &self.base_url)?;
        validate_positive_number("api.timeout_seconds", self.timeout.as_secs(), 1)?;
        Ok(())
    }
}

/// `static.ini` beside the running executable.
pub fn default_static_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(STATIC_INVENTORY_FILE)))
        .unwrap_or_else(|| PathBuf::from(STATIC_INVENTORY_FILE))
}
