use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExploreConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub default_list_limit: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub request_timeout_secs: u64, // 0 = no timeout
    pub autocomplete_limit: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub log_level: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: Option<ServerConfig>,
    #[serde(default)]
    pub explore: Option<ExploreConfig>,
    #[serde(default)]
    pub limits: Option<LimitsConfig>,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub explore: ExploreConfig,
    pub limits: LimitsConfig,
    pub log_level: String,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let base_dir = std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."));

        let config_file = read_config_file(&base_dir.join("config.toml"))?;
        Ok(Self::resolve(config_file, |key| std::env::var(key).ok()))
    }

    /// Layers `env` over the config file over defaults.
    fn resolve(config_file: Option<ConfigFile>, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let file = config_file.unwrap_or_default();

        let server = file.server.unwrap_or(ServerConfig {
            host: defaults.host,
            port: defaults.port,
        });
        let port = env("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(server.port);
        let host = env("HOST").unwrap_or(server.host);

        let mut explore = file.explore.unwrap_or(defaults.explore);
        if let Some(size) = env("EXPLORE_PAGE_SIZE").and_then(|v| v.parse().ok()) {
            explore.default_page_size = size;
        }
        if let Some(max) = env("EXPLORE_MAX_PAGE_SIZE").and_then(|v| v.parse().ok()) {
            explore.max_page_size = max;
        }
        explore.max_page_size = explore.max_page_size.max(1);
        explore.default_page_size = explore.default_page_size.clamp(1, explore.max_page_size);

        let mut limits = file.limits.unwrap_or(defaults.limits);
        if let Some(secs) = env("REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            limits.request_timeout_secs = secs;
        }

        let log_level = env("LOG_LEVEL")
            .or_else(|| file.logging.map(|l| l.log_level))
            .unwrap_or(defaults.log_level);

        Self {
            host,
            port,
            explore,
            limits,
            log_level,
        }
    }

    pub fn from_env() -> Self {
        Self::load().unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn read_config_file(path: &Path) -> anyhow::Result<Option<ConfigFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Some(toml::from_str::<ConfigFile>(&content)?))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            explore: ExploreConfig {
                default_page_size: 12,
                max_page_size: 50,
                default_list_limit: 10,
            },
            limits: LimitsConfig {
                request_timeout_secs: 30,
                autocomplete_limit: 10,
            },
            log_level: "info".to_string(),
        }
    }
}
