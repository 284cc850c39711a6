use crate::constants::{self, DEFAULT_USER_AGENT};
use crate::error::{Result, ScraperError};
use crate::types::Language;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const PROXY_ENV: &str = "JAV_SCRAPER_PROXY";
pub const LANG_ENV: &str = "JAV_SCRAPER_LANG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub sources: SourcesConfig,
    pub parser: ParserConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub proxy: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub enabled: Vec<String>,
    pub language: String,
    pub with_thumbnail: bool,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            enabled: constants::supported_apis().iter().map(|s| s.to_string()).collect(),
            language: Language::default().to_string(),
            with_thumbnail: false,
        }
    }
}

impl SourcesConfig {
    pub fn language(&self) -> Result<Language> {
        self.language.parse()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub extend_fc2_from_no: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: String,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            file_prefix: "jav_scraper.log".to_string(),
        }
    }
}

impl Config {
    /// Load `config.toml` from the working directory, then apply env overrides
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// A missing file yields defaults; a malformed one is an error
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let config_content = fs::read_to_string(path).map_err(|e| {
                ScraperError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
            })?;
            Self::from_toml(&config_content)?
        } else {
            Self::default()
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(proxy) = std::env::var(PROXY_ENV) {
            self.http.proxy = Some(proxy);
        }
        if let Ok(lang) = std::env::var(LANG_ENV) {
            self.sources.language = lang;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.sources.language()?;
        for name in &self.sources.enabled {
            if !constants::supported_apis().contains(&name.as_str()) {
                return Err(ScraperError::Config(format!("Unknown source '{name}'")));
            }
        }
        if self.http.timeout_seconds == 0 {
            return Err(ScraperError::Config("http.timeout_seconds must be positive".into()));
        }
        Ok(())
    }
}
