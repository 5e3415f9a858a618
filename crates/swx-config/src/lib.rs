use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SilsoConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GfzConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub silso: Option<SilsoConfig>,
    pub gfz: Option<GfzConfig>,
    pub http: Option<HttpConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppConfig {
    /// Load configuration from SWX_CONFIG path (TOML) if present, with reasonable defaults
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("SWX_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        let cfg = if Path::new(&path).exists() {
            let s = fs::read_to_string(&path)?;
            toml::from_str::<AppConfig>(&s)?
        } else {
            AppConfig::default()
        };
        Ok(cfg)
    }

    /// SILSO base URL (default: the SIDC data directory)
    pub fn silso_base_url(&self) -> String {
        self.silso
            .as_ref()
            .and_then(|s| s.base_url.clone())
            .unwrap_or_else(|| "https://www.sidc.be/SILSO/DATA".to_string())
    }

    /// GFZ base URL (default: the Potsdam file service)
    pub fn gfz_base_url(&self) -> String {
        self.gfz
            .as_ref()
            .and_then(|g| g.base_url.clone())
            .unwrap_or_else(|| "https://kp.gfz-potsdam.de/app/files".to_string())
    }

    /// HTTP request timeout (default 30s)
    pub fn http_timeout(&self) -> Duration {
        let secs = self
            .http
            .as_ref()
            .and_then(|h| h.timeout_secs)
            .unwrap_or(30);
        Duration::from_secs(secs)
    }
}
