use query::AppConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub log_format: LogFormat,
    pub cors_enabled: bool,
    /// Default row count for `/graph/sample`
    pub graph_sample_limit: usize,
    pub app: AppConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            log_format: LogFormat::Text,
            cors_enabled: true,
            graph_sample_limit: 10,
            app: AppConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self {
            app: AppConfig::from_env()?,
            ..Self::default()
        };

        if let Ok(addr) = std::env::var("BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            config.log_format = LogFormat::parse(&format);
        }

        Ok(config)
    }
}

impl LogFormat {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}
