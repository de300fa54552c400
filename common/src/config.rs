use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_HANDLER_PROGRAM: &str = "rkw-handler";
pub const DEFAULT_HTTP_PORT: u16 = 9090;
pub const DEFAULT_DRAIN_TIMEOUT_SECS: u64 = 60;

static LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Settings shared by the service and every worker it launches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseConfig {
    pub api_key: String,
    pub api_secret: String,
    pub ws_url: String,
    pub log_level: String,
    pub insecure: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            ws_url: String::new(),
            log_level: "info".to_string(),
            insecure: false,
            storage: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub region: String,
    pub access_key: String,
    pub secret: String,
}

/// The worker executable. Each job runs as
/// `<program> <args..> run-handler --config <yaml> --request <json>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_HANDLER_PROGRAM.to_string(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
    pub handler: HandlerConfig,
    pub http_port: u16,
    pub drain_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base: BaseConfig::default(),
            handler: HandlerConfig::default(),
            http_port: DEFAULT_HTTP_PORT,
            drain_timeout_secs: DEFAULT_DRAIN_TIMEOUT_SECS,
        }
    }
}

/// Per-job configuration handed to a single worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
    pub handler_id: String,
    pub tmp_dir: PathBuf,
}

impl PipelineConfig {
    pub fn new(base: &BaseConfig, handler_id: &str) -> Self {
        Self {
            base: base.clone(),
            handler_id: handler_id.to_string(),
            tmp_dir: std::env::temp_dir().join(handler_id),
        }
    }
}

impl ServiceConfig {
    pub fn from_yaml(body: &str) -> Result<Self> {
        let cfg: ServiceConfig =
            serde_yaml::from_str(body).context("Failed to parse YAML config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        let level = self.base.log_level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            bail!("unknown log level {:?}", self.base.log_level);
        }
        if self.handler.program.trim().is_empty() {
            bail!("handler program must not be empty");
        }
        Ok(())
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ServiceConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    ServiceConfig::from_yaml(&content)
}
