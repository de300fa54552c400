pub mod config;
pub mod request;

pub use config::{BaseConfig, HandlerConfig, PipelineConfig, ServiceConfig, StorageConfig};
pub use request::*;
