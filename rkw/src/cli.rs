use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use common::ServiceConfig;
use common::config::load_config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rkw", version, about = "Worker fleet daemon")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the daemon and serve the operational endpoints
    Start {
        /// Path to a YAML config file
        #[arg(short, long, env = "RKW_CONFIG_FILE")]
        config: Option<PathBuf>,
        /// Inline YAML config, used when no file is given
        #[arg(long, env = "RKW_CONFIG_BODY", hide_env_values = true)]
        config_body: Option<String>,
    },
}

pub fn resolve_config(
    config: Option<PathBuf>,
    config_body: Option<String>,
) -> Result<ServiceConfig> {
    match (config, config_body) {
        (Some(path), _) => load_config(path),
        (None, Some(body)) => ServiceConfig::from_yaml(&body),
        (None, None) => bail!("no config given, use --config or RKW_CONFIG_BODY"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_takes_precedence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "http_port: 7000").unwrap();
        let cfg = resolve_config(
            Some(file.path().to_path_buf()),
            Some("http_port: 8000".to_string()),
        )
        .unwrap();
        assert_eq!(cfg.http_port, 7000);
    }

    #[test]
    fn test_inline_body() {
        let cfg = resolve_config(None, Some("handler:\n  program: egress".to_string())).unwrap();
        assert_eq!(cfg.handler.program, "egress");
    }

    #[test]
    fn test_missing_config() {
        assert!(resolve_config(None, None).is_err());
    }

    #[test]
    fn test_parse_start() {
        let cli = Cli::try_parse_from(["rkw", "start", "--config", "/etc/rkw/config.yaml"]).unwrap();
        match cli.command {
            Commands::Start { config, .. } => {
                assert_eq!(config, Some(PathBuf::from("/etc/rkw/config.yaml")));
            }
        }
    }
}
