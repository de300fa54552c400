use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use libsupervisor::{ProcessManager, SystemMonitor};
use rkw::cli::{Cli, Commands, resolve_config};
use rkw::{api, logging};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

const CPU_SAMPLE_PERIOD: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            config,
            config_body,
        } => {
            let conf = resolve_config(config, config_body)?;
            logging::init(&conf.base.log_level)?;

            let addr = format!("0.0.0.0:{}", conf.http_port);
            let drain_timeout = Duration::from_secs(conf.drain_timeout_secs);
            let monitor = Arc::new(SystemMonitor::new());
            let sampler = monitor.clone().spawn_sampler(CPU_SAMPLE_PERIOD);
            let manager = Arc::new(ProcessManager::new(conf, monitor));

            let listener = TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {addr}"))?;
            info!("serving on {addr}");
            axum::serve(listener, api::router(manager.clone()))
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("http server failed")?;

            let active = manager.list_active().await;
            info!(?active, "draining handlers");
            if !manager.drain(drain_timeout).await {
                warn!("exiting with handlers still running");
            }
            sampler.abort();
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutting down");
}
