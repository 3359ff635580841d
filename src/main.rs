//! config-sync daemon.
//!
//! Subscribes to a set of namespaces on an Apollo config server and logs
//! every change the long-poll loop picks up.
//!
//! ```text
//! config.toml ─▶ ClientConfig ─▶ ConfigManager ─▶ get_config(ns) for each namespace
//!                                      │
//!                                      └─ poll loop ─▶ loader refresh ─▶ change events ─▶ log
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::sync::broadcast;

use config_sync::config::validation::validate_config;
use config_sync::config::{load_config, ClientConfig, ConfigError};
use config_sync::lifecycle::{signals, Shutdown};
use config_sync::observability::{logging, metrics};
use config_sync::{ConfigChangeEvent, ConfigManager};

#[derive(Parser)]
#[command(name = "config-sync")]
#[command(about = "Keep namespaces from an Apollo config server in sync", long_about = None)]
struct Cli {
    /// TOML settings file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Config server URL (overrides the file).
    #[arg(long)]
    server: Option<String>,

    #[arg(long)]
    app_id: Option<String>,

    #[arg(long)]
    cluster: Option<String>,

    /// Namespace to watch; repeat for several (overrides the file).
    #[arg(short, long = "namespace")]
    namespaces: Vec<String>,
}

impl Cli {
    fn into_config(self) -> Result<ClientConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ClientConfig::default(),
        };

        if let Some(server) = self.server {
            config.config_server_url = server;
        }
        if let Some(app_id) = self.app_id {
            config.app_id = app_id;
        }
        if let Some(cluster) = self.cluster {
            config.cluster_name = cluster;
        }
        if !self.namespaces.is_empty() {
            config.namespaces = self.namespaces;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init_logging(&format!("config_sync={}", config.observability.log_level));

    tracing::info!(
        server = %config.config_server_url,
        app_id = %config.app_id,
        cluster = %config.cluster_name,
        namespaces = ?config.namespaces,
        "config-sync starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let manager = ConfigManager::connect(&config)?;
    let shutdown = Shutdown::new();

    for namespace in &config.namespaces {
        match manager.get_config(namespace, config.client_ip.as_deref()).await {
            Ok(handle) => {
                tracing::info!(
                    namespace = %handle.namespace_name(),
                    notification_id = handle.notification_id(),
                    "Watching namespace"
                );
                tokio::spawn(log_changes(handle.subscribe(), shutdown.subscribe()));
            }
            Err(e) => tracing::error!(namespace = %namespace, error = %e, "Cannot watch namespace"),
        }
    }

    signals::wait_for_shutdown_signal().await;
    shutdown.trigger();

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn log_changes(
    mut changes: broadcast::Receiver<ConfigChangeEvent>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            event = changes.recv() => match event {
                Ok(event) => {
                    for change in &event.changes {
                        tracing::info!(
                            namespace = %event.namespace,
                            key = %change.key,
                            change = ?change.change_type,
                            old = ?change.old_value,
                            new = ?change.new_value,
                            "Config change"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Change listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = shutdown.recv() => break,
        }
    }
}
