//! # Issuer Runtime
//!
//! Entry point of the issuance pipeline.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (logs + metrics registry)
//! 2. Load configuration (defaults, `VC_CONFIG` file, env overrides)
//! 3. Build the service container (stores, queue backend, signing client)
//! 4. Start the queue service: recover in-flight tasks, spawn workers
//! 5. Serve `/metrics` and sample queue depths until Ctrl+C
//! 6. Close the queue service, joining every worker and the metrics server

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use issuer_runtime::{metrics, IssuerConfig, QueueService, ServiceContainer};
use vc_telemetry::{init_telemetry, TelemetryConfig};

/// Interval between queue depth samples.
const DEPTH_SAMPLE_INTERVAL: Duration = Duration::from_secs(15);

/// The running issuer process.
struct IssuerRuntime {
    container: ServiceContainer,
    queues: QueueService,
    metrics_server: JoinHandle<std::io::Result<()>>,
}

impl IssuerRuntime {
    /// Build the services and start one worker per queue.
    async fn start(config: IssuerConfig, metrics_port: u16) -> Result<Self> {
        info!("===========================================");
        info!("  VC Issuer Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let container =
            ServiceContainer::new(config).context("Failed to build service container")?;
        let queues = QueueService::start(
            &container.config.queues,
            container.queue_backend.clone(),
            container.pipeline(),
        )
        .await
        .context("Failed to start queue service")?;

        info!(
            workers = queues.worker_count(),
            data_dir = %container.config.storage.data_dir.display(),
            "Issuer is running"
        );
        let metrics_server = tokio::spawn(metrics::serve(metrics_port, queues.shutdown_signal()));
        Ok(Self {
            container,
            queues,
            metrics_server,
        })
    }

    /// Publish queue depths periodically until shutdown.
    async fn sample_depths_until_shutdown(&self) {
        let mut shutdown = self.queues.shutdown_signal();
        let mut ticker = tokio::time::interval(DEPTH_SAMPLE_INTERVAL);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.queues.sample_depths().await {
                        warn!(error = %e, "Failed to sample queue depths");
                    }
                }
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        error!(error = %e, "Failed to listen for Ctrl+C");
                    }
                    return;
                }
                _ = shutdown.changed() => return,
            }
        }
    }

    /// Signal shutdown and wait for every worker.
    async fn shutdown(self) -> Result<()> {
        info!("Initiating graceful shutdown...");
        let result = self.queues.close().await;
        match self.metrics_server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Metrics server failed"),
            Err(e) => warn!(error = %e, "Metrics server task panicked"),
        }
        // Drop stores after the workers that use them.
        drop(self.container);
        result.context("A worker ended with an error")?;
        info!("Shutdown complete");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env();
    init_telemetry(&telemetry).context("Failed to initialize telemetry")?;

    let config = IssuerConfig::load().context("Failed to load configuration")?;

    let runtime = IssuerRuntime::start(config, telemetry.metrics_port).await?;

    info!("Press Ctrl+C to stop.");
    runtime.sample_depths_until_shutdown().await;

    runtime.shutdown().await
}
