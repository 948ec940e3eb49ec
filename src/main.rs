use anyhow::Result;
use clap::Parser;
use dockerstats::*;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    if cli.version {
        println!("{}", version::version_line());
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load(&cli)?;

    let docker_repo = docker_repo::DockerRepo::connect(&app_config.docker)
        .await
        .map_err(|e| anyhow::anyhow!("Unable to create Docker client: {}", e))?;
    docker_repo
        .ping()
        .await
        .map_err(|e| anyhow::anyhow!("Could not connect to Docker: {}", e))?;
    tracing::info!("Connection established");

    let metrics = Arc::new(
        metrics::ContainerMetrics::new()
            .map_err(|e| anyhow::anyhow!("metrics registry: {}", e))?,
    );
    let store = Arc::new(delta_store::DeltaStore::new());
    let shutdown = CancellationToken::new();

    let mut worker_handle = worker::spawn(
        worker::WorkerDeps {
            source: Arc::new(docker_repo),
            store,
            metrics: metrics.clone(),
            shutdown: shutdown.clone(),
        },
        worker::WorkerConfig::from(&app_config.monitoring),
    );

    let app = routes::app(metrics);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        interval_secs = app_config.monitoring.interval_secs,
        max_workers = app_config.monitoring.max_workers,
        "{} listening on http://{}",
        version::FULL_NAME,
        addr
    );

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        joined = &mut worker_handle => {
            // The worker only returns on cancellation, so any exit here is fatal.
            shutdown.cancel();
            match joined {
                Ok(()) => anyhow::bail!("stats worker stopped unexpectedly"),
                Err(e) => {
                    tracing::error!(error = %e, "stats worker panicked");
                    anyhow::bail!("stats worker panicked: {}", e);
                }
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
            shutdown.cancel();
            let _ = worker_handle.await;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        ) {
            Ok(s) => s,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
