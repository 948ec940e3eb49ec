// Background polling loop: list containers, sample each one with bounded concurrency,
// wait for every sample, then evict stale containers. Ticks never overlap.

use crate::config::MonitoringConfig;
use crate::delta_store::DeltaStore;
use crate::error::SourceError;
use crate::metrics::ContainerMetrics;
use crate::models::ContainerRef;
use crate::processor::SampleProcessor;
use crate::reaper;
use crate::source::SnapshotSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{Instant, interval};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, warn};

/// Source, state and shutdown signal shared by the loop and its sampling tasks.
#[derive(Clone)]
pub struct WorkerDeps {
    pub source: Arc<dyn SnapshotSource>,
    pub store: Arc<DeltaStore>,
    pub metrics: Arc<ContainerMetrics>,
    pub shutdown: CancellationToken,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub interval: Duration,
    /// Max in-flight stats fetches per tick.
    pub max_workers: usize,
    pub staleness_window: Duration,
    pub fetch_timeout: Duration,
}

impl From<&MonitoringConfig> for WorkerConfig {
    fn from(m: &MonitoringConfig) -> Self {
        Self {
            interval: m.interval(),
            max_workers: m.max_workers,
            staleness_window: m.staleness_window(),
            fetch_timeout: m.fetch_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    Sampled,
    Failed,
    Cancelled,
}

/// What one tick did; logged at debug level and returned for tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The container list call failed; nothing else ran.
    pub skipped: bool,
    pub listed: usize,
    pub sampled: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub evicted: usize,
}

/// Spawns the polling loop. It exits once `deps.shutdown` is cancelled and the
/// current tick's tasks have drained.
pub fn spawn(deps: WorkerDeps, config: WorkerConfig) -> tokio::task::JoinHandle<()> {
    let worker_span = tracing::span!(
        tracing::Level::DEBUG,
        "worker",
        interval_secs = config.interval.as_secs(),
        max_workers = config.max_workers
    );
    tokio::spawn(
        async move {
            let mut tick = interval(config.interval);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = deps.shutdown.cancelled() => {
                        debug!("Worker shutting down");
                        break;
                    }
                    _ = tick.tick() => {}
                }
                let report = run_one_tick(&deps, &config).await;
                debug!(
                    listed = report.listed,
                    sampled = report.sampled,
                    failed = report.failed,
                    cancelled = report.cancelled,
                    evicted = report.evicted,
                    skipped = report.skipped,
                    "tick complete"
                );
            }
        }
        .instrument(worker_span),
    )
}

/// One full cycle: list, fan out, join, reap.
pub async fn run_one_tick(deps: &WorkerDeps, config: &WorkerConfig) -> TickReport {
    // Staleness is measured from the tick start, not from when fetches finish.
    let tick_started = Instant::now();
    let containers = match deps.source.list_containers().await {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, operation = "list_containers", "container list failed; skipping tick");
            return TickReport {
                skipped: true,
                ..Default::default()
            };
        }
    };

    let mut report = TickReport {
        listed: containers.len(),
        ..Default::default()
    };

    let slots = Arc::new(Semaphore::new(config.max_workers));
    let processor = SampleProcessor::new(deps.store.clone(), deps.metrics.clone());
    let mut tasks = JoinSet::new();

    for container in containers {
        let slots = slots.clone();
        let source = deps.source.clone();
        let processor = processor.clone();
        let shutdown = deps.shutdown.clone();
        let fetch_timeout = config.fetch_timeout;
        tasks.spawn(async move {
            let _permit = tokio::select! {
                permit = slots.acquire_owned() => match permit {
                    Ok(p) => p,
                    Err(_) => return SampleOutcome::Failed,
                },
                _ = shutdown.cancelled() => return SampleOutcome::Cancelled,
            };
            sample_container(
                source.as_ref(),
                &processor,
                &container,
                fetch_timeout,
                &shutdown,
            )
            .await
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(SampleOutcome::Sampled) => report.sampled += 1,
            Ok(SampleOutcome::Failed) => report.failed += 1,
            Ok(SampleOutcome::Cancelled) => report.cancelled += 1,
            Err(e) => {
                warn!(error = %e, "sampling task panicked");
                report.failed += 1;
            }
        }
    }

    if !deps.shutdown.is_cancelled() {
        report.evicted = reaper::reap(
            &deps.store,
            &deps.metrics,
            tick_started,
            config.staleness_window,
        );
    }
    report
}

/// Fetch and process one container. Failures leave its state untouched.
pub async fn sample_container(
    source: &dyn SnapshotSource,
    processor: &SampleProcessor,
    container: &ContainerRef,
    fetch_timeout: Duration,
    shutdown: &CancellationToken,
) -> SampleOutcome {
    let fetch = tokio::time::timeout(fetch_timeout, source.fetch_stats(&container.id));
    let result = tokio::select! {
        r = fetch => r.unwrap_or_else(|_| Err(SourceError::Timeout {
            id: container.id.clone(),
            after: fetch_timeout,
        })),
        _ = shutdown.cancelled() => return SampleOutcome::Cancelled,
    };

    match result {
        Ok(snapshot) => {
            processor.process(container, &snapshot, Instant::now());
            SampleOutcome::Sampled
        }
        Err(e) => {
            warn!(
                container = %container.name,
                id = %container.short_id(),
                error = %e,
                operation = "fetch_stats",
                "stats fetch failed"
            );
            SampleOutcome::Failed
        }
    }
}
