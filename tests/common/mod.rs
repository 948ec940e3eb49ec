// Shared test helpers: a scriptable in-memory snapshot source and snapshot builders.

#![allow(dead_code)]

use async_trait::async_trait;
use dockerstats::delta_store::DeltaStore;
use dockerstats::error::SourceError;
use dockerstats::metrics::ContainerMetrics;
use dockerstats::models::{
    BlkioEntry, ContainerRef, CpuSample, MemorySample, NetworkSample, StatsSnapshot,
};
use dockerstats::source::SnapshotSource;
use dockerstats::worker::{WorkerConfig, WorkerDeps};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const WEB_ID: &str = "abc123456789def0123456789abcdef0123456789abcdef0123456789abcdef0";

pub fn snapshot(total: u64, system: u64, online: u32, rx: u64, tx: u64) -> StatsSnapshot {
    StatsSnapshot {
        cpu: CpuSample {
            total_usage: total,
            system_usage: system,
            online_cpus: online,
            percpu_usage: vec![],
        },
        memory: MemorySample {
            usage: 100,
            limit: 400,
            rss: None,
        },
        networks: vec![NetworkSample {
            rx_bytes: rx,
            tx_bytes: tx,
        }],
        blkio: vec![
            BlkioEntry {
                op: "read".into(),
                value: 10,
            },
            BlkioEntry {
                op: "write".into(),
                value: 20,
            },
        ],
    }
}

pub fn container(id: &str, name: &str) -> ContainerRef {
    ContainerRef {
        id: id.to_string(),
        name: name.to_string(),
    }
}

/// In-memory source. Fetches can be delayed to observe concurrency.
#[derive(Default)]
pub struct FakeSource {
    containers: Mutex<Vec<ContainerRef>>,
    fail_list: Mutex<bool>,
    snapshots: Mutex<HashMap<String, Result<StatsSnapshot, String>>>,
    delay: Mutex<Duration>,
    pub list_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    /// List calls made while a fetch was still running.
    pub lists_during_fetch: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_containers(&self, containers: Vec<ContainerRef>) {
        *self.containers.lock().unwrap() = containers;
    }

    pub fn set_fail_list(&self, fail: bool) {
        *self.fail_list.lock().unwrap() = fail;
    }

    pub fn set_snapshot(&self, id: &str, snapshot: StatsSnapshot) {
        self.snapshots
            .lock()
            .unwrap()
            .insert(id.to_string(), Ok(snapshot));
    }

    pub fn set_fetch_error(&self, id: &str, reason: &str) {
        self.snapshots
            .lock()
            .unwrap()
            .insert(id.to_string(), Err(reason.to_string()));
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }
}

#[async_trait]
impl SnapshotSource for FakeSource {
    async fn list_containers(&self) -> Result<Vec<ContainerRef>, SourceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            self.lists_during_fetch.fetch_add(1, Ordering::SeqCst);
        }
        if *self.fail_list.lock().unwrap() {
            return Err(SourceError::List("daemon unavailable".into()));
        }
        Ok(self.containers.lock().unwrap().clone())
    }

    async fn fetch_stats(&self, id: &str) -> Result<StatsSnapshot, SourceError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let result = self.snapshots.lock().unwrap().get(id).cloned();

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match result {
            Some(Ok(s)) => Ok(s),
            Some(Err(reason)) => Err(SourceError::Fetch {
                id: id.to_string(),
                reason,
            }),
            None => Err(SourceError::Fetch {
                id: id.to_string(),
                reason: "no such container".into(),
            }),
        }
    }
}

pub struct Harness {
    pub source: Arc<FakeSource>,
    pub deps: WorkerDeps,
    pub config: WorkerConfig,
}

pub fn harness(max_workers: usize) -> Harness {
    let source = FakeSource::new();
    let deps = WorkerDeps {
        source: source.clone(),
        store: Arc::new(DeltaStore::new()),
        metrics: Arc::new(ContainerMetrics::new().unwrap()),
        shutdown: CancellationToken::new(),
    };
    let config = WorkerConfig {
        interval: Duration::from_secs(10),
        max_workers,
        staleness_window: Duration::from_secs(20),
        fetch_timeout: Duration::from_secs(10),
    };
    Harness {
        source,
        deps,
        config,
    }
}
