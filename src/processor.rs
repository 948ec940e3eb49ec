// Turn one stats snapshot into published metric values.
//
// The derivation functions are pure: they take the previous baseline (if any)
// and the current counters and decide what to publish. `SampleProcessor` does
// the side effects: swap baselines in the store, then write to the registry.

use crate::delta_store::{CpuHistoryEntry, DeltaStore, NetHistoryEntry, PriorEntries};
use crate::metrics::{ContainerMetrics, SeriesLabels};
use crate::models::{ContainerRef, CpuSample, StatsSnapshot};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info};

/// CPU utilisation in percent of one core, summed over cores.
/// `None` on first observation, or when either delta is not strictly positive.
pub fn cpu_ratio(prev: Option<&CpuHistoryEntry>, cpu: &CpuSample) -> Option<f64> {
    let prev = prev?;
    let cpu_delta = cpu.total_usage as f64 - prev.total_usage as f64;
    let system_delta = cpu.system_usage as f64 - prev.system_usage as f64;
    if cpu_delta <= 0.0 || system_delta <= 0.0 {
        return None;
    }
    let online_cpus = cpu.effective_online_cpus() as f64;
    Some((cpu_delta / system_delta) * online_cpus * 100.0)
}

/// Amount to add to a monotonic counter given the previous and current cumulative
/// totals. `None` for the first observation, a counter reset, or no change.
pub fn counter_increment(prev: Option<u64>, now: u64) -> Option<u64> {
    let prev = prev?;
    match now.checked_sub(prev) {
        Some(delta) if delta > 0 => Some(delta),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetIncrements {
    pub rx: Option<u64>,
    pub tx: Option<u64>,
}

pub fn net_increments(prev: Option<&NetHistoryEntry>, current: &NetHistoryEntry) -> NetIncrements {
    NetIncrements {
        rx: counter_increment(prev.map(|p| p.rx_bytes), current.rx_bytes),
        tx: counter_increment(prev.map(|p| p.tx_bytes), current.tx_bytes),
    }
}

/// Everything decided for one observation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Derived {
    pub first_seen: bool,
    pub cpu_ratio: Option<f64>,
    pub net: NetIncrements,
    /// Previous display name when the container was renamed since the last observation.
    pub renamed_from: Option<String>,
}

pub fn derive(
    prior: &PriorEntries,
    name: &str,
    cpu: &CpuSample,
    net: &NetHistoryEntry,
) -> Derived {
    Derived {
        first_seen: prior.cpu.is_none(),
        cpu_ratio: cpu_ratio(prior.cpu.as_ref(), cpu),
        net: net_increments(prior.net.as_ref(), net),
        renamed_from: prior
            .cpu
            .as_ref()
            .filter(|p| p.name != name)
            .map(|p| p.name.clone()),
    }
}

#[derive(Clone)]
pub struct SampleProcessor {
    store: Arc<DeltaStore>,
    metrics: Arc<ContainerMetrics>,
}

impl SampleProcessor {
    pub fn new(store: Arc<DeltaStore>, metrics: Arc<ContainerMetrics>) -> Self {
        Self { store, metrics }
    }

    /// Advance the container's baselines to `snapshot` and publish what can be derived.
    pub fn process(
        &self,
        container: &ContainerRef,
        snapshot: &StatsSnapshot,
        now: Instant,
    ) -> Derived {
        let (rx_bytes, tx_bytes) = snapshot.network_totals();
        let net = NetHistoryEntry { rx_bytes, tx_bytes };
        let cpu = CpuHistoryEntry {
            total_usage: snapshot.cpu.total_usage,
            system_usage: snapshot.cpu.system_usage,
            last_seen: now,
            name: container.name.clone(),
        };

        let prior = self.store.replace(&container.id, cpu, net);
        let derived = derive(&prior, &container.name, &snapshot.cpu, &net);

        let labels = SeriesLabels::new(&container.name, &container.id);
        if derived.first_seen {
            info!(
                container = %container.name,
                id = %labels.id,
                "New container detected"
            );
        }
        if let Some(old_name) = &derived.renamed_from {
            debug!(
                container = %container.name,
                previous = %old_name,
                id = %labels.id,
                "container renamed; dropping series under previous name"
            );
            self.metrics
                .remove_series(&SeriesLabels::new(old_name, &container.id));
        }

        if let Some(ratio) = derived.cpu_ratio {
            self.metrics.set_cpu_ratio(&labels, ratio);
        }
        self.metrics.set_memory(&labels, &snapshot.memory);
        self.metrics.add_network(&labels, derived.net);
        let (read, written) = snapshot.blkio_totals();
        self.metrics.set_blkio(&labels, read, written);

        derived
    }
}
