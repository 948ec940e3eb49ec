// Prometheus registry holding every per-container series the exporter publishes.

use crate::models::{MemorySample, short_id};
use crate::processor::NetIncrements;
use crate::version::NAME;
use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};

const LABELS: [&str; 2] = ["name", "id"];

/// Label pair for one container's series. `id` is the 12-char short id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesLabels {
    pub name: String,
    pub id: String,
}

impl SeriesLabels {
    pub fn new(name: &str, full_id: &str) -> Self {
        Self {
            name: name.to_string(),
            id: short_id(full_id).to_string(),
        }
    }

    fn values(&self) -> [&str; 2] {
        [self.name.as_str(), self.id.as_str()]
    }
}

pub struct ContainerMetrics {
    registry: Registry,
    cpu_usage_ratio: GaugeVec,
    memory_usage_bytes: GaugeVec,
    memory_usage_rss_bytes: GaugeVec,
    memory_limit_bytes: GaugeVec,
    memory_usage_ratio: GaugeVec,
    network_received_bytes_total: CounterVec,
    network_transmitted_bytes_total: CounterVec,
    blockio_read_bytes: GaugeVec,
    blockio_written_bytes: GaugeVec,
}

fn gauge(registry: &Registry, name: &str, help: &str) -> prometheus::Result<GaugeVec> {
    let g = GaugeVec::new(Opts::new(name, help).namespace(NAME), &LABELS)?;
    registry.register(Box::new(g.clone()))?;
    Ok(g)
}

fn counter(registry: &Registry, name: &str, help: &str) -> prometheus::Result<CounterVec> {
    let c = CounterVec::new(Opts::new(name, help).namespace(NAME), &LABELS)?;
    registry.register(Box::new(c.clone()))?;
    Ok(c)
}

impl ContainerMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        Ok(Self {
            cpu_usage_ratio: gauge(
                &registry,
                "cpu_usage_ratio",
                "Container CPU usage in percent of one core",
            )?,
            memory_usage_bytes: gauge(&registry, "memory_usage_bytes", "Container memory usage")?,
            memory_usage_rss_bytes: gauge(
                &registry,
                "memory_usage_rss_bytes",
                "Container resident set size",
            )?,
            memory_limit_bytes: gauge(&registry, "memory_limit_bytes", "Container memory limit")?,
            memory_usage_ratio: gauge(
                &registry,
                "memory_usage_ratio",
                "Container memory usage in percent of its limit",
            )?,
            network_received_bytes_total: counter(
                &registry,
                "network_received_bytes_total",
                "Bytes received over all container interfaces",
            )?,
            network_transmitted_bytes_total: counter(
                &registry,
                "network_transmitted_bytes_total",
                "Bytes transmitted over all container interfaces",
            )?,
            blockio_read_bytes: gauge(&registry, "blockio_read_bytes", "Block I/O bytes read")?,
            blockio_written_bytes: gauge(
                &registry,
                "blockio_written_bytes",
                "Block I/O bytes written",
            )?,
            registry,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn set_cpu_ratio(&self, labels: &SeriesLabels, ratio: f64) {
        self.cpu_usage_ratio
            .with_label_values(&labels.values())
            .set(ratio);
    }

    pub fn set_memory(&self, labels: &SeriesLabels, memory: &MemorySample) {
        let values = labels.values();
        let usage = memory.usage as f64;
        let limit = memory.limit as f64;
        self.memory_usage_bytes.with_label_values(&values).set(usage);
        self.memory_limit_bytes.with_label_values(&values).set(limit);
        if limit > 0.0 {
            self.memory_usage_ratio
                .with_label_values(&values)
                .set(usage / limit * 100.0);
        }
        if let Some(rss) = memory.rss {
            self.memory_usage_rss_bytes
                .with_label_values(&values)
                .set(rss as f64);
        }
    }

    pub fn add_network(&self, labels: &SeriesLabels, inc: NetIncrements) {
        if let Some(rx) = inc.rx {
            self.network_received_bytes_total
                .with_label_values(&labels.values())
                .inc_by(rx as f64);
        }
        if let Some(tx) = inc.tx {
            self.network_transmitted_bytes_total
                .with_label_values(&labels.values())
                .inc_by(tx as f64);
        }
    }

    pub fn set_blkio(&self, labels: &SeriesLabels, read: u64, written: u64) {
        let values = labels.values();
        self.blockio_read_bytes
            .with_label_values(&values)
            .set(read as f64);
        self.blockio_written_bytes
            .with_label_values(&values)
            .set(written as f64);
    }

    /// Delete every series under `labels`. Returns how many existed.
    pub fn remove_series(&self, labels: &SeriesLabels) -> usize {
        let values = labels.values();
        let gauges = [
            &self.cpu_usage_ratio,
            &self.memory_usage_bytes,
            &self.memory_usage_rss_bytes,
            &self.memory_limit_bytes,
            &self.memory_usage_ratio,
            &self.blockio_read_bytes,
            &self.blockio_written_bytes,
        ];
        let counters = [
            &self.network_received_bytes_total,
            &self.network_transmitted_bytes_total,
        ];
        // Missing series (e.g. no CPU ratio published yet) report an error; not a failure here.
        let removed_gauges = gauges
            .iter()
            .filter(|g| g.remove_label_values(&values).is_ok())
            .count();
        let removed_counters = counters
            .iter()
            .filter(|c| c.remove_label_values(&values).is_ok())
            .count();
        removed_gauges + removed_counters
    }

    /// Current value of `metric` (name without the namespace prefix) for a label pair,
    /// without creating the series.
    pub fn value(&self, metric: &str, labels: &SeriesLabels) -> Option<f64> {
        let full_name = format!("{}_{}", NAME, metric);
        self.registry
            .gather()
            .iter()
            .filter(|mf| mf.get_name() == full_name)
            .flat_map(|mf| mf.get_metric().iter())
            .find(|m| {
                m.get_label().iter().all(|l| match l.get_name() {
                    "name" => l.get_value() == labels.name,
                    "id" => l.get_value() == labels.id,
                    _ => true,
                })
            })
            .map(|m| {
                if m.has_counter() {
                    m.get_counter().get_value()
                } else {
                    m.get_gauge().get_value()
                }
            })
    }

    /// Number of live series across all metrics.
    pub fn series_count(&self) -> usize {
        self.registry
            .gather()
            .iter()
            .map(|mf| mf.get_metric().len())
            .sum()
    }

    /// Prometheus text exposition of the registry.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}
