// One point-in-time resource sample for a container

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub cpu: CpuSample,
    pub memory: MemorySample,
    #[serde(default)]
    pub networks: Vec<NetworkSample>,
    #[serde(default)]
    pub blkio: Vec<BlkioEntry>,
}

/// Cumulative CPU counters (nanoseconds) as reported by the daemon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuSample {
    pub total_usage: u64,
    pub system_usage: u64,
    #[serde(default)]
    pub online_cpus: u32,
    #[serde(default)]
    pub percpu_usage: Vec<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySample {
    pub usage: u64,
    pub limit: u64,
    /// Only reported on cgroup v1 hosts.
    #[serde(default)]
    pub rss: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSample {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlkioEntry {
    pub op: String,
    pub value: u64,
}

impl CpuSample {
    /// Online CPU count, falling back to the per-CPU breakdown length when unreported.
    pub fn effective_online_cpus(&self) -> u32 {
        if self.online_cpus > 0 {
            self.online_cpus
        } else {
            self.percpu_usage.len() as u32
        }
    }
}

impl StatsSnapshot {
    /// (rx, tx) summed over every interface.
    pub fn network_totals(&self) -> (u64, u64) {
        self.networks.iter().fold((0u64, 0u64), |(rx, tx), n| {
            (rx.saturating_add(n.rx_bytes), tx.saturating_add(n.tx_bytes))
        })
    }

    /// (read, write) bytes; op names are matched case-insensitively, other ops ignored.
    pub fn blkio_totals(&self) -> (u64, u64) {
        let mut read = 0u64;
        let mut write = 0u64;
        for e in &self.blkio {
            if e.op.eq_ignore_ascii_case("read") {
                read = read.saturating_add(e.value);
            } else if e.op.eq_ignore_ascii_case("write") {
                write = write.saturating_add(e.value);
            }
        }
        (read, write)
    }
}
