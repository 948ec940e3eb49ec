// Convert a raw Docker stats API response into a StatsSnapshot.

use crate::models::{BlkioEntry, CpuSample, MemorySample, NetworkSample, StatsSnapshot};
use bollard::models::ContainerStatsResponse;

/// Extract the cumulative counters we publish. Missing `cpu_stats` means the
/// payload is unusable; every other section defaults to zero/empty.
pub fn to_snapshot(s: &ContainerStatsResponse) -> Result<StatsSnapshot, String> {
    let cpu_stats = s
        .cpu_stats
        .as_ref()
        .ok_or_else(|| "missing cpu_stats".to_string())?;
    let cpu_usage = cpu_stats.cpu_usage.as_ref();

    let cpu = CpuSample {
        total_usage: cpu_usage.and_then(|u| u.total_usage).unwrap_or(0),
        system_usage: cpu_stats.system_cpu_usage.unwrap_or(0),
        online_cpus: cpu_stats.online_cpus.unwrap_or(0),
        percpu_usage: cpu_usage
            .and_then(|u| u.percpu_usage.clone())
            .unwrap_or_default(),
    };

    let memory = s
        .memory_stats
        .as_ref()
        .map_or_else(MemorySample::default, |m| MemorySample {
            usage: m.usage.unwrap_or(0),
            limit: m.limit.unwrap_or(0),
            rss: m.stats.as_ref().and_then(|st| st.get("rss").copied()),
        });

    let networks = s
        .networks
        .as_ref()
        .map(|n| {
            n.values()
                .map(|v| NetworkSample {
                    rx_bytes: v.rx_bytes.unwrap_or(0),
                    tx_bytes: v.tx_bytes.unwrap_or(0),
                })
                .collect()
        })
        .unwrap_or_default();

    let blkio = s
        .blkio_stats
        .as_ref()
        .and_then(|b| b.io_service_bytes_recursive.as_ref())
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| {
                    Some(BlkioEntry {
                        op: e.op.clone()?,
                        value: e.value.unwrap_or(0),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(StatsSnapshot {
        cpu,
        memory,
        networks,
        blkio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bollard::models::{
        ContainerBlkioStatEntry, ContainerBlkioStats, ContainerCpuStats, ContainerCpuUsage,
        ContainerMemoryStats, ContainerNetworkStats, ContainerStatsResponse,
    };
    use std::collections::HashMap;

    fn cpu_stats(total_usage: u64, system_cpu_usage: u64, online: u32) -> ContainerCpuStats {
        ContainerCpuStats {
            cpu_usage: Some(ContainerCpuUsage {
                total_usage: Some(total_usage),
                percpu_usage: Some(vec![total_usage / 2, total_usage / 2]),
                ..Default::default()
            }),
            system_cpu_usage: Some(system_cpu_usage),
            online_cpus: Some(online),
            throttling_data: None,
        }
    }

    #[test]
    fn to_snapshot_rejects_missing_cpu_stats() {
        let s = ContainerStatsResponse {
            cpu_stats: None,
            ..Default::default()
        };
        let err = to_snapshot(&s).unwrap_err();
        assert!(err.contains("cpu_stats"));
    }

    #[test]
    fn to_snapshot_extracts_all_sections() {
        let s = ContainerStatsResponse {
            cpu_stats: Some(cpu_stats(1_000, 50_000, 4)),
            memory_stats: Some(ContainerMemoryStats {
                usage: Some(256 * 1024 * 1024),
                limit: Some(512 * 1024 * 1024),
                stats: Some(HashMap::from([("rss".to_string(), 100 * 1024 * 1024)])),
                ..Default::default()
            }),
            networks: Some(HashMap::from([
                (
                    "eth0".to_string(),
                    ContainerNetworkStats {
                        rx_bytes: Some(1000),
                        tx_bytes: Some(2000),
                        ..Default::default()
                    },
                ),
                (
                    "eth1".to_string(),
                    ContainerNetworkStats {
                        rx_bytes: Some(10),
                        tx_bytes: Some(20),
                        ..Default::default()
                    },
                ),
            ])),
            blkio_stats: Some(ContainerBlkioStats {
                io_service_bytes_recursive: Some(vec![
                    ContainerBlkioStatEntry {
                        op: Some("Read".to_string()),
                        value: Some(100),
                        ..Default::default()
                    },
                    ContainerBlkioStatEntry {
                        op: Some("write".to_string()),
                        value: Some(200),
                        ..Default::default()
                    },
                    ContainerBlkioStatEntry {
                        op: None,
                        value: Some(999),
                        ..Default::default()
                    },
                ]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let out = to_snapshot(&s).unwrap();
        assert_eq!(out.cpu.total_usage, 1_000);
        assert_eq!(out.cpu.system_usage, 50_000);
        assert_eq!(out.cpu.online_cpus, 4);
        assert_eq!(out.cpu.percpu_usage.len(), 2);
        assert_eq!(out.memory.usage, 256 * 1024 * 1024);
        assert_eq!(out.memory.limit, 512 * 1024 * 1024);
        assert_eq!(out.memory.rss, Some(100 * 1024 * 1024));
        assert_eq!(out.network_totals(), (1010, 2020));
        assert_eq!(out.blkio.len(), 2);
        assert_eq!(out.blkio_totals(), (100, 200));
    }

    #[test]
    fn to_snapshot_defaults_optional_sections() {
        let s = ContainerStatsResponse {
            cpu_stats: Some(ContainerCpuStats {
                cpu_usage: None,
                system_cpu_usage: None,
                online_cpus: None,
                throttling_data: None,
            }),
            ..Default::default()
        };
        let out = to_snapshot(&s).unwrap();
        assert_eq!(out.cpu.total_usage, 0);
        assert_eq!(out.cpu.effective_online_cpus(), 0);
        assert_eq!(out.memory.rss, None);
        assert!(out.networks.is_empty());
        assert_eq!(out.blkio_totals(), (0, 0));
    }
}
