// Model helpers: display names, short ids, counter totals

use dockerstats::models::*;

#[test]
fn test_display_name_strips_leading_slash() {
    assert_eq!(display_name(&["/web".to_string()]), "web");
    assert_eq!(display_name(&["/web".to_string(), "/alias".to_string()]), "web");
    assert_eq!(display_name(&["db".to_string()]), "db");
}

#[test]
fn test_display_name_unknown_when_missing() {
    assert_eq!(display_name(&[]), UNKNOWN_NAME);
    assert_eq!(display_name(&["/".to_string()]), UNKNOWN_NAME);
}

#[test]
fn test_short_id_truncates_to_twelve() {
    assert_eq!(short_id("abc123456789deadbeef"), "abc123456789");
    assert_eq!(short_id("abc"), "abc");
    assert_eq!(short_id("abc123456789"), "abc123456789");
    let c = ContainerRef::from_names("0123456789abcdef", &["/api".to_string()]);
    assert_eq!(c.short_id(), "0123456789ab");
    assert_eq!(c.name, "api");
}

#[test]
fn test_effective_online_cpus_fallback() {
    let mut cpu = CpuSample {
        total_usage: 0,
        system_usage: 0,
        online_cpus: 0,
        percpu_usage: vec![1, 2, 3, 4],
    };
    assert_eq!(cpu.effective_online_cpus(), 4);
    cpu.online_cpus = 2;
    assert_eq!(cpu.effective_online_cpus(), 2);
}

#[test]
fn test_blkio_totals_case_insensitive() {
    let s = StatsSnapshot {
        blkio: vec![
            BlkioEntry {
                op: "Read".into(),
                value: 5,
            },
            BlkioEntry {
                op: "READ".into(),
                value: 5,
            },
            BlkioEntry {
                op: "Write".into(),
                value: 7,
            },
            BlkioEntry {
                op: "Sync".into(),
                value: 100,
            },
        ],
        ..Default::default()
    };
    assert_eq!(s.blkio_totals(), (10, 7));
}

#[test]
fn test_snapshot_json_camel_case() {
    let json = r#"{
        "cpu": {"totalUsage": 10, "systemUsage": 20, "onlineCpus": 2},
        "memory": {"usage": 1, "limit": 2},
        "networks": [{"rxBytes": 3, "txBytes": 4}, {"rxBytes": 5, "txBytes": 6}]
    }"#;
    let s: StatsSnapshot = serde_json::from_str(json).unwrap();
    assert_eq!(s.cpu.online_cpus, 2);
    assert!(s.cpu.percpu_usage.is_empty());
    assert_eq!(s.memory.rss, None);
    assert_eq!(s.network_totals(), (8, 10));
    assert!(s.blkio.is_empty());
}
