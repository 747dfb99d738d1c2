use std::collections::HashMap;
use std::time::{Duration, Instant};

use edge_mesh::cluster::{NodeEntry, LOCAL_NODE};
use edge_mesh::proto::{JobRequest, MetricsSnapshot};
use edge_mesh::scheduler::placement::{filter_candidates, select_node};

const TTL: Duration = Duration::from_secs(4);

fn snapshot(cpu: f64, mem: f64, temp_status: &str) -> MetricsSnapshot {
    MetricsSnapshot {
        cpu,
        mem,
        temp_c: 50.0,
        temp_status: temp_status.to_string(),
        zone: "cpu-thermal".to_string(),
    }
}

fn live_entry(cpu: f64, mem: f64, temp_status: &str) -> NodeEntry {
    NodeEntry {
        snapshot: snapshot(cpu, mem, temp_status),
        last_seen: Instant::now(),
    }
}

fn job(req_cpu: f64, req_mem: f64) -> JobRequest {
    JobRequest {
        id: "test-job".to_string(),
        name: "TEST".to_string(),
        image: "busybox".to_string(),
        args: Vec::new(),
        req_cpu,
        req_mem,
    }
}

#[test]
fn feasible_node_is_admitted_to_both_pools() {
    let mut view = HashMap::new();
    view.insert("10.0.0.2".to_string(), live_entry(10.0, 20.0, "SAFE"));

    let pools = filter_candidates(&view, &job(70.0, 10.0), TTL, Instant::now());
    assert_eq!(pools.valid, vec!["10.0.0.2"]);
    assert_eq!(pools.safe, vec!["10.0.0.2"]);
}

#[test]
fn cpu_boundary_equality_is_rejected() {
    let mut view = HashMap::new();
    // 25 + 70 = 95, strictly-less-than fails.
    view.insert("10.0.0.2".to_string(), live_entry(25.0, 10.0, "SAFE"));

    let pools = filter_candidates(&view, &job(70.0, 10.0), TTL, Instant::now());
    assert!(pools.valid.is_empty());
    assert!(pools.pick().is_none());
}

#[test]
fn mem_boundary_equality_is_rejected() {
    let mut view = HashMap::new();
    // 60 + 30 = 90, strictly-less-than fails.
    view.insert("10.0.0.2".to_string(), live_entry(10.0, 60.0, "SAFE"));

    let pools = filter_candidates(&view, &job(10.0, 30.0), TTL, Instant::now());
    assert!(pools.valid.is_empty());
}

#[test]
fn just_under_the_ceiling_is_admitted() {
    let mut view = HashMap::new();
    view.insert("10.0.0.2".to_string(), live_entry(24.9, 59.9, "SAFE"));

    let pools = filter_candidates(&view, &job(70.0, 30.0), TTL, Instant::now());
    assert_eq!(pools.valid, vec!["10.0.0.2"]);
}

#[test]
fn stale_entries_are_excluded() {
    let now = Instant::now();
    let mut view = HashMap::new();
    view.insert(
        "10.0.0.2".to_string(),
        NodeEntry {
            snapshot: snapshot(10.0, 10.0, "SAFE"),
            last_seen: now - Duration::from_secs(5),
        },
    );

    let pools = filter_candidates(&view, &job(10.0, 10.0), TTL, now);
    assert!(pools.valid.is_empty());
}

#[test]
fn entry_within_ttl_is_admitted() {
    let now = Instant::now();
    let mut view = HashMap::new();
    view.insert(
        "10.0.0.2".to_string(),
        NodeEntry {
            snapshot: snapshot(10.0, 10.0, "SAFE"),
            last_seen: now - Duration::from_secs(3),
        },
    );

    let pools = filter_candidates(&view, &job(10.0, 10.0), TTL, now);
    assert_eq!(pools.valid, vec!["10.0.0.2"]);
}

#[test]
fn empty_temp_status_counts_as_safe() {
    let mut view = HashMap::new();
    view.insert("10.0.0.2".to_string(), live_entry(10.0, 10.0, ""));

    let pools = filter_candidates(&view, &job(10.0, 10.0), TTL, Instant::now());
    assert_eq!(pools.safe, vec!["10.0.0.2"]);
}

#[test]
fn warm_node_is_valid_but_not_safe() {
    let mut view = HashMap::new();
    view.insert("warm".to_string(), live_entry(10.0, 10.0, "WARM"));
    view.insert("safe".to_string(), live_entry(10.0, 10.0, "SAFE"));

    let pools = filter_candidates(&view, &job(10.0, 10.0), TTL, Instant::now());
    assert_eq!(pools.valid.len(), 2);
    assert_eq!(pools.safe, vec!["safe"]);

    // The selection pool must be the safe subset.
    assert_eq!(pools.pick().unwrap(), &["safe".to_string()][..]);
}

#[test]
fn pool_falls_back_to_valid_when_no_node_is_safe() {
    let mut view = HashMap::new();
    view.insert("warm".to_string(), live_entry(10.0, 10.0, "WARM"));
    view.insert("hot".to_string(), live_entry(10.0, 10.0, "HOT"));

    let pools = filter_candidates(&view, &job(10.0, 10.0), TTL, Instant::now());
    assert!(pools.safe.is_empty());

    let pool = pools.pick().unwrap();
    assert_eq!(pool.len(), 2);
}

#[test]
fn local_node_always_wins_selection() {
    let pool = vec![
        "10.0.0.2".to_string(),
        "10.0.0.3".to_string(),
        LOCAL_NODE.to_string(),
        "10.0.0.4".to_string(),
    ];

    for _ in 0..50 {
        assert_eq!(select_node(&pool), LOCAL_NODE);
    }
}

#[test]
fn remote_selection_draws_from_the_pool() {
    let pool = vec!["10.0.0.2".to_string(), "10.0.0.3".to_string()];

    let mut seen = std::collections::HashSet::new();
    for _ in 0..200 {
        let selected = select_node(&pool);
        assert!(pool.contains(&selected));
        seen.insert(selected);
    }
    // Uniform draws over 200 rounds hit both members.
    assert_eq!(seen.len(), 2);
}

#[test]
fn overloaded_cluster_yields_no_pool() {
    let mut view = HashMap::new();
    view.insert("a".to_string(), live_entry(99.0, 10.0, "SAFE"));
    view.insert("b".to_string(), live_entry(99.0, 10.0, "SAFE"));

    let pools = filter_candidates(&view, &job(70.0, 10.0), TTL, Instant::now());
    assert!(pools.pick().is_none());
}
