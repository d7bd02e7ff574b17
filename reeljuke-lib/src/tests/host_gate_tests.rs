use super::*;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Spawn `tasks` workers all hitting `host` and record the peak number of
/// concurrently-held slots.
async fn peak_concurrency(gate: Arc<HostGate>, host: &'static str, tasks: usize) -> usize {
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..tasks)
        .map(|_| {
            let gate = gate.clone();
            let active = active.clone();
            let peak = peak.clone();
            tokio::spawn(async move {
                let _slot = gate.slot(host).await;
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }
    peak.load(Ordering::SeqCst)
}

#[tokio::test]
async fn default_rule_allows_one_slot_per_host() {
    let gate = Arc::new(HostGate::default());
    assert_eq!(peak_concurrency(gate, "www.imdb.com", 8).await, 1);
}

#[tokio::test]
async fn configured_rule_raises_the_limit() {
    let gate = Arc::new(HostGate::new(r".*=1, example\.com=3"));
    assert_eq!(gate.limit_for("example.com").await, 3);
    let observed = peak_concurrency(gate, "example.com", 12).await;
    assert!(observed <= 3, "held {} slots with a limit of 3", observed);
}

#[tokio::test]
async fn hosts_are_limited_independently() {
    let gate = Arc::new(HostGate::new(r".*=1, services\.tvrage\.com=2"));
    let a = tokio::spawn(peak_concurrency(gate.clone(), "services.tvrage.com", 6));
    let b = tokio::spawn(peak_concurrency(gate.clone(), "www.moviemeter.nl", 6));
    assert!(a.await.unwrap() <= 2);
    assert_eq!(b.await.unwrap(), 1);
}

#[tokio::test]
async fn slot_is_released_on_failure_paths() {
    let gate = HostGate::new(".*=1");

    for _ in 0..3 {
        let result: Result<(), ()> = async {
            let _slot = gate.slot("flaky.example").await;
            Err(())
        }
        .await;
        assert!(result.is_err());
    }

    // If any of the failed brackets leaked its slot, this acquire would hang.
    tokio::time::timeout(Duration::from_secs(1), gate.slot("flaky.example"))
        .await
        .expect("slot was not released after a failed call");
}

#[tokio::test]
async fn longest_matching_pattern_wins() {
    let gate = HostGate::new(r".*=1, .*\.imdb\.com=2, www\.imdb\.com=4");
    assert_eq!(gate.limit_for("www.imdb.com").await, 4);
    assert_eq!(gate.limit_for("m.imdb.com").await, 2);
    assert_eq!(gate.limit_for("other.example").await, 1);
}

#[tokio::test]
async fn invalid_rule_patterns_are_ignored() {
    let gate = HostGate::new(r"[=2, example\.org=3");
    assert_eq!(gate.limit_for("example.org").await, 3);
    assert_eq!(gate.limit_for("anything.else").await, 1);
}

#[tokio::test]
async fn explicit_fallback_rule_overrides_default() {
    let gate = HostGate::new(".*=2");
    assert_eq!(gate.limit_for("anything.example").await, 2);
}

#[tokio::test]
async fn host_matching_is_case_insensitive() {
    let gate = HostGate::new(r".*=1, www\.imdb\.com=2");
    assert_eq!(gate.limit_for("WWW.IMDB.COM").await, 2);
}
