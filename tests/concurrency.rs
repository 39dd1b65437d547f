//! Concurrent publish / poll tests.

use pollhub::{long_poll, ChannelConfig, ChannelRegistry, Etag, Waiter};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn test_pollers_reach_last_publish() {
    init_tracing();

    const PUBLISHES: usize = 200;
    const POLLERS: usize = 8;

    let registry = Arc::new(ChannelRegistry::new());
    registry.configure("feed", ChannelConfig::new(16, Duration::from_secs(60)));
    let final_etag = Arc::new(AtomicI64::new(0));

    let pollers: Vec<_> = (0..POLLERS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let final_etag = Arc::clone(&final_etag);
            thread::spawn(move || {
                let deadline = Instant::now() + Duration::from_secs(30);
                let mut etag = Etag::NONE;
                let mut received = 0usize;

                loop {
                    let target = final_etag.load(Ordering::SeqCst);
                    if target != 0 && etag.0 == target {
                        return received;
                    }
                    assert!(Instant::now() < deadline, "poller starved");

                    let response =
                        long_poll(&registry, &[("feed", etag)], Duration::from_millis(50));
                    if let Some(batch) = response.get("feed") {
                        assert!(batch.etag > etag, "etag went backwards");
                        received += batch.payload.len();
                        etag = batch.etag;
                    }
                }
            })
        })
        .collect();

    let channel = registry.get("feed");
    let mut last = Etag::NONE;
    for i in 0..PUBLISHES {
        last = channel.publish(format!("{}", i).into_bytes()).unwrap();
        if i % 20 == 0 {
            thread::sleep(Duration::from_millis(1));
        }
    }
    final_etag.store(last.0, Ordering::SeqCst);

    for poller in pollers {
        let received = poller.join().unwrap();
        assert!(received >= 1);
    }

    assert_eq!(channel.snapshot().unwrap().etag, last);
    assert_eq!(channel.len(), 16);
}

#[test]
fn test_concurrent_publishers_keep_history_ordered() {
    let registry = Arc::new(ChannelRegistry::new());
    let channel = registry.configure("feed", ChannelConfig::new(64, Duration::from_secs(60)));

    let publishers: Vec<_> = (0..4)
        .map(|t| {
            let channel = Arc::clone(&channel);
            thread::spawn(move || {
                (0..16)
                    .map(|i| {
                        let payload = format!("{}-{}", t, i);
                        let etag = channel.publish(payload.clone().into_bytes()).unwrap();
                        (payload, etag)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut etag_of = HashMap::new();
    for publisher in publishers {
        etag_of.extend(publisher.join().unwrap());
    }
    assert_eq!(channel.len(), 64);

    let (history, _) = channel.collect_from(0);
    let history: Vec<String> = history
        .into_iter()
        .map(|p| String::from_utf8(p).unwrap())
        .collect();

    // Each publisher's messages appear in the order it sent them.
    let mut last_seen: HashMap<usize, usize> = HashMap::new();
    for payload in &history {
        let (t, i) = payload.split_once('-').unwrap();
        let (t, i): (usize, usize) = (t.parse().unwrap(), i.parse().unwrap());
        if let Some(&prev) = last_seen.get(&t) {
            assert!(i > prev, "thread {} published {} after {}", t, i, prev);
        }
        last_seen.insert(t, i);
    }
    assert_eq!(last_seen.len(), 4);

    // Etags strictly increase along the history.
    let etags: Vec<Etag> = history.iter().map(|p| etag_of[p]).collect();
    for pair in etags.windows(2) {
        assert!(pair[0] < pair[1]);
    }

    // Every retained etag resumes at the message right after it.
    for (index, etag) in etags.iter().enumerate().take(etags.len() - 1) {
        assert_eq!(channel.has_new_since(*etag), (true, index + 1));
    }
    assert!(!channel.has_new_since(etags[etags.len() - 1]).0);
}

#[test]
fn test_concurrent_configure_single_winner() {
    let registry = Arc::new(ChannelRegistry::new());

    let handles: Vec<_> = (1..=8)
        .map(|capacity| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                registry
                    .configure("shared", ChannelConfig::new(capacity, Duration::from_secs(1)))
                    .capacity()
            })
        })
        .collect();

    let seen: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winner = seen[0];
    assert!(seen.iter().all(|&c| c == winner));
    assert_eq!(registry.stats().channel_count, 1);
}

#[test]
fn test_blocked_waiter_woken_by_other_thread() {
    let registry = Arc::new(ChannelRegistry::new());
    let channel = registry.configure("feed", ChannelConfig::new(4, Duration::from_secs(60)));

    let waiter = Waiter::new();
    channel.subscribe(&waiter);

    let publisher = {
        let channel = Arc::clone(&channel);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            channel.publish(b"wake".to_vec()).unwrap()
        })
    };

    let event = waiter.recv().unwrap();
    let etag = publisher.join().unwrap();

    assert_eq!(event.message.created, etag);
    assert_eq!(channel.waiter_count(), 0);
}

#[test]
fn test_timed_out_waiter_unsubscribes() {
    let registry = ChannelRegistry::new();
    let channel = registry.configure("feed", ChannelConfig::new(4, Duration::from_secs(60)));

    let waiter = Waiter::new();
    channel.subscribe(&waiter);
    assert!(waiter.recv_timeout(Duration::from_millis(10)).is_err());
    channel.unsubscribe(&waiter);

    channel.publish(b"late".to_vec()).unwrap();
    assert!(waiter.try_recv().is_err());
}
