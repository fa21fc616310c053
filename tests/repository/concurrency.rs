//! Concurrency tests
//!
//! Many threads against one repository: uniqueness holds under races, the
//! ETag ordinal reflects a total order of mutations, and readers never see
//! a half-applied write.

use crate::common::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 8;

/// All threads race to create the same key; exactly one wins.
#[test]
fn concurrent_duplicate_creates_single_winner() {
    let repo = Arc::new(plain_repo());
    let barrier = Arc::new(Barrier::new(THREADS));
    let created = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let repo = Arc::clone(&repo);
            let barrier = Arc::clone(&barrier);
            let created = Arc::clone(&created);
            thread::spawn(move || {
                barrier.wait();
                let rs = repo
                    .create(&Account::new("same", &format!("u{}", i), 1), None)
                    .unwrap();
                match rs.status() {
                    201 => {
                        created.fetch_add(1, Ordering::SeqCst);
                    }
                    409 => {}
                    other => panic!("unexpected status {}", other),
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert_eq!(repo.count(), 1);
    assert_eq!(repo.count_reference(), 1);
    assert_eq!(ordinal(&repo.etag()), 1);
}

/// Distinct keys racing for one reference; exactly one owns it.
#[test]
fn concurrent_reference_claims_single_owner() {
    let repo = Arc::new(plain_repo());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let repo = Arc::clone(&repo);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                repo.create(&Account::new(&format!("k{}", i), "shared", 1), None)
                    .unwrap()
                    .status()
            })
        })
        .collect();

    let statuses: Vec<u16> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(statuses.iter().filter(|s| **s == 201).count(), 1);
    assert_eq!(statuses.iter().filter(|s| **s == 409).count(), THREADS - 1);

    let owner = repo.read_by_ref("userid", "shared", None).unwrap();
    assert_eq!(owner.status(), 200);
}

/// Every successful mutation advances the ordinal by exactly one.
#[test]
fn concurrent_mutations_total_order() {
    let repo = Arc::new(plain_repo());
    let barrier = Arc::new(Barrier::new(THREADS));
    let per_thread = 50;

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let repo = Arc::clone(&repo);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut successes = 0u64;
                for i in 0..per_thread {
                    let id = format!("t{}-{}", t, i);
                    let entity = Account::new(&id, &id, i as i64);
                    if repo.create(&entity, None).unwrap().status() == 201 {
                        successes += 1;
                    }
                    if i % 2 == 0 && repo.update(&entity, None).unwrap().status() == 200 {
                        successes += 1;
                    }
                    if i % 5 == 0 && repo.delete(&id, None).unwrap().status() == 200 {
                        successes += 1;
                    }
                }
                successes
            })
        })
        .collect();

    let total: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(ordinal(&repo.etag()), total);

    let created = (THREADS * per_thread) as u64;
    let deleted = (THREADS * ((per_thread + 4) / 5)) as u64;
    assert_eq!(repo.count() as u64, created - deleted);
    assert_eq!(repo.count_reference(), repo.count());
}

/// Observed ordinals never go backwards for any reader.
#[test]
fn concurrent_etag_monotonic_for_readers() {
    let repo = Arc::new(plain_repo());
    let barrier = Arc::new(Barrier::new(THREADS + 1));

    let readers: Vec<_> = (0..THREADS)
        .map(|_| {
            let repo = Arc::clone(&repo);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut last = 0;
                for _ in 0..500 {
                    let now = ordinal(&repo.etag());
                    assert!(now >= last, "ordinal went backwards: {} -> {}", last, now);
                    last = now;
                }
            })
        })
        .collect();

    barrier.wait();
    for i in 0..200 {
        let id = format!("w{}", i);
        repo.create(&Account::new(&id, &id, 0), None).unwrap();
    }

    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(ordinal(&repo.etag()), 200);
}

/// Readers racing an updater see either the old or the new entity, never a
/// mix, and the signature verifies every time.
#[test]
fn concurrent_reads_see_whole_versions() {
    let repo = Arc::new(versioned_repo());
    repo.create(&Account::new("a", "u1", 0), None).unwrap();
    let barrier = Arc::new(Barrier::new(THREADS + 1));

    let readers: Vec<_> = (0..THREADS)
        .map(|_| {
            let repo = Arc::clone(&repo);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut seen = HashSet::new();
                for _ in 0..300 {
                    let rs = repo.read(&"a".to_string(), None).unwrap();
                    assert_eq!(rs.status(), 200);
                    let entity = rs.entity.unwrap();
                    assert_eq!(entity.user_id, "u1");
                    seen.insert(entity.second);
                }
                seen.len()
            })
        })
        .collect();

    barrier.wait();
    let mut current = repo.read(&"a".to_string(), None).unwrap().entity.unwrap();
    for i in 1..=100 {
        current.second = i;
        current = repo.update(&current, None).unwrap().entity.unwrap();
    }

    for r in readers {
        assert!(r.join().unwrap() >= 1);
    }
    assert_eq!(ordinal(&repo.etag()), 101);
}

/// Two writers holding the same version: one wins, the other is rejected.
#[test]
fn concurrent_updates_same_version_one_wins() {
    for _ in 0..20 {
        let repo = Arc::new(versioned_repo());
        let base = repo
            .create(&Account::new("a", "u1", 0), None)
            .unwrap()
            .entity
            .unwrap();
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|i| {
                let repo = Arc::clone(&repo);
                let barrier = Arc::clone(&barrier);
                let mut entity = base.clone();
                entity.second = i + 1;
                thread::spawn(move || {
                    barrier.wait();
                    repo.update(&entity, None).unwrap().status()
                })
            })
            .collect();

        let mut statuses: Vec<u16> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        statuses.sort();
        assert_eq!(statuses, vec![200, 409]);
    }
}

/// Searches run against a snapshot while writers keep going.
#[test]
fn concurrent_search_with_writers() {
    let repo = Arc::new(plain_repo());
    for i in 0..100 {
        let id = format!("s{:03}", i);
        repo.create(&Account::new(&id, &id, i), None).unwrap();
    }
    let barrier = Arc::new(Barrier::new(2));

    let searcher = {
        let repo = Arc::clone(&repo);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for _ in 0..50 {
                let rs = repo.search(&SearchRequest::new().select(["second"]), None).unwrap();
                assert_eq!(rs.status(), 200);
                let body = rs.entity.unwrap();
                // every row is complete even while rows come and go
                assert!(body.data.iter().all(|row| row.len() == 2 && row[1].is_some()));
                assert!(body.etag.is_some());
            }
        })
    };

    barrier.wait();
    for i in 100..200 {
        let id = format!("s{:03}", i);
        repo.create(&Account::new(&id, &id, i), None).unwrap();
        repo.delete(&format!("s{:03}", i - 100), None).unwrap();
    }
    searcher.join().unwrap();
    assert_eq!(repo.count(), 100);
}
