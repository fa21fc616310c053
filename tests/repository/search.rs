//! Search tests through the repository

use crate::common::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn seeded() -> AccountRepo {
    let repo = plain_repo();
    for (id, user, second) in [("a", "ann", 30), ("b", "bob", 10), ("c", "cat", 20), ("d", "dan", 40)] {
        repo.create(&Account::new(id, user, second), None).unwrap();
    }
    repo
}

#[test]
fn test_first_column_is_id_then_selected_fields() {
    let repo = seeded();
    let rq = SearchRequest::new()
        .select(["second", "userid"])
        .order_by("second", SortDirection::Descending)
        .top(2);
    let rs = repo.search(&rq, None).unwrap();
    assert_eq!(rs.status(), 200);
    assert_eq!(rs.key, Some(rq.clone()));

    let body = rs.entity.unwrap();
    assert_eq!(body.fields[0].name, ID_FIELD);
    assert_eq!(body.fields[1].name, "second");
    assert_eq!(body.fields[2].name, "userid");
    assert_eq!(
        body.data,
        vec![
            vec![Some("d".into()), Some("40".into()), Some("dan".into())],
            vec![Some("a".into()), Some("30".into()), Some("ann".into())],
        ]
    );
    assert_eq!(body.top, Some(2));
    assert_eq!(body.skip, 0);
    assert_eq!(body.etag, Some(repo.etag()));
}

#[test]
fn test_default_algorithm_used_when_id_omitted() {
    let repo = seeded();
    assert_eq!(repo.default_search_id(), Some(SCAN_SEARCH_ID));
    let rs = repo
        .search(&SearchRequest::new().filter("userid", FilterOp::StartsWith, "b"), None)
        .unwrap();
    assert_eq!(rs.entity.unwrap().len(), 1);
}

#[test]
fn test_unknown_algorithm_is_404_and_harmless() {
    let repo = seeded();
    let etag = repo.etag();
    let rs = repo.search(&SearchRequest::with_id("nonexistent"), None).unwrap();
    assert_eq!(rs.status(), 404);
    assert_eq!(
        rs.response_message.as_deref(),
        Some("Search algorithm 'nonexistent' cannot be found.")
    );
    assert_eq!(repo.etag(), etag);
    assert_eq!(repo.count(), 4);
}

#[test]
fn test_no_default_and_no_id_is_404() {
    let repo = account_builder_without_search();
    let rs = repo.search(&SearchRequest::new(), None).unwrap();
    assert_eq!(rs.status(), 404);
}

fn account_builder_without_search() -> AccountRepo {
    MemoryRepository::builder(|a: &Account| a.id.clone())
        .build()
        .unwrap()
}

#[test]
fn test_search_entity_returns_typed_rows() {
    let repo = seeded();
    let rq = SearchRequest::new()
        .filter("second", FilterOp::Ne, "10")
        .order_by("second", SortDirection::Ascending)
        .skip(1);
    let rs = repo.search_entity(&rq, None);
    assert_eq!(rs.status(), 200);
    let body = rs.entity.unwrap();
    let ids: Vec<_> = body.data.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "d"]);
    assert_eq!(body.skip, 1);
}

#[test]
fn test_custom_algorithm_over_snapshot() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let repo = account_builder()
        .search(FnSearchAlgorithm::new(
            "writer-safe",
            move |snapshot: &IndexSnapshot<String, Account>, _rq: &SearchRequest| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(snapshot
                    .iter()
                    .filter(|c| c.property("second").map_or(false, |s| s.starts_with('2')))
                    .map(|c| SearchHit::new(Arc::clone(c)))
                    .collect())
            },
        ))
        .build()
        .unwrap();
    for (id, second) in [("x", 2), ("y", 25), ("z", 3)] {
        repo.create(&Account::new(id, id, second), None).unwrap();
    }

    let rs = repo
        .search(&SearchRequest::with_id("Writer-Safe"), None)
        .unwrap();
    assert_eq!(rs.status(), 200);
    let ids: Vec<_> = rs
        .entity
        .unwrap()
        .data
        .into_iter()
        .map(|row| row[0].clone().unwrap())
        .collect();
    assert_eq!(ids, vec!["x".to_string(), "y".to_string()]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(repo.search_ids(), vec!["scan".to_string(), "writer-safe".to_string()]);
}

#[test]
fn test_invalid_request_is_500() {
    let repo = seeded();
    let rs = repo
        .search(&SearchRequest::new().filter("", FilterOp::Eq, "x"), None)
        .unwrap();
    assert_eq!(rs.status(), 500);
    assert_eq!(
        rs.response_message.as_deref(),
        Some("Search algorithm 'scan' unexpected exception.")
    );
    assert!(rs.error.is_some());
}
