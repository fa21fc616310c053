//! Repository contract tests
//!
//! Status codes, envelopes and ETag behavior for every contract operation.

use crate::common::*;

fn key(s: &str) -> String {
    s.to_string()
}

// ============================================================================
// Concrete scenario
// ============================================================================

#[test]
fn test_create_update_delete_scenario() {
    let repo = plain_repo();
    let start = repo.etag();
    assert_eq!(ordinal(&start), 0);

    let rs = repo.create(&Account::new("a", "u1", 5), None).unwrap();
    assert_eq!(rs.status(), 201);
    let etag = repo.etag();
    assert_eq!(etag, format!("{}:1", repo.collection_id()));

    let rs = repo.update(&Account::new("a", "u1", 9), None).unwrap();
    assert_eq!(rs.status(), 200);
    assert_eq!(rs.entity.unwrap().second, 9);
    assert_eq!(repo.etag(), format!("{}:2", repo.collection_id()));

    assert_eq!(repo.delete(&key("a"), None).unwrap().status(), 200);
    assert_eq!(repo.read(&key("a"), None).unwrap().status(), 404);
    assert_eq!(ordinal(&repo.etag()), 3);
    assert_eq!(instance(&repo.etag()), instance(&start));
}

// ============================================================================
// Create / Read
// ============================================================================

#[test]
fn test_round_trip_returns_equal_entity() {
    let repo = plain_repo();
    let original = Account::new("a", "u1", 42);
    let created = repo.create(&original, None).unwrap();
    assert_eq!(created.entity.as_ref(), Some(&original));
    assert_eq!(created.key_reference, Some(Reference::new("userid", "u1")));

    let read = repo.read(&key("a"), None).unwrap();
    assert_eq!(read.response_code, ResponseCode::Ok);
    assert_eq!(read.entity, Some(original));
    assert_eq!(read.key, Some(key("a")));
}

#[test]
fn test_stored_entity_is_independent_of_caller() {
    let repo = plain_repo();
    let mut entity = Account::new("a", "u1", 1);
    repo.create(&entity, None).unwrap();
    entity.second = 1000;

    let read = repo.read(&key("a"), None).unwrap().entity.unwrap();
    assert_eq!(read.second, 1);
}

#[test]
fn test_duplicate_key_leaves_count_unchanged() {
    let repo = plain_repo();
    repo.create(&Account::new("a", "u1", 1), None).unwrap();
    let before = repo.etag();

    let rs = repo.create(&Account::new("a", "u2", 2), None).unwrap();
    assert_eq!(rs.response_code, ResponseCode::Conflict);
    assert_eq!(repo.count(), 1);
    assert_eq!(repo.etag(), before);
    assert!(!repo.contains_reference(&Reference::new("userid", "u2")));
}

#[test]
fn test_duplicate_reference_conflicts() {
    let repo = plain_repo();
    repo.create(&Account::new("a", "u1", 1), None).unwrap();
    let rs = repo.create(&Account::new("b", "u1", 1), None).unwrap();
    assert_eq!(rs.status(), 409);
    assert!(!repo.contains_key(&key("b")));
}

#[test]
fn test_read_by_ref() {
    let repo = plain_repo();
    repo.create(&Account::new("a", "u1", 1), None).unwrap();

    let rs = repo.read_by_ref("userid", "u1", None).unwrap();
    assert_eq!(rs.status(), 200);
    assert_eq!(rs.key, Some(key("a")));

    // reference keys are case-sensitive
    assert_eq!(repo.read_by_ref("UserId", "u1", None).unwrap().status(), 404);
}

#[test]
fn test_reads_do_not_move_etag() {
    let repo = plain_repo();
    repo.create(&Account::new("a", "u1", 1), None).unwrap();
    let etag = repo.etag();
    for _ in 0..10 {
        repo.read(&key("a"), None).unwrap();
        repo.version(&key("a"), None).unwrap();
        repo.search(&SearchRequest::new(), None).unwrap();
        repo.read(&key("missing"), None).unwrap();
    }
    assert_eq!(repo.etag(), etag);
    assert_eq!(repo.read_hits(&key("a")), Some(20));
}

// ============================================================================
// Update
// ============================================================================

#[test]
fn test_update_missing_is_not_found() {
    let repo = plain_repo();
    let rs = repo.update(&Account::new("ghost", "u1", 1), None).unwrap();
    assert_eq!(rs.status(), 404);
    assert_eq!(ordinal(&repo.etag()), 0);
}

#[test]
fn test_update_resets_read_hits() {
    let repo = plain_repo();
    repo.create(&Account::new("a", "u1", 1), None).unwrap();
    repo.read(&key("a"), None).unwrap();
    assert_eq!(repo.read_hits(&key("a")), Some(1));

    repo.update(&Account::new("a", "u1", 2), None).unwrap();
    assert_eq!(repo.read_hits(&key("a")), Some(0));
}

#[test]
fn test_optimistic_lock() {
    let repo = versioned_repo();
    let v0 = repo
        .create(&Account::new("a", "u1", 1), None)
        .unwrap()
        .entity
        .unwrap();

    let mut next = v0.clone();
    next.second = 2;
    let v1 = repo.update(&next, None).unwrap();
    assert_eq!(v1.status(), 200);
    let v1 = v1.entity.unwrap();
    assert_ne!(v1.version_id, v0.version_id);

    // stale token
    let mut stale = v0.clone();
    stale.second = 3;
    assert_eq!(repo.update(&stale, None).unwrap().status(), 409);

    // current token
    let mut current = v1.clone();
    current.second = 4;
    let v2 = repo.update(&current, None).unwrap().entity.unwrap();
    assert_ne!(v2.version_id, v1.version_id);
    assert_eq!(repo.read(&key("a"), None).unwrap().entity, Some(v2));
}

#[test]
fn test_without_optimistic_locking_records_token() {
    let repo = account_builder()
        .version_policy(account_versions().without_optimistic_locking())
        .build()
        .unwrap();

    let mut entity = Account::new("a", "u1", 1);
    entity.version_id = Some("v1".to_string());
    repo.create(&entity, None).unwrap();

    entity.version_id = Some("anything".to_string());
    let rs = repo.update(&entity, None).unwrap();
    assert_eq!(rs.status(), 200);
    let version = repo.version(&key("a"), None).unwrap();
    assert_eq!(version.entity, Some((key("a"), "anything".to_string())));
}

// ============================================================================
// Delete / Version
// ============================================================================

#[test]
fn test_delete_by_ref_removes_all_references() {
    let repo = plain_repo();
    repo.create(&Account::new("a", "u1", 1), None).unwrap();

    let rs = repo.delete_by_ref("userid", "u1", None).unwrap();
    assert_eq!(rs.status(), 200);
    assert_eq!(rs.entity, Some((key("a"), String::new())));
    assert_eq!(rs.key_reference, Some(Reference::new("userid", "u1")));
    assert_eq!(repo.count(), 0);
    assert_eq!(repo.count_reference(), 0);

    // the reference is free again
    assert_eq!(repo.create(&Account::new("b", "u1", 1), None).unwrap().status(), 201);
}

#[test]
fn test_delete_missing() {
    let repo = plain_repo();
    let rs = repo.delete(&key("a"), None).unwrap();
    assert_eq!(rs.status(), 404);
    assert_eq!(rs.key, Some(key("a")));
    assert!(rs.key_reference.is_none());

    let rs = repo.delete_by_ref("userid", "u1", None).unwrap();
    assert_eq!(rs.status(), 404);
    assert!(rs.key.is_none());
}

#[test]
fn test_version_by_ref() {
    let repo = versioned_repo();
    let created = repo
        .create(&Account::new("a", "u1", 1), None)
        .unwrap()
        .entity
        .unwrap();
    let updated = repo.update(&created, None).unwrap().entity.unwrap();

    let rs = repo.version_by_ref("userid", "u1", None).unwrap();
    assert_eq!(rs.status(), 200);
    assert_eq!(rs.entity, Some((key("a"), updated.version_id.unwrap())));
    assert_eq!(rs.key_reference, Some(Reference::new("userid", "u1")));
}

// ============================================================================
// Signatures
// ============================================================================

#[test]
fn test_signed_entities_read_back() {
    let repo = versioned_repo();
    repo.create(&Account::new("a", "u1", 1), None).unwrap();
    assert_eq!(repo.read(&key("a"), None).unwrap().status(), 200);
    assert_eq!(repo.read_by_ref("userid", "u1", None).unwrap().status(), 200);
}

#[test]
fn test_signature_policy_change_detected() {
    // A container signed by one policy fails verification under another,
    // which is exactly what a forged signature looks like to the reader.
    struct Rotating;
    impl SignaturePolicy<Account> for Rotating {
        fn calculate(&self, entity: &Account, _version: Option<&str>) -> String {
            format!("{}:{}", entity.id, entity.second)
        }
        fn verify(&self, _entity: &Account, _version: Option<&str>, _signature: &str) -> bool {
            false
        }
    }

    let repo = account_builder().signature_policy(Rotating).build().unwrap();
    repo.create(&Account::new("a", "u1", 1), None).unwrap();

    let rs = repo.read(&key("a"), None).unwrap();
    assert_eq!(rs.response_code, ResponseCode::Forbidden);
    assert_eq!(rs.key, Some(key("a")));
    assert!(rs.entity.is_none());
    assert!(rs.key_reference.is_none());
}

// ============================================================================
// Serialization variants
// ============================================================================

#[test]
fn test_message_pack_identity_round_trip() {
    let repo = account_builder()
        .serializer(MessagePackSerializer)
        .codec(IdentityCodec)
        .eager_deserialize(true)
        .build()
        .unwrap();
    let entity = Account::new("a", "u1", -7);
    repo.create(&entity, None).unwrap();
    assert_eq!(repo.read(&key("a"), None).unwrap().entity, Some(entity));
}

#[test]
fn test_settings_pass_through() {
    let repo = plain_repo();
    let settings = RepositorySettings::default()
        .with_correlation_id("corr-1")
        .with_header("x-trace", "abc");
    let rs = repo
        .read(&key("missing"), Some(&settings))
        .unwrap();
    assert_eq!(rs.settings, Some(settings));
}
