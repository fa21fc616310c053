//! Property-based tests
//!
//! Round trip, key uniqueness and ETag monotonicity over generated
//! operation sequences.

use crate::common::*;
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
enum Op {
    Create(u8, u8, i64),
    Update(u8, u8, i64),
    Delete(u8),
    DeleteByRef(u8),
    Read(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..8, 0u8..8, any::<i64>()).prop_map(|(k, r, v)| Op::Create(k, r, v)),
        (0u8..8, 0u8..8, any::<i64>()).prop_map(|(k, r, v)| Op::Update(k, r, v)),
        (0u8..8).prop_map(Op::Delete),
        (0u8..8).prop_map(Op::DeleteByRef),
        (0u8..8).prop_map(Op::Read),
    ]
}

fn account(k: u8, r: u8, v: i64) -> Account {
    Account::new(&format!("k{}", k), &format!("r{}", r), v)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn round_trip(id in "[a-z0-9]{1,16}", user in "[A-Z]{1,8}", second in any::<i64>()) {
        let repo = plain_repo();
        let entity = Account::new(&id, &user, second);
        prop_assert_eq!(repo.create(&entity, None).unwrap().status(), 201);
        prop_assert_eq!(repo.read(&id, None).unwrap().entity, Some(entity));
    }

    #[test]
    fn matches_model(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let repo = plain_repo();
        // key -> (reference, second)
        let mut model: BTreeMap<String, (String, i64)> = BTreeMap::new();
        let mut expected_ordinal = 0u64;

        for op in ops {
            let before = ordinal(&repo.etag());
            match op {
                Op::Create(k, r, v) => {
                    let e = account(k, r, v);
                    let taken = model.contains_key(&e.id)
                        || model.values().any(|(rf, _)| *rf == e.user_id);
                    let status = repo.create(&e, None).unwrap().status();
                    if taken {
                        prop_assert_eq!(status, 409);
                    } else {
                        prop_assert_eq!(status, 201);
                        model.insert(e.id.clone(), (e.user_id.clone(), v));
                        expected_ordinal += 1;
                    }
                }
                Op::Update(k, r, v) => {
                    let e = account(k, r, v);
                    let status = repo.update(&e, None).unwrap().status();
                    if !model.contains_key(&e.id) {
                        prop_assert_eq!(status, 404);
                    } else if model.iter().any(|(key, (rf, _))| *key != e.id && *rf == e.user_id) {
                        prop_assert_eq!(status, 409);
                    } else {
                        prop_assert_eq!(status, 200);
                        model.insert(e.id.clone(), (e.user_id.clone(), v));
                        expected_ordinal += 1;
                    }
                }
                Op::Delete(k) => {
                    let id = format!("k{}", k);
                    let status = repo.delete(&id, None).unwrap().status();
                    if model.remove(&id).is_some() {
                        prop_assert_eq!(status, 200);
                        expected_ordinal += 1;
                    } else {
                        prop_assert_eq!(status, 404);
                    }
                }
                Op::DeleteByRef(r) => {
                    let rf = format!("r{}", r);
                    let status = repo.delete_by_ref("userid", &rf, None).unwrap().status();
                    let owner = model
                        .iter()
                        .find(|(_, (owned, _))| *owned == rf)
                        .map(|(key, _)| key.clone());
                    match owner {
                        Some(key) => {
                            prop_assert_eq!(status, 200);
                            model.remove(&key);
                            expected_ordinal += 1;
                        }
                        None => prop_assert_eq!(status, 404),
                    }
                }
                Op::Read(k) => {
                    let id = format!("k{}", k);
                    let rs = repo.read(&id, None).unwrap();
                    match model.get(&id) {
                        Some((_, v)) => {
                            prop_assert_eq!(rs.status(), 200);
                            prop_assert_eq!(rs.entity.unwrap().second, *v);
                        }
                        None => prop_assert_eq!(rs.status(), 404),
                    }
                    prop_assert_eq!(ordinal(&repo.etag()), before);
                }
            }

            let after = ordinal(&repo.etag());
            prop_assert!(after == before || after == before + 1);
            prop_assert_eq!(after, expected_ordinal);
            prop_assert_eq!(repo.count(), model.len());
            prop_assert_eq!(repo.count_reference(), model.len());
        }
    }
}
