// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(feature = "test-util")]

//! Integration tests for the `HashStore` contract as served by `MockStore`.

use std::time::Duration;

use hashcache_store::{
    Error, ErrorKind, HashStore, StoreOp,
    testing::{MockStore, StoreCall},
};
use tick::Clock;

type TestResult = Result<(), Error>;

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(ToString::to_string).collect()
}

#[test]
fn hash_get_multi_preserves_request_order() -> TestResult {
    block_on(async {
        let store = MockStore::new(Clock::new_frozen());
        store
            .hash_set_multi("h", vec![("1".to_string(), "a".to_string()), ("3".to_string(), "c".to_string())])
            .await?;

        let values = store.hash_get_multi("h", &ids(&["3", "2", "1"])).await?;
        assert_eq!(values, vec![Some("c".to_string()), None, Some("a".to_string())]);
        Ok(())
    })
}

#[test]
fn hash_get_all_on_missing_key_is_empty() -> TestResult {
    block_on(async {
        let store = MockStore::new(Clock::new_frozen());
        assert!(store.hash_get_all("missing").await?.is_empty());
        assert!(store.set_members("missing").await?.is_empty());
        assert!(!store.exists("missing").await?);
        Ok(())
    })
}

#[test]
fn default_write_methods_record_execute_calls() -> TestResult {
    block_on(async {
        let store = MockStore::new(Clock::new_frozen());
        store.set_string("tag", "100".to_string(), None).await?;
        store.delete("tag").await?;

        assert_eq!(
            store.calls(),
            vec![
                StoreCall::Execute(StoreOp::SetString {
                    key: "tag".to_string(),
                    value: "100".to_string(),
                    ttl: None,
                }),
                StoreCall::Execute(StoreOp::Delete { key: "tag".to_string() }),
            ]
        );
        Ok(())
    })
}

#[test]
fn delete_removes_keys_of_every_type() -> TestResult {
    block_on(async {
        let store = MockStore::new(Clock::new_frozen());
        store
            .atomic(vec![
                StoreOp::HashSet {
                    key: "k".to_string(),
                    entries: vec![("1".to_string(), "a".to_string())],
                },
                StoreOp::SetAdd {
                    key: "k:deleted".to_string(),
                    members: ids(&["2"]),
                },
                StoreOp::SetString {
                    key: "k:forever".to_string(),
                    value: "1".to_string(),
                    ttl: Some(Duration::from_secs(60)),
                },
            ])
            .await?;

        store
            .atomic(vec![
                StoreOp::Delete {
                    key: "k:forever".to_string(),
                },
                StoreOp::Delete {
                    key: "k:deleted".to_string(),
                },
                StoreOp::Delete { key: "k".to_string() },
            ])
            .await?;

        assert!(!store.exists("k").await?);
        assert!(!store.exists("k:deleted").await?);
        assert!(!store.exists("k:forever").await?);
        Ok(())
    })
}

#[test]
fn injected_failure_surfaces_backing_store_error() {
    let store = MockStore::new(Clock::new_frozen());
    store.fail_when(|call| matches!(call, StoreCall::HashGetAll(key) if key == "broken"));

    let err = block_on(store.hash_get_all("broken")).expect_err("call should fail");
    assert_eq!(err.kind(), &ErrorKind::BackingStore);
    block_on(store.hash_get_all("fine")).expect("unmatched calls succeed");

    store.clear_failures();
    block_on(store.hash_get_all("broken")).expect("failures were cleared");
}
