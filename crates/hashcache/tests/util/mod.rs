// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared fixtures for cache integration tests.

#![allow(dead_code, reason = "each test binary uses a subset of the fixtures")]

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::{Duration, UNIX_EPOCH},
};

use hashcache::{Binding, Envelope, Error, HashCache, Records, Repository, Result};
use hashcache_store::testing::MockStore;
use parking_lot::Mutex;
use serde_json::Value;
use tick::ClockControl;

/// Seconds since the unix epoch at which every test clock starts.
pub const START: u64 = 1_000;

/// Composite version of records written by [`cache`] for a repository at version `a`.
pub const CURRENT: &str = "1.0@a";

pub fn block_on<F: std::future::Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

#[derive(Debug)]
struct Inner {
    records: Mutex<Records>,
    version: Mutex<String>,
    ttl: Duration,
    full_dump: bool,
    fetches: Mutex<Vec<Vec<String>>>,
    dumps: AtomicUsize,
    failing: AtomicBool,
}

/// An in-memory repository that records how it was called.
#[derive(Debug, Clone)]
pub struct FakeRepository {
    inner: Arc<Inner>,
}

impl FakeRepository {
    /// A repository that only supports lookups by id.
    pub fn new(ttl: Duration) -> Self {
        Self::build(ttl, false)
    }

    /// A repository that can also dump its whole table.
    pub fn with_full_dump(ttl: Duration) -> Self {
        Self::build(ttl, true)
    }

    fn build(ttl: Duration, full_dump: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                records: Mutex::new(Records::new()),
                version: Mutex::new("a".to_string()),
                ttl,
                full_dump,
                fetches: Mutex::new(Vec::new()),
                dumps: AtomicUsize::new(0),
                failing: AtomicBool::new(false),
            }),
        }
    }

    pub fn insert(&self, id: &str, value: Value) {
        self.inner.records.lock().insert(id.to_string(), value);
    }

    pub fn remove(&self, id: &str) {
        self.inner.records.lock().remove(id);
    }

    pub fn set_version(&self, version: &str) {
        *self.inner.version.lock() = version.to_string();
    }

    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    /// The ids of every `fetch` call, in call order.
    pub fn fetches(&self) -> Vec<Vec<String>> {
        self.inner.fetches.lock().clone()
    }

    /// The number of `all` calls.
    pub fn dumps(&self) -> usize {
        self.inner.dumps.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.inner.failing.load(Ordering::SeqCst) {
            Err(Error::repository("source offline"))
        } else {
            Ok(())
        }
    }
}

impl Repository for FakeRepository {
    fn version(&self) -> String {
        self.inner.version.lock().clone()
    }

    fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    async fn fetch(&self, ids: &[String], _group: &str) -> Result<Records> {
        self.inner.fetches.lock().push(ids.to_vec());
        self.check()?;
        let records = self.inner.records.lock();
        Ok(ids
            .iter()
            .filter_map(|id| records.get(id).map(|value| (id.clone(), value.clone())))
            .collect())
    }

    fn supports_full_dump(&self) -> bool {
        self.inner.full_dump
    }

    async fn all(&self, _group: &str) -> Result<Records> {
        self.inner.dumps.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.inner.records.lock().clone())
    }
}

/// A cache at version `1.0` with `repository` bound to the `users` table.
pub fn cache(repository: &FakeRepository) -> (HashCache<MockStore>, ClockControl) {
    let control = ClockControl::new_at(UNIX_EPOCH + Duration::from_secs(START));
    let clock = control.to_clock();
    let cache = HashCache::builder(MockStore::new(clock.clone()), clock)
        .version("1.0")
        .repository("users", Binding::shared(repository.clone()))
        .build();
    (cache, control)
}

/// Encodes an envelope for seeding the store directly.
pub fn stored(value: Value, expire: Option<u64>, version: &str) -> String {
    Envelope::new(value, expire, version)
        .encode()
        .expect("test envelope should encode")
}
