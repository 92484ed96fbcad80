// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock store implementation for testing.
//!
//! This module provides `MockStore`, an in-memory [`HashStore`] that records
//! every call and supports failure injection for testing error paths.

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
    time::{Duration, SystemTime},
};

use parking_lot::Mutex;
use tick::Clock;

use crate::{Error, HashStore, StoreOp};

/// Recorded store call with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// A batched hash read of the given fields.
    HashGetMulti {
        /// The hash key.
        key: String,
        /// The requested fields, in request order.
        fields: Vec<String>,
    },
    /// A full hash read.
    HashGetAll(String),
    /// An existence check.
    Exists(String),
    /// A set read.
    SetMembers(String),
    /// A single write.
    Execute(StoreOp),
    /// An atomic unit of writes.
    Atomic(Vec<StoreOp>),
}

type FailPredicate = Box<dyn Fn(&StoreCall) -> bool + Send + Sync>;

#[derive(Debug, Default)]
struct Data {
    hashes: HashMap<String, HashMap<String, String>>,
    strings: HashMap<String, (String, Option<SystemTime>)>,
    sets: HashMap<String, BTreeSet<String>>,
}

impl Data {
    fn apply(&mut self, op: StoreOp, now: SystemTime) {
        match op {
            StoreOp::HashSet { key, entries } => {
                self.hashes.entry(key).or_default().extend(entries);
            }
            StoreOp::HashDelete { key, fields } => {
                if let Some(hash) = self.hashes.get_mut(&key) {
                    for field in &fields {
                        hash.remove(field);
                    }
                    if hash.is_empty() {
                        self.hashes.remove(&key);
                    }
                }
            }
            StoreOp::SetString { key, value, ttl } => {
                let expires_at = ttl.map(|ttl| now + ttl);
                self.strings.insert(key, (value, expires_at));
            }
            StoreOp::Delete { key } => {
                self.hashes.remove(&key);
                self.strings.remove(&key);
                self.sets.remove(&key);
            }
            StoreOp::SetAdd { key, members } => {
                self.sets.entry(key).or_default().extend(members);
            }
            StoreOp::SetRemove { key, members } => {
                if let Some(set) = self.sets.get_mut(&key) {
                    for member in &members {
                        set.remove(member);
                    }
                    if set.is_empty() {
                        self.sets.remove(&key);
                    }
                }
            }
        }
    }

    fn live_string(&self, key: &str, now: SystemTime) -> Option<&(String, Option<SystemTime>)> {
        self.strings
            .get(key)
            .filter(|(_, expires_at)| expires_at.is_none_or(|expires_at| expires_at > now))
    }
}

/// A configurable mock store for testing.
///
/// Data lives in memory and string expiry follows the supplied [`Clock`], so
/// tests can advance time with `tick::ClockControl`. Atomic units are applied
/// under a single lock and either fully apply or fully fail.
///
/// # Examples
///
/// ```
/// use hashcache_store::{HashStore, testing::{MockStore, StoreCall}};
/// use tick::Clock;
///
/// # futures::executor::block_on(async {
/// let store = MockStore::new(Clock::new_frozen());
///
/// store.set_add("deleted", vec!["3".to_string()]).await?;
/// assert_eq!(store.set_members("deleted").await?, vec!["3".to_string()]);
/// assert_eq!(store.calls().len(), 2);
/// # Ok::<(), hashcache_store::Error>(())
/// # });
/// ```
///
/// # Failure Injection
///
/// ```
/// use hashcache_store::{HashStore, testing::{MockStore, StoreCall}};
/// use tick::Clock;
///
/// # futures::executor::block_on(async {
/// let store = MockStore::new(Clock::new_frozen());
///
/// store.fail_when(|call| matches!(call, StoreCall::Atomic(_)));
/// store.atomic(Vec::new()).await.unwrap_err();
/// store.exists("key").await.expect("other calls succeed");
/// # });
/// ```
pub struct MockStore {
    data: Arc<Mutex<Data>>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    fail_when: Arc<Mutex<Option<FailPredicate>>>,
    clock: Clock,
}

impl std::fmt::Debug for MockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStore")
            .field("data", &self.data)
            .field("calls", &self.calls)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish_non_exhaustive()
    }
}

impl Clone for MockStore {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            calls: Arc::clone(&self.calls),
            fail_when: Arc::clone(&self.fail_when),
            clock: self.clock.clone(),
        }
    }
}

impl MockStore {
    /// Creates a new empty mock store whose key expiry follows `clock`.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            data: Arc::new(Mutex::new(Data::default())),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
            clock,
        }
    }

    /// Sets a predicate that determines when calls should fail.
    ///
    /// A failing call is still recorded but leaves the data untouched.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&StoreCall) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all calls to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    /// Clears all recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Returns a snapshot of a hash; a missing hash is empty.
    #[must_use]
    pub fn hash(&self, key: &str) -> HashMap<String, String> {
        self.data.lock().hashes.get(key).cloned().unwrap_or_default()
    }

    /// Returns the live value of a string key.
    #[must_use]
    pub fn string(&self, key: &str) -> Option<String> {
        let now = self.clock.system_time();
        self.data.lock().live_string(key, now).map(|(value, _)| value.clone())
    }

    /// Returns the remaining time to live of a live string key.
    ///
    /// The outer `Option` is `None` when the key is absent; the inner one is
    /// `None` when the key never expires.
    #[must_use]
    pub fn string_ttl(&self, key: &str) -> Option<Option<Duration>> {
        let now = self.clock.system_time();
        self.data
            .lock()
            .live_string(key, now)
            .map(|(_, expires_at)| expires_at.map(|at| at.duration_since(now).unwrap_or_default()))
    }

    /// Returns a snapshot of a set; a missing set is empty.
    #[must_use]
    pub fn set(&self, key: &str) -> BTreeSet<String> {
        self.data.lock().sets.get(key).cloned().unwrap_or_default()
    }

    /// Writes a raw hash field without recording a call.
    ///
    /// Useful for seeding stale or malformed entries.
    pub fn seed_hash_field(&self, key: &str, field: &str, value: &str) {
        self.data
            .lock()
            .hashes
            .entry(key.to_owned())
            .or_default()
            .insert(field.to_owned(), value.to_owned());
    }

    fn record(&self, call: StoreCall) -> Result<(), Error> {
        let fail = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(&call));
        self.calls.lock().push(call);
        if fail {
            Err(Error::backing_store("mock: store call failed"))
        } else {
            Ok(())
        }
    }
}

impl HashStore for MockStore {
    async fn hash_get_multi(&self, key: &str, fields: &[String]) -> Result<Vec<Option<String>>, Error> {
        self.record(StoreCall::HashGetMulti {
            key: key.to_owned(),
            fields: fields.to_vec(),
        })?;
        let data = self.data.lock();
        let hash = data.hashes.get(key);
        Ok(fields
            .iter()
            .map(|field| hash.and_then(|hash| hash.get(field)).cloned())
            .collect())
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, Error> {
        self.record(StoreCall::HashGetAll(key.to_owned()))?;
        Ok(self.hash(key))
    }

    async fn exists(&self, key: &str) -> Result<bool, Error> {
        self.record(StoreCall::Exists(key.to_owned()))?;
        let now = self.clock.system_time();
        let data = self.data.lock();
        Ok(data.hashes.contains_key(key) || data.sets.contains_key(key) || data.live_string(key, now).is_some())
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, Error> {
        self.record(StoreCall::SetMembers(key.to_owned()))?;
        Ok(self.set(key).into_iter().collect())
    }

    async fn execute(&self, op: StoreOp) -> Result<(), Error> {
        self.record(StoreCall::Execute(op.clone()))?;
        let now = self.clock.system_time();
        self.data.lock().apply(op, now);
        Ok(())
    }

    async fn atomic(&self, ops: Vec<StoreOp>) -> Result<(), Error> {
        self.record(StoreCall::Atomic(ops.clone()))?;
        let now = self.clock.system_time();
        let mut data = self.data.lock();
        for op in ops {
            data.apply(op, now);
        }
        Ok(())
    }
}
