// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A read-through cache that keeps repository records in key/value store hashes.
//!
//! Each table is backed by one hash in a store such as Redis. Lookups read the hash
//! first and go to the table's [`Repository`] only for ids that are missing, expired
//! or written under an older version; the fresh records are written back in the
//! same call. Repositories that can dump their whole table can also be cached as a
//! complete snapshot and served by [`TableScope::all`] without touching the
//! repository again until the snapshot expires.
//!
//! # Overview
//!
//! - [`HashCache`] owns the store handle, the clock and the key prefix, and shares a
//!   [`Registry`] mapping table names to repositories.
//! - [`HashCache::for_table`] validates the table and returns a [`TableScope`], an
//!   immutable handle that carries the table, the optional group and the resolved
//!   store keys. Every operation runs on a scope.
//! - [`Repository`] is the contract for the authoritative data source. It reports a
//!   version string that invalidates every cached record when it changes, and a TTL.
//!
//! # Store Layout
//!
//! For prefix `p`, table `t` and group `g` the cache uses:
//!
//! | Key | Type | Contents |
//! |-----|------|----------|
//! | `p:t:g` (`p:t` without a group) | hash | one [`Envelope`] per id: `{"value", "expire", "version"}` |
//! | `p:t:g:forever` | string | creation time of the active snapshot, in unix seconds |
//! | `p:t:g:deleted` | set | ids deleted while the snapshot was active |
//!
//! Multi-step changes (a save together with tombstone removal, a delete together with
//! tombstone insertion, and `clear`) are sent as one atomic unit, so other clients
//! never observe them half applied.
//!
//! # Examples
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use hashcache::{Binding, HashCache, HashStore, Records, Repository, Result};
//! use serde_json::json;
//! use tick::Clock;
//!
//! #[derive(Default)]
//! struct Users;
//!
//! impl Repository for Users {
//!     fn version(&self) -> String {
//!         "schema-3".to_string()
//!     }
//!
//!     fn ttl(&self) -> Duration {
//!         Duration::from_secs(300)
//!     }
//!
//!     async fn fetch(&self, ids: &[String], _group: &str) -> Result<Records> {
//!         Ok(ids.iter().map(|id| (id.clone(), json!({"id": id}))).collect())
//!     }
//! }
//!
//! async fn lookup(store: impl HashStore, clock: Clock) -> Result<()> {
//!     let cache = HashCache::builder(store, clock)
//!         .prefix("app")
//!         .repository("users", Binding::from_default::<Users>())
//!         .build();
//!
//!     let users = cache.for_table("eu", "users")?;
//!     let found = users.get(["1", "2"]).await?;
//!     assert_eq!(found.len(), 2);
//!
//!     users.delete(["2"]).await?;
//!     users.clear().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Logging
//!
//! Cache activity is reported through [`tracing`] as `hash_cache.event` events with
//! the fields `cache.table`, `cache.group`, `cache.operation`, `cache.activity` and
//! `cache.count`. Hits and misses are logged at debug level, writes at info level,
//! and failures at error level before the error is returned.
//!
//! # Testing
//!
//! The `test-util` feature re-exports [`MockStore`], an in-memory store that records
//! every call and can inject failures.

mod builder;
mod cache;
mod envelope;
mod forever;
mod key;
mod registry;
mod repository;
mod scope;
mod telemetry;

pub use builder::{DEFAULT_PREFIX, HashCacheBuilder};
pub use cache::HashCache;
pub use envelope::Envelope;
#[doc(inline)]
pub use hashcache_store::{Error, ErrorKind, HashStore, Result, StoreOp};
#[cfg(any(feature = "test-util", test))]
#[doc(inline)]
pub use hashcache_store::testing::{MockStore, StoreCall};
pub use key::{KeyResolver, TableKeys};
pub use registry::{Binding, Registry};
pub use repository::{DynRepository, Records, Repository};
pub use scope::TableScope;
