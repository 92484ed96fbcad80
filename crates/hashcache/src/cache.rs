// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The cache processor.

use std::{fmt, sync::Arc, time::UNIX_EPOCH};

use hashcache_store::{Error, HashStore, Result};
use serde_json::json;
use tick::Clock;

use crate::{Binding, DynRepository, KeyResolver, Registry, Repository, TableScope, builder::HashCacheBuilder};

/// A read-through cache of repository records held in store hashes.
///
/// `HashCache` owns the store handle, the clock and the key prefix, and shares a
/// [`Registry`] of repositories. All operations go through a [`TableScope`]
/// obtained from [`for_table`](Self::for_table) or [`table`](Self::table); the
/// cache itself holds no per-query state and can be shared freely.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "test-util")]
/// # fn main() {
/// # use std::time::Duration;
/// # use hashcache::{Records, Repository, Result};
/// # use serde_json::json;
/// # #[derive(Default)]
/// # struct Users;
/// # impl Repository for Users {
/// #     fn version(&self) -> String { "a".into() }
/// #     fn ttl(&self) -> Duration { Duration::from_secs(60) }
/// #     async fn fetch(&self, ids: &[String], _group: &str) -> Result<Records> {
/// #         Ok(ids.iter().map(|id| (id.clone(), json!({"id": id}))).collect())
/// #     }
/// # }
/// use hashcache::{Binding, HashCache, MockStore};
/// use tick::Clock;
/// # futures::executor::block_on(async {
///
/// let clock = Clock::new_frozen();
/// let cache = HashCache::builder(MockStore::new(clock.clone()), clock)
///     .prefix("app")
///     .repository("users", Binding::from_default::<Users>())
///     .build();
///
/// let user = cache.table("users")?.find("7").await?;
/// assert_eq!(user, Some(json!({"id": "7"})));
/// # Ok::<(), hashcache::Error>(())
/// # }).unwrap();
/// # }
/// # #[cfg(not(feature = "test-util"))]
/// # fn main() {}
/// ```
pub struct HashCache<S> {
    pub(crate) store: S,
    pub(crate) clock: Clock,
    pub(crate) resolver: KeyResolver,
    pub(crate) version: String,
    pub(crate) registry: Arc<Registry>,
}

impl HashCache<()> {
    /// Creates a builder for a cache over `store`.
    ///
    /// `clock` supplies the current time for record expiry and snapshot tags.
    pub fn builder<S>(store: S, clock: Clock) -> HashCacheBuilder<S>
    where
        S: HashStore,
    {
        HashCacheBuilder::new(store, clock)
    }
}

impl<S> HashCache<S> {
    /// Returns the component version that prefixes every composite version tag.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the registered table names in ascending order.
    #[must_use]
    pub fn repositories(&self) -> Vec<String> {
        self.registry.tables()
    }

    /// Binds `table` to a repository, replacing any previous binding.
    pub fn register(&self, table: impl Into<String>, binding: Binding) {
        self.registry.register(table, binding);
    }

    /// Binds several tables at once.
    pub fn fill<I, T>(&self, bindings: I)
    where
        I: IntoIterator<Item = (T, Binding)>,
        T: Into<String>,
    {
        self.registry.fill(bindings);
    }

    /// Returns `true` if `table` has a repository.
    #[must_use]
    pub fn is_registered(&self, table: &str) -> bool {
        self.registry.is_registered(table)
    }

    /// Returns the shared repository registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Returns the key resolver.
    #[must_use]
    pub fn resolver(&self) -> &KeyResolver {
        &self.resolver
    }

    /// Returns the backing store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a handle for `table` within `group`.
    ///
    /// An empty group addresses the unsharded table.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotRegistered`](hashcache_store::ErrorKind::NotRegistered)
    /// if `table` has no repository. The store is not contacted.
    pub fn for_table(&self, group: impl Into<String>, table: impl Into<String>) -> Result<TableScope<'_, S>> {
        let group = group.into();
        let table = table.into();
        if !self.registry.is_registered(&table) {
            return Err(Error::not_registered(table));
        }

        let keys = self.resolver.resolve(&group, &table);
        Ok(TableScope::new(self, group, table, keys))
    }

    /// Returns a handle for the unsharded `table`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotRegistered`](hashcache_store::ErrorKind::NotRegistered)
    /// if `table` has no repository.
    pub fn table(&self, table: impl Into<String>) -> Result<TableScope<'_, S>> {
        self.for_table("", table)
    }

    /// Current time in unix seconds.
    pub(crate) fn now(&self) -> u64 {
        self.clock
            .system_time()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs())
    }

    pub(crate) fn version_tag(&self, repository: &DynRepository<'_>) -> String {
        format!("{}@{}", self.version, repository.version())
    }
}

impl<S> fmt::Display for HashCache<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = json!({
            "version": self.version,
            "repositories": self.registry.tables(),
        });
        write!(f, "{summary}")
    }
}

impl<S> fmt::Debug for HashCache<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashCache")
            .field("prefix", &self.resolver.prefix())
            .field("version", &self.version)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
