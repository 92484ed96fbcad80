// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for [`HashCache`].

use std::sync::Arc;

use hashcache_store::HashStore;
use tick::Clock;

use crate::{Binding, HashCache, KeyResolver, Registry};

/// The key prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "hashcache";

/// Builder for constructing a [`HashCache`].
///
/// Created by [`HashCache::builder`]. Bindings added with
/// [`repository`](Self::repository) are applied to the registry when the cache is
/// built, so they also land in a registry passed to [`registry`](Self::registry)
/// regardless of call order.
#[derive(Debug)]
pub struct HashCacheBuilder<S> {
    store: S,
    clock: Clock,
    prefix: String,
    version: String,
    registry: Option<Arc<Registry>>,
    bindings: Vec<(String, Binding)>,
}

impl<S> HashCacheBuilder<S>
where
    S: HashStore,
{
    pub(crate) fn new(store: S, clock: Clock) -> Self {
        Self {
            store,
            clock,
            prefix: DEFAULT_PREFIX.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            registry: None,
            bindings: Vec::new(),
        }
    }

    /// Sets the prefix of every store key. Defaults to [`DEFAULT_PREFIX`].
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the component version used in composite version tags.
    ///
    /// Changing it invalidates every record written under the previous version.
    /// Defaults to this crate's version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Binds `table` to a repository.
    #[must_use]
    pub fn repository(mut self, table: impl Into<String>, binding: Binding) -> Self {
        self.bindings.push((table.into(), binding));
        self
    }

    /// Binds several tables.
    #[must_use]
    pub fn repositories<I, T>(mut self, bindings: I) -> Self
    where
        I: IntoIterator<Item = (T, Binding)>,
        T: Into<String>,
    {
        self.bindings
            .extend(bindings.into_iter().map(|(table, binding)| (table.into(), binding)));
        self
    }

    /// Uses an existing registry instead of creating a new one.
    ///
    /// Caches built over the same registry see each other's registrations.
    #[must_use]
    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Builds the cache.
    #[must_use]
    pub fn build(self) -> HashCache<S> {
        let registry = self.registry.unwrap_or_default();
        registry.fill(self.bindings);

        HashCache {
            store: self.store,
            clock: self.clock,
            resolver: KeyResolver::new(self.prefix),
            version: self.version,
            registry,
        }
    }
}
