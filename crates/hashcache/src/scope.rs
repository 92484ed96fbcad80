// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Table-scoped cache operations.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    iter,
    sync::Arc,
};

use hashcache_store::{HashStore, Result, StoreOp};
use serde_json::Value;

use crate::{
    DynRepository, Envelope, HashCache, Records, Repository, TableKeys, envelope,
    telemetry::{self, CacheActivity, CacheOperation},
};

/// Cache operations bound to one table and group.
///
/// A scope is an immutable value created by [`HashCache::for_table`]. It borrows the
/// cache and owns its group, table and keys, so any number of scopes can be used
/// side by side without affecting each other.
pub struct TableScope<'a, S> {
    pub(crate) cache: &'a HashCache<S>,
    group: String,
    table: String,
    keys: TableKeys,
}

impl<'a, S> TableScope<'a, S> {
    pub(crate) fn new(cache: &'a HashCache<S>, group: String, table: String, keys: TableKeys) -> Self {
        Self { cache, group, table, keys }
    }

    /// The group this scope addresses; empty for the unsharded table.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// The table this scope addresses.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The store keys backing this scope.
    #[must_use]
    pub fn keys(&self) -> &TableKeys {
        &self.keys
    }

    pub(crate) fn repository(&self) -> Result<Arc<DynRepository<'static>>> {
        self.cache.registry.resolve(&self.table)
    }

    pub(crate) fn emit(&self, operation: CacheOperation, activity: CacheActivity, count: usize) {
        telemetry::emit(&self.table, &self.group, operation, activity, count);
    }

    /// Parses a stored field; undecodable fields are logged and treated as absent.
    pub(crate) fn decode(&self, id: &str, raw: &str) -> Option<Envelope> {
        Envelope::decode(raw)
            .inspect_err(|error| {
                tracing::debug!(
                    cache.table = self.table.as_str(),
                    cache.group = self.group.as_str(),
                    cache.field = id,
                    error = %error,
                    "hash_cache.undecodable"
                );
            })
            .ok()
    }

    /// Encodes `records` as envelopes carrying the current version tag and expiry.
    pub(crate) fn encode_records(&self, repository: &DynRepository<'_>, records: &Records) -> Result<Vec<(String, String)>> {
        let version = self.cache.version_tag(repository);
        let expire = envelope::expiry(repository.ttl(), self.cache.now());

        records
            .iter()
            .map(|(id, value)| envelope::encode(value, expire, &version).map(|raw| (id.clone(), raw)))
            .collect::<Result<Vec<_>>>()
            .inspect_err(|_| self.emit(CacheOperation::Save, CacheActivity::Error, records.len()))
    }
}

impl<S> TableScope<'_, S>
where
    S: HashStore,
{
    /// Looks up `ids`, refetching missing and stale records from the repository.
    ///
    /// The result has one entry per distinct requested id; ids the repository does
    /// not know map to `None`. Cached records are served only while their value is
    /// non-empty, their version tag is current and they have not expired. All
    /// records that need refetching are requested in a single repository call and
    /// written back to the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store or the repository fails. Undecodable stored
    /// records are not errors; they are refetched.
    pub async fn get<I>(&self, ids: I) -> Result<HashMap<String, Option<Value>>>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let ids = unique(ids);
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let repository = self.repository()?;
        let raw = self
            .cache
            .store
            .hash_get_multi(self.keys.hash(), &ids)
            .await
            .inspect_err(|_| self.emit(CacheOperation::Get, CacheActivity::Error, ids.len()))?;

        let version = self.cache.version_tag(&repository);
        let now = self.cache.now();

        let mut found = HashMap::with_capacity(ids.len());
        let mut refetch = Vec::new();
        let mut stale = 0;
        for (id, raw) in ids.into_iter().zip(raw.into_iter().chain(iter::repeat(None))) {
            let Some(raw) = raw else {
                refetch.push(id);
                continue;
            };

            match self.decode(&id, &raw) {
                Some(envelope) if envelope.is_valid(&version, now) => {
                    found.insert(id, Some(envelope.into_value()));
                }
                _ => {
                    stale += 1;
                    refetch.push(id);
                }
            }
        }

        if !found.is_empty() {
            self.emit(CacheOperation::Get, CacheActivity::Hit, found.len());
        }
        if stale > 0 {
            self.emit(CacheOperation::Get, CacheActivity::Stale, stale);
        }
        if refetch.len() > stale {
            self.emit(CacheOperation::Get, CacheActivity::Miss, refetch.len() - stale);
        }

        if !refetch.is_empty() {
            let mut records = self.refetch(&repository, &refetch, CacheOperation::Get).await?;
            for id in refetch {
                let value = records.remove(&id);
                found.insert(id, value);
            }
        }

        Ok(found)
    }

    /// Looks up a single id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store or the repository fails.
    pub async fn find(&self, id: impl Into<String>) -> Result<Option<Value>> {
        let id = id.into();
        let mut found = self.get([id.as_str()]).await?;
        Ok(found.remove(&id).flatten())
    }

    /// Looks up a single id, returning `default` if the repository does not know it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store or the repository fails.
    pub async fn find_or(&self, id: impl Into<String>, default: Value) -> Result<Value> {
        Ok(self.find(id).await?.unwrap_or(default))
    }

    /// Removes cached records.
    ///
    /// For tables cached as complete snapshots the ids are also recorded as deleted,
    /// in the same atomic unit, so the next [`all`](Self::all) re-verifies them
    /// against the repository. An empty `ids` does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn delete<I>(&self, ids: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let ids = unique(ids);
        if ids.is_empty() {
            return Ok(());
        }

        let repository = self.repository()?;
        let count = ids.len();
        let result = if repository.supports_full_dump() {
            self.cache
                .store
                .atomic(vec![
                    StoreOp::HashDelete {
                        key: self.keys.hash().to_owned(),
                        fields: ids.clone(),
                    },
                    StoreOp::SetAdd {
                        key: self.keys.deleted().to_owned(),
                        members: ids,
                    },
                ])
                .await
        } else {
            self.cache.store.hash_delete_fields(self.keys.hash(), ids).await
        };

        result.inspect_err(|_| self.emit(CacheOperation::Delete, CacheActivity::Error, count))?;
        self.emit(CacheOperation::Delete, CacheActivity::Deleted, count);
        Ok(())
    }

    /// Drops every cached record of this scope along with its snapshot state.
    ///
    /// The hash, the snapshot tag and the deleted-id set are removed in one atomic
    /// unit. Clearing a cold table is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn clear(&self) -> Result<()> {
        self.cache
            .store
            .atomic(vec![
                StoreOp::Delete {
                    key: self.keys.forever().to_owned(),
                },
                StoreOp::Delete {
                    key: self.keys.deleted().to_owned(),
                },
                StoreOp::Delete {
                    key: self.keys.hash().to_owned(),
                },
            ])
            .await
            .inspect_err(|_| self.emit(CacheOperation::Clear, CacheActivity::Error, 0))?;

        self.emit(CacheOperation::Clear, CacheActivity::Cleared, 0);
        Ok(())
    }

    /// Fetches `ids` from the repository and writes the returned records back.
    pub(crate) async fn refetch(&self, repository: &DynRepository<'_>, ids: &[String], operation: CacheOperation) -> Result<Records> {
        let records = repository
            .fetch(ids, &self.group)
            .await
            .inspect_err(|_| self.emit(operation, CacheActivity::Error, ids.len()))?;

        self.emit(operation, CacheActivity::Refetched, records.len());
        self.save(repository, &records).await?;
        Ok(records)
    }

    /// Writes `records` with the current version tag and the repository's TTL.
    ///
    /// For snapshot-capable repositories the saved ids leave the deleted-id set in
    /// the same atomic unit. Returns `false` if there was nothing to write.
    pub(crate) async fn save(&self, repository: &DynRepository<'_>, records: &Records) -> Result<bool> {
        if records.is_empty() {
            return Ok(false);
        }

        let count = records.len();
        let entries = self.encode_records(repository, records)?;

        let result = if repository.supports_full_dump() {
            self.cache
                .store
                .atomic(vec![
                    StoreOp::HashSet {
                        key: self.keys.hash().to_owned(),
                        entries,
                    },
                    StoreOp::SetRemove {
                        key: self.keys.deleted().to_owned(),
                        members: records.keys().cloned().collect(),
                    },
                ])
                .await
        } else {
            self.cache.store.hash_set_multi(self.keys.hash(), entries).await
        };

        result.inspect_err(|_| self.emit(CacheOperation::Save, CacheActivity::Error, count))?;
        self.emit(CacheOperation::Save, CacheActivity::Saved, count);
        Ok(true)
    }
}

impl<S> fmt::Debug for TableScope<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableScope")
            .field("group", &self.group)
            .field("table", &self.table)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

/// Converts ids to owned strings, dropping repeats and keeping first-seen order.
fn unique<I>(ids: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let mut seen = HashSet::new();
    ids.into_iter().map(Into::into).filter(|id| seen.insert(id.clone())).collect()
}
