// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Whole-table snapshots.
//!
//! A snapshot is a hash that holds every record of a table, marked complete by a
//! sentinel string at `<hash>:forever`. While the sentinel exists, [`TableScope::all`]
//! is answered from the hash alone. Records deleted in the meantime are listed in
//! `<hash>:deleted` and re-fetched individually on the next read instead of
//! discarding the snapshot. The sentinel expires slightly before the records it
//! vouches for, so a snapshot is never older than the repository's TTL allows.
//!
//! Rebuilding replaces the hash, the deleted-id set and the sentinel in one atomic
//! unit, so records the repository no longer returns do not outlive a rebuild.

use std::time::Duration;

use hashcache_store::{Error, HashStore, Result, StoreOp};

use crate::{
    DynRepository, Records, Repository, TableScope,
    telemetry::{CacheActivity, CacheOperation},
};

/// How much earlier than its records a snapshot sentinel expires.
pub(crate) const FOREVER_MARGIN: Duration = Duration::from_secs(10);

/// Returns the sentinel TTL for a repository TTL; `None` keeps it until cleared.
pub(crate) fn tag_ttl(ttl: Duration) -> Option<Duration> {
    (!ttl.is_zero()).then(|| ttl.saturating_sub(FOREVER_MARGIN).max(Duration::from_secs(1)))
}

impl<S> TableScope<'_, S>
where
    S: HashStore,
{
    /// Returns every record of the table.
    ///
    /// While a snapshot is active the records come from the store, after ids deleted
    /// since the snapshot was taken have been re-fetched. Otherwise the repository's
    /// full dump is saved, a new snapshot is started and the dump is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Unsupported`](hashcache_store::ErrorKind::Unsupported)
    /// if the repository cannot dump its table, or an error if the store or the
    /// repository fails.
    pub async fn all(&self) -> Result<Records> {
        let repository = self.repository()?;
        if !repository.supports_full_dump() {
            return Err(Error::unsupported(self.table(), "all"));
        }

        let active = self
            .cache
            .store
            .exists(self.keys().forever())
            .await
            .inspect_err(|_| self.emit(CacheOperation::All, CacheActivity::Error, 0))?;

        if active {
            self.read_snapshot(&repository).await
        } else {
            self.rebuild_snapshot(&repository).await
        }
    }

    /// Drops the snapshot sentinel so the next [`all`](Self::all) reloads the table.
    ///
    /// Cached records stay in place and keep serving point lookups. Does nothing for
    /// repositories that cannot dump their table.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn clear_forever_tag(&self) -> Result<()> {
        let repository = self.repository()?;
        if !repository.supports_full_dump() {
            return Ok(());
        }

        self.cache
            .store
            .delete(self.keys().forever())
            .await
            .inspect_err(|_| self.emit(CacheOperation::ClearForeverTag, CacheActivity::Error, 0))?;

        self.emit(CacheOperation::ClearForeverTag, CacheActivity::ForeverTagCleared, 0);
        Ok(())
    }

    async fn read_snapshot(&self, repository: &DynRepository<'_>) -> Result<Records> {
        let deleted = self
            .cache
            .store
            .set_members(self.keys().deleted())
            .await
            .inspect_err(|_| self.emit(CacheOperation::All, CacheActivity::Error, 0))?;

        if !deleted.is_empty() {
            self.refetch(repository, &deleted, CacheOperation::All).await?;
            self.emit(CacheOperation::All, CacheActivity::SnapshotHealed, deleted.len());
        }

        let fields = self
            .cache
            .store
            .hash_get_all(self.keys().hash())
            .await
            .inspect_err(|_| self.emit(CacheOperation::All, CacheActivity::Error, 0))?;

        let records: Records = fields
            .into_iter()
            .filter_map(|(id, raw)| {
                let envelope = self.decode(&id, &raw)?;
                Some((id, envelope.into_value()))
            })
            .collect();

        self.emit(CacheOperation::All, CacheActivity::SnapshotHit, records.len());
        Ok(records)
    }

    async fn rebuild_snapshot(&self, repository: &DynRepository<'_>) -> Result<Records> {
        let records = repository
            .all(self.group())
            .await
            .inspect_err(|_| self.emit(CacheOperation::All, CacheActivity::Error, 0))?;

        if records.is_empty() {
            return Ok(records);
        }

        let entries = self.encode_records(repository, &records)?;
        self.cache
            .store
            .atomic(vec![
                StoreOp::Delete {
                    key: self.keys().hash().to_owned(),
                },
                StoreOp::Delete {
                    key: self.keys().deleted().to_owned(),
                },
                StoreOp::HashSet {
                    key: self.keys().hash().to_owned(),
                    entries,
                },
                StoreOp::SetString {
                    key: self.keys().forever().to_owned(),
                    value: self.cache.now().to_string(),
                    ttl: tag_ttl(repository.ttl()),
                },
            ])
            .await
            .inspect_err(|_| self.emit(CacheOperation::All, CacheActivity::Error, records.len()))?;

        self.emit(CacheOperation::Save, CacheActivity::Saved, records.len());
        self.emit(CacheOperation::All, CacheActivity::SnapshotRebuilt, records.len());
        Ok(records)
    }
}
