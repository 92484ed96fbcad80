// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Redis-backed store for the `hashcache` read-through cache.
//!
//! [`RedisStore`] implements [`HashStore`] on top of the `redis` crate's
//! [`ConnectionManager`], which reconnects transparently and can be shared by
//! many tasks. Atomic units are sent as a single `MULTI`/`EXEC` pipeline.
//!
//! # Examples
//!
//! ```no_run
//! use hashcache_redis::RedisStore;
//! use hashcache_store::HashStore;
//!
//! # async fn example() -> Result<(), hashcache_store::Error> {
//! let store = RedisStore::connect("redis://127.0.0.1/").await?;
//! let exists = store.exists("app:users:forever").await?;
//! # Ok(())
//! # }
//! ```

mod command;
mod reply;

use std::collections::HashMap;

use hashcache_store::{Error, HashStore, StoreOp};
use redis::aio::ConnectionManager;

/// A [`HashStore`] backed by a Redis server.
///
/// Cloning is cheap and every clone shares the same managed connection.
/// Errors from the server or the connection are surfaced as
/// [`ErrorKind::BackingStore`](hashcache_store::ErrorKind::BackingStore) without retries;
/// request timeouts are whatever the connection manager is configured with.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Creates a store over an existing connection manager.
    #[must_use]
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    /// Opens a managed connection to the server at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the server cannot be reached.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let client = redis::Client::open(url).map_err(Error::backing_store)?;
        let connection = ConnectionManager::new(client).await.map_err(Error::backing_store)?;
        tracing::debug!("hash_cache.connected");
        Ok(Self::new(connection))
    }

    async fn query<T: redis::FromRedisValue>(&self, cmd: &redis::Cmd) -> Result<T, Error> {
        let mut connection = self.connection.clone();
        cmd.query_async(&mut connection).await.map_err(Error::backing_store)
    }
}

impl HashStore for RedisStore {
    async fn hash_get_multi(&self, key: &str, fields: &[String]) -> Result<Vec<Option<String>>, Error> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }
        let mut cmd = redis::cmd("HMGET");
        cmd.arg(key).arg(fields);
        self.query(&cmd).await.map(reply::fields)
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, Error> {
        let mut cmd = redis::cmd("HGETALL");
        cmd.arg(key);
        self.query(&cmd).await.map(reply::entries)
    }

    async fn exists(&self, key: &str) -> Result<bool, Error> {
        let mut cmd = redis::cmd("EXISTS");
        cmd.arg(key);
        let count: i64 = self.query(&cmd).await?;
        Ok(count > 0)
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, Error> {
        let mut cmd = redis::cmd("SMEMBERS");
        cmd.arg(key);
        self.query(&cmd).await.map(reply::members)
    }

    async fn execute(&self, op: StoreOp) -> Result<(), Error> {
        if op.is_noop() {
            return Ok(());
        }
        self.query::<()>(&command::to_cmd(&op)).await
    }

    async fn atomic(&self, ops: Vec<StoreOp>) -> Result<(), Error> {
        let pipe = command::to_transaction(&ops);
        let mut connection = self.connection.clone();
        pipe.query_async::<()>(&mut connection).await.map_err(Error::backing_store)
    }
}
