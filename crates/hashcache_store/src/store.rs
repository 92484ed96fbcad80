// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The core trait for backing stores.
//!
//! [`HashStore`] defines the primitives the cache needs from a key/value store.
//! Reads are individual round trips; writes are expressed as [`StoreOp`] values
//! so the same description can be sent alone or inside an atomic unit.

use std::{collections::HashMap, time::Duration};

use crate::{Error, StoreOp};

/// Trait for key/value stores that can hold cached tables.
///
/// Implementations must be safe to share between tasks. Every method is one
/// request/response round trip; no method retries on failure.
///
/// The required methods are the four reads plus [`execute`](Self::execute) and
/// [`atomic`](Self::atomic). The per-command write methods have default
/// implementations that build the matching [`StoreOp`] and call `execute`.
pub trait HashStore: Send + Sync {
    /// Reads several fields of a hash in one round trip.
    ///
    /// The result has one slot per requested field, in request order; missing
    /// fields are `None`.
    fn hash_get_multi(&self, key: &str, fields: &[String]) -> impl Future<Output = Result<Vec<Option<String>>, Error>> + Send;

    /// Reads every field of a hash.
    fn hash_get_all(&self, key: &str) -> impl Future<Output = Result<HashMap<String, String>, Error>> + Send;

    /// Returns `true` if the key exists and has not expired.
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool, Error>> + Send;

    /// Returns every member of a set; a missing set is empty.
    fn set_members(&self, key: &str) -> impl Future<Output = Result<Vec<String>, Error>> + Send;

    /// Applies a single write.
    fn execute(&self, op: StoreOp) -> impl Future<Output = Result<(), Error>> + Send;

    /// Applies all writes as one all-or-nothing unit.
    ///
    /// Other clients observe either none or all of the writes.
    fn atomic(&self, ops: Vec<StoreOp>) -> impl Future<Output = Result<(), Error>> + Send;

    /// Writes several fields of a hash in one round trip.
    fn hash_set_multi(&self, key: &str, entries: Vec<(String, String)>) -> impl Future<Output = Result<(), Error>> + Send {
        self.execute(StoreOp::HashSet {
            key: key.to_owned(),
            entries,
        })
    }

    /// Removes several fields from a hash.
    fn hash_delete_fields(&self, key: &str, fields: Vec<String>) -> impl Future<Output = Result<(), Error>> + Send {
        self.execute(StoreOp::HashDelete {
            key: key.to_owned(),
            fields,
        })
    }

    /// Writes a string value with an optional time to live.
    fn set_string(&self, key: &str, value: String, ttl: Option<Duration>) -> impl Future<Output = Result<(), Error>> + Send {
        self.execute(StoreOp::SetString {
            key: key.to_owned(),
            value,
            ttl,
        })
    }

    /// Deletes a key of any type.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), Error>> + Send {
        self.execute(StoreOp::Delete { key: key.to_owned() })
    }

    /// Adds members to a set.
    fn set_add(&self, key: &str, members: Vec<String>) -> impl Future<Output = Result<(), Error>> + Send {
        self.execute(StoreOp::SetAdd {
            key: key.to_owned(),
            members,
        })
    }

    /// Removes members from a set.
    fn set_remove(&self, key: &str, members: Vec<String>) -> impl Future<Output = Result<(), Error>> + Send {
        self.execute(StoreOp::SetRemove {
            key: key.to_owned(),
            members,
        })
    }
}
