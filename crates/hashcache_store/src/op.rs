// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

/// A single write against the backing store.
///
/// Writes are described as values so a store can run several of them as one
/// all-or-nothing unit through [`HashStore::atomic`](crate::HashStore::atomic).
///
/// # Examples
///
/// ```
/// use hashcache_store::StoreOp;
///
/// let op = StoreOp::SetAdd {
///     key: "app:users:deleted".to_string(),
///     members: vec!["3".to_string()],
/// };
/// assert_eq!(op.key(), "app:users:deleted");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// Writes the given fields of a hash, overwriting existing values.
    HashSet {
        /// The hash key.
        key: String,
        /// Field/value pairs to write.
        entries: Vec<(String, String)>,
    },
    /// Removes the given fields from a hash.
    HashDelete {
        /// The hash key.
        key: String,
        /// Fields to remove.
        fields: Vec<String>,
    },
    /// Writes a string value, optionally expiring after `ttl`.
    SetString {
        /// The string key.
        key: String,
        /// The value to store.
        value: String,
        /// Expiry relative to the time of the write; `None` keeps the key until deleted.
        ttl: Option<Duration>,
    },
    /// Deletes a key of any type.
    Delete {
        /// The key to delete.
        key: String,
    },
    /// Adds members to a set.
    SetAdd {
        /// The set key.
        key: String,
        /// Members to add.
        members: Vec<String>,
    },
    /// Removes members from a set.
    SetRemove {
        /// The set key.
        key: String,
        /// Members to remove.
        members: Vec<String>,
    },
}

impl StoreOp {
    /// Returns the key this operation writes to.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::HashSet { key, .. }
            | Self::HashDelete { key, .. }
            | Self::SetString { key, .. }
            | Self::Delete { key }
            | Self::SetAdd { key, .. }
            | Self::SetRemove { key, .. } => key,
        }
    }

    /// Returns `true` if applying this operation cannot change the store.
    ///
    /// Field and member lists that are empty are rejected by most stores, so
    /// callers skip these operations instead of sending them.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        match self {
            Self::HashSet { entries, .. } => entries.is_empty(),
            Self::HashDelete { fields, .. } => fields.is_empty(),
            Self::SetAdd { members, .. } | Self::SetRemove { members, .. } => members.is_empty(),
            Self::SetString { .. } | Self::Delete { .. } => false,
        }
    }
}
