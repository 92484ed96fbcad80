// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Derivation of backing-store key names.

/// Derives the store keys that back a table.
///
/// # Examples
///
/// ```
/// use hashcache::KeyResolver;
///
/// let resolver = KeyResolver::new("app");
/// assert_eq!(resolver.resolve("", "users").hash(), "app:users");
/// assert_eq!(resolver.resolve("eu", "users").hash(), "app:users:eu");
/// assert_eq!(resolver.resolve("eu", "users").deleted(), "app:users:eu:deleted");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyResolver {
    prefix: String,
}

impl KeyResolver {
    /// Creates a resolver that places every key under `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Returns the configured prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Resolves the keys for `table`, optionally sharded by `group`.
    ///
    /// An empty group yields `prefix:table`; otherwise `prefix:table:group`.
    #[must_use]
    pub fn resolve(&self, group: &str, table: &str) -> TableKeys {
        let hash = if group.is_empty() {
            format!("{}:{table}", self.prefix)
        } else {
            format!("{}:{table}:{group}", self.prefix)
        };

        TableKeys {
            forever: format!("{hash}:forever"),
            deleted: format!("{hash}:deleted"),
            hash,
        }
    }
}

/// The three store keys owned by one table scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableKeys {
    hash: String,
    forever: String,
    deleted: String,
}

impl TableKeys {
    /// The hash holding one envelope per id.
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// The string sentinel marking a complete snapshot.
    #[must_use]
    pub fn forever(&self) -> &str {
        &self.forever
    }

    /// The set of ids deleted while a snapshot was active.
    #[must_use]
    pub fn deleted(&self) -> &str {
        &self.deleted
    }
}
