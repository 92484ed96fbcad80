// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for cache operations.

use std::fmt;

/// The category of a cache failure.
///
/// Registration and capability failures are programmer errors and are raised
/// before the backing store is touched. Store and repository failures carry the
/// underlying cause as the error source.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// No repository is bound to the table.
    NotRegistered {
        /// The table that was looked up.
        table: String,
    },
    /// The table's repository lacks the capability the operation needs.
    Unsupported {
        /// The table that was addressed.
        table: String,
        /// The operation that was attempted.
        operation: &'static str,
    },
    /// The key/value store failed (network, protocol or aborted transaction).
    BackingStore,
    /// The repository failed while fetching authoritative data.
    Repository,
    /// A cached envelope could not be serialized.
    Encode,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRegistered { table } => write!(f, "repository {table} is not registered"),
            Self::Unsupported { table, operation } => {
                write!(f, "repository {table} does not support full table dumps required by {operation}")
            }
            Self::BackingStore => f.write_str("backing store operation failed"),
            Self::Repository => f.write_str("repository operation failed"),
            Self::Encode => f.write_str("failed to encode cache envelope"),
        }
    }
}

/// An error from a cache operation.
///
/// The [`kind`](Error::kind) tells callers what went wrong; the wrapped cause, if any,
/// is available through [`std::error::Error::source()`].
///
/// # Example
///
/// ```
/// use hashcache_store::{Error, ErrorKind};
///
/// let error = Error::not_registered("users");
/// assert_eq!(
///     error.kind(),
///     &ErrorKind::NotRegistered {
///         table: "users".to_string()
///     }
/// );
/// ```
#[ohno::error]
#[display("{kind}")]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Creates an error for a table with no bound repository.
    pub fn not_registered(table: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotRegistered { table: table.into() })
    }

    /// Creates an error for an operation the table's repository cannot serve.
    pub fn unsupported(table: impl Into<String>, operation: &'static str) -> Self {
        Self::new(ErrorKind::Unsupported {
            table: table.into(),
            operation,
        })
    }

    /// Wraps a failure reported by the key/value store.
    ///
    /// Store implementations in other crates use this to surface their client errors.
    pub fn backing_store(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::BackingStore, cause)
    }

    /// Wraps a failure reported by a repository.
    ///
    /// Repository implementations use this to surface errors from their data source.
    pub fn repository(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Repository, cause)
    }

    /// Wraps a serialization failure of a cache envelope.
    pub fn encode(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Encode, cause)
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

/// A specialized [`Result`] type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn not_registered_names_the_table() {
        let error = Error::not_registered("users");
        let display_str = format!("{error}");
        assert!(
            display_str.contains("users is not registered"),
            "display output should name the table, got: {display_str}"
        );
        assert!(error.source().is_none());
    }

    #[test]
    fn unsupported_names_the_operation() {
        let error = Error::unsupported("orders", "all");
        assert_eq!(
            error.kind(),
            &ErrorKind::Unsupported {
                table: "orders".to_string(),
                operation: "all"
            }
        );
        assert!(format!("{error}").contains("required by all"));
    }

    #[test]
    fn backing_store_keeps_cause() {
        let error = Error::backing_store("connection reset");
        assert_eq!(error.kind(), &ErrorKind::BackingStore);
        let debug_str = format!("{error:?}");
        assert!(
            debug_str.contains("connection reset"),
            "debug output should contain the cause message, got: {debug_str}"
        );
    }

    #[test]
    fn repository_error_display_contains_cause() {
        let error = Error::repository("database unavailable");
        assert_eq!(error.kind(), &ErrorKind::Repository);
        assert!(format!("{error}").contains("database unavailable"));
    }

    #[test]
    fn result_type_alias_propagates_errors() {
        fn returns_err() -> Result<i32> {
            Err(Error::encode("bad value"))
        }

        let err = returns_err().expect_err("should return an error");
        assert_eq!(err.kind(), &ErrorKind::Encode);
    }
}
