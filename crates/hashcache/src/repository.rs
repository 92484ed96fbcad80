// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The contract an authoritative data source implements.

use std::{collections::HashMap, time::Duration};

use hashcache_store::{Error, Result};
use serde_json::Value;

/// Records keyed by entity id, as returned by a repository.
pub type Records = HashMap<String, Value>;

/// An authoritative source of records for one table.
///
/// Every repository can fetch records by id. Repositories that can also dump
/// their whole table override [`supports_full_dump`](Self::supports_full_dump)
/// and [`all`](Self::all); only those tables can be cached as complete
/// snapshots.
///
/// Instances are shared by every scope of the table, so implementations must be
/// stateless or synchronize internally.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use hashcache::{Records, Repository, Result};
/// use serde_json::json;
///
/// struct Countries;
///
/// impl Repository for Countries {
///     fn version(&self) -> String {
///         "2024-06".to_string()
///     }
///
///     fn ttl(&self) -> Duration {
///         Duration::ZERO
///     }
///
///     async fn fetch(&self, ids: &[String], _group: &str) -> Result<Records> {
///         Ok(ids
///             .iter()
///             .filter(|id| id.as_str() == "fr")
///             .map(|id| (id.clone(), json!({"name": "France"})))
///             .collect())
///     }
///
///     fn supports_full_dump(&self) -> bool {
///         true
///     }
///
///     async fn all(&self, _group: &str) -> Result<Records> {
///         Ok(Records::from([("fr".to_string(), json!({"name": "France"}))]))
///     }
/// }
/// ```
#[dynosaur::dynosaur(pub DynRepository = dyn(box) Repository, bridge(none))]
pub trait Repository: Send + Sync {
    /// Returns the revision of the data; changing it invalidates every cached record.
    fn version(&self) -> String;

    /// Returns how long records stay fresh; [`Duration::ZERO`] means forever.
    fn ttl(&self) -> Duration;

    /// Fetches the records for `ids`.
    ///
    /// Ids that do not exist are left out of the result.
    fn fetch(&self, ids: &[String], group: &str) -> impl Future<Output = Result<Records>> + Send;

    /// Returns `true` if [`all`](Self::all) returns the complete table.
    fn supports_full_dump(&self) -> bool {
        false
    }

    /// Returns every record of the table.
    ///
    /// The default implementation fails with
    /// [`ErrorKind::Unsupported`](hashcache_store::ErrorKind::Unsupported).
    fn all(&self, _group: &str) -> impl Future<Output = Result<Records>> + Send {
        std::future::ready(Err(Error::unsupported(std::any::type_name::<Self>(), "all")))
    }
}
