// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The stored form of a cached record.
//!
//! Every hash field holds a JSON object `{"value": ..., "expire": ..., "version": ...}`.
//! The layout is shared with other clients of the same store, so field names and
//! the meaning of `expire` (absolute unix seconds, `null` or `0` for "never")
//! must not change.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

/// A cached value with its expiry and version metadata.
///
/// # Examples
///
/// ```
/// use hashcache::Envelope;
/// use serde_json::json;
///
/// let envelope = Envelope::decode(r#"{"value":{"name":"A"},"expire":200,"version":"1.0@a"}"#)?;
/// assert!(envelope.is_valid("1.0@a", 100));
/// assert!(!envelope.is_valid("1.0@b", 100));
/// assert!(!envelope.is_valid("1.0@a", 200));
/// assert_eq!(envelope.into_value(), json!({"name": "A"}));
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    value: Value,
    #[serde(default)]
    expire: Option<u64>,
    #[serde(default)]
    version: String,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    value: &'a Value,
    expire: Option<u64>,
    version: &'a str,
}

impl Envelope {
    /// Creates an envelope.
    ///
    /// `expire` is an absolute unix timestamp in seconds; `None` never expires.
    #[must_use]
    pub fn new(value: Value, expire: Option<u64>, version: impl Into<String>) -> Self {
        Self {
            value,
            expire,
            version: version.into(),
        }
    }

    /// Parses a stored envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is not a JSON object with a `value` member.
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Serializes this envelope into its stored form.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::Encode`](crate::ErrorKind::Encode) error if the value
    /// cannot be serialized.
    pub fn encode(&self) -> Result<String, Error> {
        encode(&self.value, self.expire, &self.version)
    }

    /// Returns the absolute expiry in unix seconds, if any.
    #[must_use]
    pub fn expire(&self) -> Option<u64> {
        self.expire.filter(|&expire| expire != 0)
    }

    /// Returns the composite version tag the envelope was written with.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns a reference to the cached value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consumes the envelope and returns the cached value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Returns `true` if the envelope may be served at `now` under `version`.
    ///
    /// Valid means the value is not empty, the version tag matches exactly and
    /// the expiry is unset or still in the future.
    #[must_use]
    pub fn is_valid(&self, version: &str, now: u64) -> bool {
        !is_empty_value(&self.value) && self.version == version && self.expire().is_none_or(|expire| expire > now)
    }
}

/// Serializes a value into an envelope without taking ownership of it.
pub(crate) fn encode(value: &Value, expire: Option<u64>, version: &str) -> Result<String, Error> {
    serde_json::to_string(&EnvelopeRef { value, expire, version }).map_err(Error::encode)
}

/// Computes the absolute expiry for a record written at `now`.
///
/// A zero TTL means the record never expires. Sub-second TTLs round up to one
/// second so the record is not stale the moment it is written.
pub(crate) fn expiry(ttl: Duration, now: u64) -> Option<u64> {
    (!ttl.is_zero()).then(|| now.saturating_add(ttl.as_secs().max(1)))
}

/// Empty values are never served from the cache.
///
/// Only the JSON shape counts: the string `"0"` is a regular value, unlike numeric zero.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Bool(true) => false,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(members) => members.is_empty(),
    }
}
