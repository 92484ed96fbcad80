// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Backing-store abstractions for the `hashcache` read-through cache.
//!
//! This crate defines the [`HashStore`] trait a key/value store must satisfy to hold
//! cached table records, the [`StoreOp`] values that make up an atomic unit of work,
//! and the [`Error`] type shared by every `hashcache` crate.
//!
//! # Overview
//!
//! The cache keeps one hash per table, one string sentinel per fully cached table,
//! and one set of tombstoned ids. [`HashStore`] exposes exactly the primitives
//! needed for that layout: batched hash reads and writes, string and set commands,
//! and [`HashStore::atomic`] for multi-step changes that must never be observed
//! half applied.
//!
//! # Implementing a Store
//!
//! ```
//! use std::collections::HashMap;
//!
//! use hashcache_store::{Error, HashStore, StoreOp};
//!
//! struct Unavailable;
//!
//! impl HashStore for Unavailable {
//!     async fn hash_get_multi(&self, _key: &str, _fields: &[String]) -> Result<Vec<Option<String>>, Error> {
//!         Err(Error::backing_store("offline"))
//!     }
//!
//!     async fn hash_get_all(&self, _key: &str) -> Result<HashMap<String, String>, Error> {
//!         Err(Error::backing_store("offline"))
//!     }
//!
//!     async fn exists(&self, _key: &str) -> Result<bool, Error> {
//!         Err(Error::backing_store("offline"))
//!     }
//!
//!     async fn set_members(&self, _key: &str) -> Result<Vec<String>, Error> {
//!         Err(Error::backing_store("offline"))
//!     }
//!
//!     async fn execute(&self, _op: StoreOp) -> Result<(), Error> {
//!         Err(Error::backing_store("offline"))
//!     }
//!
//!     async fn atomic(&self, _ops: Vec<StoreOp>) -> Result<(), Error> {
//!         Err(Error::backing_store("offline"))
//!     }
//! }
//! ```
//!
//! # Testing
//!
//! Enable the `test-util` feature for [`testing::MockStore`], an in-memory store that
//! records every call and supports failure injection.

pub mod error;
pub(crate) mod op;
pub(crate) mod store;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use error::{Error, ErrorKind, Result};
#[doc(inline)]
pub use op::StoreOp;
#[doc(inline)]
pub use store::HashStore;
