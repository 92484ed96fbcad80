// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Conversion of raw Redis replies into text.
//!
//! Replies are read as bytes. A value that is not valid UTF-8 cannot be an envelope
//! or an id this crate wrote, so it is reported as absent instead of failing the
//! whole reply.

use std::collections::HashMap;

fn text(bytes: Vec<u8>) -> Option<String> {
    String::from_utf8(bytes)
        .inspect_err(|_| tracing::debug!("hash_cache.invalid_utf8"))
        .ok()
}

/// `HMGET` reply: a non-text field reads as missing so it gets re-fetched.
pub(crate) fn fields(reply: Vec<Option<Vec<u8>>>) -> Vec<Option<String>> {
    reply.into_iter().map(|value| value.and_then(text)).collect()
}

/// `HGETALL` reply: entries with a non-text field or value are skipped.
pub(crate) fn entries(reply: HashMap<Vec<u8>, Vec<u8>>) -> HashMap<String, String> {
    reply
        .into_iter()
        .filter_map(|(field, value)| Some((text(field)?, text(value)?)))
        .collect()
}

/// `SMEMBERS` reply: non-text members are skipped.
pub(crate) fn members(reply: Vec<Vec<u8>>) -> Vec<String> {
    reply.into_iter().filter_map(text).collect()
}
