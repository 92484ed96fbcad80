// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Structured events for cache activity.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheOperation {
    Get,
    All,
    Save,
    Delete,
    Clear,
    ClearForeverTag,
}

impl CacheOperation {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Get => "hash.get",
            Self::All => "hash.all",
            Self::Save => "hash.save",
            Self::Delete => "hash.delete",
            Self::Clear => "hash.clear",
            Self::ClearForeverTag => "hash.clear_forever_tag",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheActivity {
    Hit,
    Miss,
    Stale,
    SnapshotHit,
    Refetched,
    Saved,
    Deleted,
    Cleared,
    SnapshotRebuilt,
    SnapshotHealed,
    ForeverTagCleared,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Severity {
    Debug,
    Info,
    Error,
}

impl CacheActivity {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Stale => "stale",
            Self::SnapshotHit => "snapshot_hit",
            Self::Refetched => "refetched",
            Self::Saved => "saved",
            Self::Deleted => "deleted",
            Self::Cleared => "cleared",
            Self::SnapshotRebuilt => "snapshot_rebuilt",
            Self::SnapshotHealed => "snapshot_healed",
            Self::ForeverTagCleared => "forever_tag_cleared",
            Self::Error => "error",
        }
    }

    pub(crate) fn severity(self) -> Severity {
        match self {
            Self::Hit | Self::Miss | Self::Stale | Self::SnapshotHit => Severity::Debug,
            Self::Refetched
            | Self::Saved
            | Self::Deleted
            | Self::Cleared
            | Self::SnapshotRebuilt
            | Self::SnapshotHealed
            | Self::ForeverTagCleared => Severity::Info,
            Self::Error => Severity::Error,
        }
    }
}

/// Emits one `hash_cache.event` for an activity on a table.
pub(crate) fn emit(table: &str, group: &str, operation: CacheOperation, activity: CacheActivity, count: usize) {
    let op = operation.as_str();
    let ev = activity.as_str();

    // Tracing levels are static, so each severity gets its own call site.
    macro_rules! emit_event {
        ($level:ident) => {
            tracing::$level!(
                cache.table = table,
                cache.group = group,
                cache.operation = op,
                cache.activity = ev,
                cache.count = count,
                "hash_cache.event"
            )
        };
    }

    match activity.severity() {
        Severity::Error => emit_event!(error),
        Severity::Info => emit_event!(info),
        Severity::Debug => emit_event!(debug),
    }
}
