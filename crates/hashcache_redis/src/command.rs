// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Translation of store operations into Redis commands.

use hashcache_store::StoreOp;

/// Builds the Redis command for one write.
pub(crate) fn to_cmd(op: &StoreOp) -> redis::Cmd {
    match op {
        StoreOp::HashSet { key, entries } => {
            let mut cmd = redis::cmd("HSET");
            cmd.arg(key);
            for (field, value) in entries {
                cmd.arg(field).arg(value);
            }
            cmd
        }
        StoreOp::HashDelete { key, fields } => {
            let mut cmd = redis::cmd("HDEL");
            cmd.arg(key).arg(fields);
            cmd
        }
        StoreOp::SetString { key, value, ttl } => {
            let mut cmd = redis::cmd("SET");
            cmd.arg(key).arg(value);
            if let Some(ttl) = ttl {
                // EX rejects zero.
                cmd.arg("EX").arg(ttl.as_secs().max(1));
            }
            cmd
        }
        StoreOp::Delete { key } => {
            let mut cmd = redis::cmd("DEL");
            cmd.arg(key);
            cmd
        }
        StoreOp::SetAdd { key, members } => {
            let mut cmd = redis::cmd("SADD");
            cmd.arg(key).arg(members);
            cmd
        }
        StoreOp::SetRemove { key, members } => {
            let mut cmd = redis::cmd("SREM");
            cmd.arg(key).arg(members);
            cmd
        }
    }
}

/// Builds a `MULTI`/`EXEC` pipeline for a group of writes.
///
/// Operations that would be rejected for an empty argument list are left out.
pub(crate) fn to_transaction(ops: &[StoreOp]) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic();
    for op in ops.iter().filter(|op| !op.is_noop()) {
        pipe.add_command(to_cmd(op)).ignore();
    }
    pipe
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn packed(cmd: &redis::Cmd) -> String {
        String::from_utf8_lossy(&cmd.get_packed_command()).into_owned()
    }

    #[test]
    fn hash_set_interleaves_fields_and_values() {
        let cmd = to_cmd(&StoreOp::HashSet {
            key: "app:users".to_string(),
            entries: vec![("1".to_string(), "{\"value\":1}".to_string())],
        });
        let text = packed(&cmd);
        assert!(text.starts_with("*4\r\n$4\r\nHSET\r\n$9\r\napp:users\r\n"));
        assert!(text.ends_with("$1\r\n1\r\n$11\r\n{\"value\":1}\r\n"));
    }

    #[test]
    fn set_string_with_ttl_uses_ex_seconds() {
        let cmd = to_cmd(&StoreOp::SetString {
            key: "app:users:forever".to_string(),
            value: "1700000000".to_string(),
            ttl: Some(Duration::from_secs(50)),
        });
        let text = packed(&cmd);
        assert!(text.contains("EX"));
        assert!(text.contains("\r\n50\r\n"));
    }

    #[test]
    fn set_string_with_sub_second_ttl_rounds_up() {
        let cmd = to_cmd(&StoreOp::SetString {
            key: "k".to_string(),
            value: "v".to_string(),
            ttl: Some(Duration::from_millis(10)),
        });
        assert!(packed(&cmd).contains("EX\r\n$1\r\n1\r\n"));
    }

    #[test]
    fn set_string_without_ttl_has_no_expiry() {
        let cmd = to_cmd(&StoreOp::SetString {
            key: "k".to_string(),
            value: "v".to_string(),
            ttl: None,
        });
        assert!(!packed(&cmd).contains("EX"));
    }

    #[test]
    fn transaction_skips_empty_operations() {
        let pipe = to_transaction(&[
            StoreOp::HashDelete {
                key: "app:users".to_string(),
                fields: vec!["3".to_string()],
            },
            StoreOp::SetAdd {
                key: "app:users:deleted".to_string(),
                members: Vec::new(),
            },
        ]);
        let text = String::from_utf8_lossy(&pipe.get_packed_pipeline()).into_owned();
        assert!(text.contains("MULTI"));
        assert!(text.contains("HDEL"));
        assert!(!text.contains("SADD"));
        assert!(text.contains("EXEC"));
    }
}
