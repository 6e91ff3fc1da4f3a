use serde::Serialize;

use crate::state::Snapshot;

pub const APP_NAME: &str = "hawk-tui";

/// Counts and sizes printed by `--check`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub app: &'static str,
    pub commands: usize,
    pub grpc_ok: usize,
    pub grpc_bad: usize,
    pub stream_rows: usize,
    pub log_size: u64,
    pub log_delta: u64,
}

impl CheckSummary {
    pub fn from_snapshot(snap: &Snapshot) -> Self {
        Self {
            app: APP_NAME,
            commands: snap.catalog.len(),
            grpc_ok: snap.health.ok,
            grpc_bad: snap.health.bad,
            stream_rows: snap.streams.rows.len(),
            log_size: snap.log.size,
            log_delta: snap.log.delta,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_keys() {
        let mut snap = Snapshot::new();
        snap.log.size = 180;
        snap.log.delta = 80;

        let json = CheckSummary::from_snapshot(&snap).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["app"], "hawk-tui");
        assert_eq!(value["commands"], 0);
        assert_eq!(value["log_size"], 180);
        assert_eq!(value["log_delta"], 80);
        for key in ["grpc_ok", "grpc_bad", "stream_rows"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
    }
}
