//! Per-node config snapshots handed to proxies under test

use serde_json::Value;
use std::collections::HashMap;

/// A versioned set of resources for one node
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub version: String,
    pub resources: Value,
}

/// Latest snapshot per node id
#[derive(Debug, Default)]
pub struct SnapshotCache {
    snapshots: HashMap<String, Snapshot>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot for `node`, returning the previous one
    pub fn set_snapshot(&mut self, node: &str, snapshot: Snapshot) -> Option<Snapshot> {
        tracing::debug!(node, version = %snapshot.version, "updating config snapshot");
        self.snapshots.insert(node.to_string(), snapshot)
    }

    pub fn get_snapshot(&self, node: &str) -> Option<&Snapshot> {
        self.snapshots.get(node)
    }

    pub fn clear(&mut self, node: &str) -> Option<Snapshot> {
        self.snapshots.remove(node)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(version: &str) -> Snapshot {
        Snapshot {
            version: version.to_string(),
            resources: json!({"listeners": []}),
        }
    }

    #[test]
    fn test_set_replaces_previous() {
        let mut cache = SnapshotCache::new();
        assert!(cache.set_snapshot("client", snapshot("1")).is_none());
        let previous = cache.set_snapshot("client", snapshot("2")).unwrap();
        assert_eq!(previous.version, "1");
        assert_eq!(cache.get_snapshot("client").unwrap().version, "2");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut cache = SnapshotCache::new();
        cache.set_snapshot("server", snapshot("1"));
        assert!(cache.clear("server").is_some());
        assert!(cache.get_snapshot("server").is_none());
        assert!(cache.is_empty());
    }
}
