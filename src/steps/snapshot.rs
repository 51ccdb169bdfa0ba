//! Push config snapshots into the parameter set's cache

use serde_json::Value;

use crate::common::Result;
use crate::driver::{read_yaml, Params, Snapshot, Step};

/// Render a YAML resource document and store it as the snapshot for a node
#[derive(Debug, Clone)]
pub struct UpdateSnapshot {
    node: String,
    version: String,
    resources: String,
}

impl UpdateSnapshot {
    pub fn new(node: &str, version: &str, resources: &str) -> Self {
        Self {
            node: node.to_string(),
            version: version.to_string(),
            resources: resources.to_string(),
        }
    }
}

impl Step for UpdateSnapshot {
    fn run(&mut self, params: &mut Params) -> Result<()> {
        let resources: Value = read_yaml(&params.fill(&self.resources)?)?;
        let version = params.fill(&self.version)?;
        params
            .config
            .set_snapshot(&self.node, Snapshot { version, resources });
        Ok(())
    }

    // The cache lives in the parameter set and goes away with it.
    fn cleanup(&mut self) {}

    fn name(&self) -> String {
        format!("snapshot {} v{}", self.node, self.version)
    }
}
