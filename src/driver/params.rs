//! The parameter set shared by every step of a scenario

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::snapshot::SnapshotCache;
use crate::common::Result;
use crate::template::Template;

/// Shared, mutable scenario parameters
///
/// Templates see the set as `{{.XDS}}`, `{{.Ports.<name>}}` and
/// `{{.Vars.<name>}}`. Steps run one after another, so a plain `&mut`
/// borrow is all the synchronization needed.
#[derive(Debug, Default)]
pub struct Params {
    /// XDS API version of the proxy configs being generated
    pub xds: u32,

    /// Named ports
    pub ports: BTreeMap<String, u16>,

    /// Free-form variables
    pub vars: BTreeMap<String, Value>,

    /// Config snapshots served to proxies under test
    pub config: SnapshotCache,
}

impl Params {
    pub fn new(xds: u32) -> Self {
        Self {
            xds,
            ..Self::default()
        }
    }

    pub fn with_port(mut self, name: &str, port: u16) -> Self {
        self.ports.insert(name.to_string(), port);
        self
    }

    pub fn with_var(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.vars.insert(name.to_string(), value.into());
        self
    }

    /// Set a variable, replacing any previous value
    pub fn set_var(&mut self, name: &str, value: impl Into<Value>) {
        self.vars.insert(name.to_string(), value.into());
    }

    pub fn var(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Set a named port, replacing any previous value
    pub fn set_port(&mut self, name: &str, port: u16) {
        self.ports.insert(name.to_string(), port);
    }

    pub fn port(&self, name: &str) -> Option<u16> {
        self.ports.get(name).copied()
    }

    /// Template view of the parameters as a JSON object
    ///
    /// Callers can add computed fields (log paths, generated fragments) to
    /// the returned object before rendering a document with it.
    pub fn context(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("XDS".to_string(), Value::from(self.xds));
        map.insert(
            "Ports".to_string(),
            Value::Object(
                self.ports
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from(*v)))
                    .collect(),
            ),
        );
        map.insert(
            "Vars".to_string(),
            Value::Object(
                self.vars
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
        );
        map
    }

    /// Expand `text` as a template against the current parameters
    ///
    /// Either the whole text renders or an error naming the bad action is
    /// returned. Later calls see whatever earlier steps changed.
    pub fn fill(&self, text: &str) -> Result<String> {
        Template::parse("params", text)?.render(&Value::Object(self.context()))
    }
}
