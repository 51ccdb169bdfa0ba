//! Steps that only touch the parameter set

use serde_json::Value;
use std::collections::BTreeMap;

use crate::common::{Error, Result};
use crate::driver::{Counter, Params, Step};

/// Publish variables; string values are expanded against the current
/// parameters first
#[derive(Debug, Clone)]
pub struct SetVars {
    vars: BTreeMap<String, Value>,
}

impl SetVars {
    pub fn new(vars: BTreeMap<String, Value>) -> Self {
        Self { vars }
    }
}

impl Step for SetVars {
    fn run(&mut self, params: &mut Params) -> Result<()> {
        for (name, value) in &self.vars {
            let value = match value {
                Value::String(text) => Value::String(params.fill(text)?),
                other => other.clone(),
            };
            tracing::debug!(name, %value, "set var");
            params.set_var(name, value);
        }
        Ok(())
    }

    fn cleanup(&mut self) {}

    fn name(&self) -> String {
        let names: Vec<&str> = self.vars.keys().map(String::as_str).collect();
        format!("set {}", names.join(", "))
    }
}

/// Hand out ports to every listed name that does not have one yet
#[derive(Debug, Clone)]
pub struct AllocatePorts {
    names: Vec<String>,
    counter: Counter,
}

impl AllocatePorts {
    pub fn new(names: Vec<String>, counter: Counter) -> Self {
        Self { names, counter }
    }
}

impl Step for AllocatePorts {
    fn run(&mut self, params: &mut Params) -> Result<()> {
        for name in &self.names {
            if params.port(name).is_some() {
                continue;
            }
            let port = self
                .counter
                .next()
                .ok_or_else(|| {
                    Error::step_failed(
                        "allocate ports",
                        format!("port range exhausted before '{}'", name),
                    )
                })?;
            tracing::debug!(name, port, "allocated port");
            params.set_port(name, port);
        }
        Ok(())
    }

    fn cleanup(&mut self) {}

    fn name(&self) -> String {
        format!("allocate ports {}", self.names.join(", "))
    }
}
