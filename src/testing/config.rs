//! Test scenario configuration types
//!
//! Defines the data structures for deserializing YAML test scenarios.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A complete test scenario loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct TestScenario {
    /// Name of the test scenario
    pub name: String,
    /// Optional description of what the test verifies
    pub description: Option<String>,
    /// XDS version for the generated configs (default from config file)
    pub xds: Option<u32>,
    /// First port to allocate from (default from config file)
    pub base_port: Option<u16>,
    /// Port names allocated before the first step runs
    #[serde(default)]
    pub ports: Vec<String>,
    /// Initial variables
    #[serde(default)]
    pub vars: BTreeMap<String, Value>,
    /// The sequence of test steps to execute
    pub steps: Vec<TestStep>,
}

/// A single test step in the execution flow
#[derive(Deserialize, Debug)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Publish variables (string values are templates)
    SetVars { vars: BTreeMap<String, Value> },
    /// Render a config document
    Render {
        /// Template file, relative to the scenario file
        template: Option<PathBuf>,
        /// Inline template text
        inline: Option<String>,
        /// Output path template
        output: String,
        /// Extra context fields
        #[serde(default)]
        fields: BTreeMap<String, Value>,
        /// Var that receives the rendered file's path
        publish: Option<String>,
    },
    /// Run a shell command
    Shell {
        command: String,
        /// Command to run on cleanup
        teardown: Option<String>,
    },
    /// Start a long-running process
    Spawn {
        /// Label for logs; defaults to the program name
        name: Option<String>,
        /// Program name (looked up in config / PATH) or path
        program: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: BTreeMap<String, String>,
        /// Port template to wait on before continuing
        ready_port: Option<String>,
        /// File receiving stdout/stderr, relative to the scenario file
        log: Option<PathBuf>,
    },
    /// Pause
    Sleep { ms: u64 },
    /// Issue a GET and check the response
    HttpGet {
        url: String,
        #[serde(default)]
        headers: BTreeMap<String, String>,
        /// Expected status (default: 200)
        status: Option<u16>,
        /// Expected substring in the body
        body_contains: Option<String>,
    },
    /// Store a config snapshot for a node
    Snapshot {
        node: String,
        version: String,
        resources: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_scenario() {
        let yaml = r#"
name: client to server
description: request flows through both proxies
xds: 3
base_port: 21000
ports: [ClientAdmin, Backend]
vars:
  node: test-client
steps:
  - action: set_vars
    vars:
      url: "http://127.0.0.1:{{.Ports.Backend}}"
  - action: render
    template: templates/client.yaml.tmpl
    output: out/client.yaml
    fields:
      LogPath: /dev/null
    publish: client_conf
  - action: shell
    command: echo hi
    teardown: echo bye
  - action: spawn
    program: envoy
    args: ["-c", "{{.Vars.client_conf}}"]
    ready_port: "{{.Ports.ClientAdmin}}"
  - action: sleep
    ms: 100
  - action: http_get
    url: "{{.Vars.url}}/"
    status: 200
  - action: snapshot
    node: test-client
    version: "1"
    resources: "listeners: []"
"#;
        let scenario: TestScenario = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(scenario.name, "client to server");
        assert_eq!(scenario.xds, Some(3));
        assert_eq!(scenario.ports, vec!["ClientAdmin", "Backend"]);
        assert_eq!(scenario.steps.len(), 7);
        assert!(matches!(scenario.steps[0], TestStep::SetVars { .. }));
        assert!(matches!(
            &scenario.steps[3],
            TestStep::Spawn { program, args, .. } if program == "envoy" && args.len() == 2
        ));
        assert!(matches!(scenario.steps[4], TestStep::Sleep { ms: 100 }));
    }

    #[test]
    fn test_minimal_scenario() {
        let scenario: TestScenario = serde_yaml::from_str("name: empty\nsteps: []\n").unwrap();
        assert!(scenario.steps.is_empty());
        assert!(scenario.ports.is_empty());
        assert!(scenario.vars.is_empty());
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let result: Result<TestScenario, _> =
            serde_yaml::from_str("name: x\nsteps:\n  - action: teleport\n");
        assert!(result.is_err());
    }
}
