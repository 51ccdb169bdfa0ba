//! Scenario engine integration tests
//!
//! Drive the engine through its public API with recording steps and with
//! the built-in steps on a scratch directory.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::rc::Rc;

use e2e::driver::ScenarioState;
use e2e::steps::{AllocatePorts, RenderConfig, SetVars, Shell, TemplateSource};
use e2e::{Counter, Error, Params, Result, Scenario, Step};
use serde_json::json;
use tempfile::TempDir;

type Trace = Rc<RefCell<Vec<String>>>;

/// Step that records its calls and fails on demand
struct Recorder {
    label: String,
    fail: bool,
    trace: Trace,
}

impl Step for Recorder {
    fn run(&mut self, _params: &mut Params) -> Result<()> {
        if self.fail {
            self.trace.borrow_mut().push(format!("{}.Run(fail)", self.label));
            Err(Error::step_failed(&self.label, "injected failure"))
        } else {
            self.trace.borrow_mut().push(format!("{}.Run", self.label));
            Ok(())
        }
    }

    fn cleanup(&mut self) {
        self.trace.borrow_mut().push(format!("{}.Cleanup", self.label));
    }

    fn name(&self) -> String {
        self.label.clone()
    }
}

fn recorders(n: usize, failing: Option<usize>, trace: &Trace) -> Vec<Box<dyn Step>> {
    (0..n)
        .map(|i| {
            Box::new(Recorder {
                label: format!("S{}", i + 1),
                fail: failing == Some(i),
                trace: trace.clone(),
            }) as Box<dyn Step>
        })
        .collect()
}

#[test]
fn test_every_failure_position_unwinds_prefix_in_reverse() {
    for n in 1..=5 {
        for k in 0..n {
            let trace = Trace::default();
            let mut scenario = Scenario::new(recorders(n, Some(k), &trace));

            let err = scenario.run(&mut Params::default()).unwrap_err();
            assert!(
                matches!(&err, Error::StepFailed { step, .. } if *step == format!("S{}", k + 1))
            );

            let mut expected: Vec<String> = (1..=k).map(|i| format!("S{}.Run", i)).collect();
            expected.push(format!("S{}.Run(fail)", k + 1));
            expected.extend((1..=k).rev().map(|i| format!("S{}.Cleanup", i)));

            assert_eq!(*trace.borrow(), expected, "n={n} k={k}");
            assert_eq!(scenario.state(), ScenarioState::Failed(k));
        }
    }
}

#[test]
fn test_all_pass_cleans_each_exactly_once() {
    let trace = Trace::default();
    let mut scenario = Scenario::new(recorders(4, None, &trace));
    scenario.run(&mut Params::default()).unwrap();

    let trace = trace.borrow();
    let cleanups: Vec<&str> = trace
        .iter()
        .filter(|t| t.ends_with(".Cleanup"))
        .map(String::as_str)
        .collect();
    assert_eq!(
        cleanups,
        vec!["S4.Cleanup", "S3.Cleanup", "S2.Cleanup", "S1.Cleanup"]
    );
}

#[test]
fn test_zero_steps() {
    let mut scenario = Scenario::new(Vec::new());
    scenario.run(&mut Params::new(3)).unwrap();
    assert_eq!(scenario.state(), ScenarioState::Completed);
}

#[cfg(unix)]
#[test]
fn test_multi_phase_render_with_builtin_steps() {
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("proxy.started");

    let mut scenario = Scenario::new(Vec::new())
        .push(AllocatePorts::new(
            vec!["Admin".to_string(), "Listener".to_string()],
            Counter::new(31000),
        ))
        .push(SetVars::new(BTreeMap::from([(
            "admin_addr".to_string(),
            json!("127.0.0.1:{{.Ports.Admin}}"),
        )])))
        .push(
            RenderConfig::new(
                "proxy",
                TemplateSource::Inline(
                    "admin: {{.Vars.admin_addr}}\nlisteners:\n{{.Listener | indent 2}}\n"
                        .to_string(),
                ),
                "conf/proxy-v{{.XDS}}.yaml",
            )
            .base_dir(dir.path())
            .field("Listener", "- name: inbound\n  port: {{.Ports.Listener}}")
            .publish("proxy_conf"),
        )
        .push(
            Shell::new(&format!("test -f {{{{.Vars.proxy_conf}}}} && touch {}", marker.display()))
                .teardown(&format!("rm -f {}", marker.display())),
        );

    let mut params = Params::new(3);
    scenario.run(&mut params).unwrap();

    let rendered = fs::read_to_string(dir.path().join("conf/proxy-v3.yaml")).unwrap();
    assert_eq!(
        rendered,
        "admin: 127.0.0.1:31000\nlisteners:\n  - name: inbound\n    port: 31001\n"
    );
    // Shell teardown ran during the cleanup pass.
    assert!(!marker.exists());
    assert_eq!(params.port("Listener"), Some(31001));
}

#[cfg(unix)]
#[test]
fn test_template_failure_stops_scenario_and_unwinds() {
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("started");
    let trace = Trace::default();

    let mut scenario = Scenario::new(Vec::new())
        .push(
            Shell::new(&format!("touch {}", marker.display()))
                .teardown(&format!("rm {}", marker.display())),
        )
        .push(RenderConfig::new(
            "broken",
            TemplateSource::Inline("port: {{.Ports.Missing}}".to_string()),
            dir.path().join("out.yaml").to_str().unwrap(),
        ))
        .push(Recorder {
            label: "never".to_string(),
            fail: false,
            trace: trace.clone(),
        });

    let err = scenario.run(&mut Params::new(2)).unwrap_err();
    assert!(matches!(err, Error::TemplateExec { ref name, .. } if name == "broken"));
    assert!(!marker.exists());
    assert!(trace.borrow().is_empty());
}
