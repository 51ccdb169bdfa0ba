//! Test runner implementation
//!
//! Loads a YAML scenario, turns each entry into a built-in step and drives
//! them through a [`Scenario`], printing progress as it goes.

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use colored::Colorize;

use crate::common::config::Config;
use crate::common::{paths, Error, Result};
use crate::driver::{Counter, Params, Scenario, ScenarioState, Step};
use crate::steps::{
    AllocatePorts, HttpGet, RenderConfig, SetVars, Shell, Sleep, Spawn, TemplateSource,
    UpdateSnapshot,
};

use super::config::{TestScenario, TestStep};

/// Result of a test run
#[derive(Debug)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub steps_run: usize,
    pub steps_total: usize,
    /// Name of the step that failed, if a step failed
    pub failed_step: Option<String>,
    pub error: Option<String>,
}

/// Caller-supplied overrides for a run
#[derive(Debug, Default, Clone)]
pub struct RunOptions {
    pub verbose: bool,
    /// Extra variables; win over the scenario's own
    pub vars: Vec<(String, String)>,
    /// Fixed ports; names listed here are not allocated
    pub ports: Vec<(String, u16)>,
    /// Override the XDS version
    pub xds: Option<u32>,
}

/// Load and parse a scenario file
pub fn load_scenario(path: &Path) -> Result<TestScenario> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read test scenario '{}': {}",
            path.display(),
            e
        ))
    })?;

    serde_yaml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse test scenario: {}", e)))
}

/// Run a test scenario from a YAML file
pub fn run_scenario(path: &Path, options: &RunOptions, config: &Config) -> Result<TestResult> {
    let scenario = load_scenario(path)?;
    let scenario_dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    println!(
        "\n{} {}",
        "Running Test:".blue().bold(),
        scenario.name.white().bold()
    );
    if let Some(desc) = &scenario.description {
        println!("  {}", desc.dimmed());
    }

    let mut params = initial_params(&scenario, scenario_dir, options, config);

    let mut built: Vec<Box<dyn Step>> = Vec::with_capacity(scenario.steps.len() + 1);
    if !scenario.ports.is_empty() {
        let base = scenario.base_port.unwrap_or(config.defaults.base_port);
        built.push(Box::new(AllocatePorts::new(
            scenario.ports.clone(),
            Counter::new(base),
        )));
    }
    for step in &scenario.steps {
        built.push(build_step(step, scenario_dir, config)?);
    }

    // Port allocation counts as step 1 when present.
    let steps_total = built.len();
    let names: Vec<String> = built.iter().map(|s| s.name()).collect();
    let progress = Rc::new(Cell::new(0usize));
    let steps: Vec<Box<dyn Step>> = built
        .into_iter()
        .enumerate()
        .map(|(i, inner)| {
            Box::new(Reported {
                number: i + 1,
                inner,
                verbose: options.verbose,
                progress: Rc::clone(&progress),
            }) as Box<dyn Step>
        })
        .collect();

    println!("\n{}", "Steps:".cyan());
    let mut runner = Scenario::new(steps);
    let outcome = runner.run(&mut params);

    let steps_run = progress.get();
    match outcome {
        Ok(()) => {
            println!(
                "\n{} {}\n",
                "✓".green().bold(),
                "Test Passed".green().bold()
            );
            Ok(TestResult {
                name: scenario.name,
                passed: true,
                steps_run,
                steps_total,
                failed_step: None,
                error: None,
            })
        }
        Err(e) => {
            println!("\n{} {}\n", "✗".red().bold(), "Test Failed".red().bold());
            let failed_step = match runner.state() {
                ScenarioState::Failed(index) => names.get(index).cloned(),
                _ => None,
            };
            Ok(TestResult {
                name: scenario.name,
                passed: false,
                steps_run,
                steps_total,
                failed_step,
                error: Some(e.to_string()),
            })
        }
    }
}

fn initial_params(
    scenario: &TestScenario,
    scenario_dir: &Path,
    options: &RunOptions,
    config: &Config,
) -> Params {
    let mut params = Params::new(
        options
            .xds
            .or(scenario.xds)
            .unwrap_or(config.defaults.xds),
    );

    params.set_var("scenario_dir", scenario_dir.display().to_string());
    for (name, value) in &scenario.vars {
        params.set_var(name, value.clone());
    }
    for (name, value) in &options.vars {
        params.set_var(name, value.clone());
    }
    for (name, port) in &options.ports {
        params.set_port(name, *port);
    }
    params
}

/// Turn a scenario entry into a runnable step
pub fn build_step(step: &TestStep, scenario_dir: &Path, config: &Config) -> Result<Box<dyn Step>> {
    Ok(match step {
        TestStep::SetVars { vars } => Box::new(SetVars::new(vars.clone())),

        TestStep::Render {
            template,
            inline,
            output,
            fields,
            publish,
        } => {
            let (id, source) = match (template, inline) {
                (Some(path), None) => (
                    path.display().to_string(),
                    TemplateSource::File(paths::resolve(scenario_dir, path)),
                ),
                (None, Some(text)) => ("inline".to_string(), TemplateSource::Inline(text.clone())),
                _ => {
                    return Err(Error::Config(
                        "render step needs exactly one of 'template' or 'inline'".to_string(),
                    ))
                }
            };
            let mut render = RenderConfig::new(&id, source, output)
                .base_dir(scenario_dir)
                .fields(fields.clone());
            if let Some(var) = publish {
                render = render.publish(var);
            }
            Box::new(render)
        }

        TestStep::Shell { command, teardown } => {
            let mut shell = Shell::new(command).current_dir(scenario_dir);
            if let Some(teardown) = teardown {
                shell = shell.teardown(teardown);
            }
            Box::new(shell)
        }

        TestStep::Spawn {
            name,
            program,
            args,
            env,
            ready_port,
            log,
        } => {
            let path = config.program(program)?;
            let path = paths::resolve(scenario_dir, &path);
            let mut spawn = Spawn::new(name.as_deref().unwrap_or(program), &path)
                .args(args.iter().cloned())
                .ready_timeout(config.timeouts.ready())
                .grace(config.timeouts.shutdown_grace());
            for (key, value) in env {
                spawn = spawn.env(key, value);
            }
            if let Some(port) = ready_port {
                spawn = spawn.ready_port(port);
            }
            if let Some(log) = log {
                spawn = spawn.log_file(&paths::resolve(scenario_dir, log));
            }
            Box::new(spawn)
        }

        TestStep::Sleep { ms } => Box::new(Sleep(Duration::from_millis(*ms))),

        TestStep::HttpGet {
            url,
            headers,
            status,
            body_contains,
        } => {
            let mut get = HttpGet::new(url).timeout(config.timeouts.http());
            for (name, value) in headers {
                get = get.header(name, value);
            }
            if let Some(status) = status {
                get = get.expect_status(*status);
            }
            if let Some(text) = body_contains {
                get = get.body_contains(text);
            }
            Box::new(get)
        }

        TestStep::Snapshot {
            node,
            version,
            resources,
        } => Box::new(UpdateSnapshot::new(node, version, resources)),
    })
}

/// Prints a line per step outcome and counts steps that ran
struct Reported {
    number: usize,
    inner: Box<dyn Step>,
    verbose: bool,
    progress: Rc<Cell<usize>>,
}

impl Step for Reported {
    fn run(&mut self, params: &mut Params) -> Result<()> {
        self.progress.set(self.number);
        match self.inner.run(params) {
            Ok(()) => {
                println!(
                    "  {} Step {}: {}",
                    "✓".green(),
                    self.number,
                    self.inner.name().dimmed()
                );
                Ok(())
            }
            Err(e) => {
                println!("  {} Step {}: {}", "✗".red(), self.number, e);
                Err(e)
            }
        }
    }

    fn cleanup(&mut self) {
        if self.verbose {
            println!(
                "  {} cleanup {}: {}",
                "↺".yellow(),
                self.number,
                self.inner.name().dimmed()
            );
        }
        self.inner.cleanup();
    }

    fn name(&self) -> String {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_needs_one_source() {
        let step = TestStep::Render {
            template: None,
            inline: None,
            output: "x".to_string(),
            fields: Default::default(),
            publish: None,
        };
        let err = build_step(&step, Path::new("."), &Config::default()).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_spawn_unknown_program_fails_build() {
        let step = TestStep::Spawn {
            name: None,
            program: "no-such-proxy-binary-xyz".to_string(),
            args: Vec::new(),
            env: Default::default(),
            ready_port: None,
            log: None,
        };
        assert!(build_step(&step, Path::new("."), &Config::default()).is_err());
    }

    #[test]
    fn test_built_step_names() {
        let step = TestStep::Sleep { ms: 250 };
        let built = build_step(&step, Path::new("."), &Config::default()).unwrap();
        assert_eq!(built.name(), "sleep 250ms");
    }

    #[test]
    fn test_port_exhaustion_is_reported_as_first_step() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ports.yaml");
        std::fs::write(
            &path,
            "name: ports\nbase_port: 65535\nports: [A, B]\nsteps:\n  - action: sleep\n    ms: 0\n",
        )
        .unwrap();

        let result = run_scenario(&path, &RunOptions::default(), &Config::default()).unwrap();

        assert!(!result.passed);
        assert_eq!(result.steps_run, 1);
        assert_eq!(result.steps_total, 2);
        assert_eq!(result.failed_step.as_deref(), Some("allocate ports A, B"));
        assert!(result.error.unwrap().contains("before 'B'"));
    }

    #[test]
    fn test_initial_params_precedence() {
        let scenario: TestScenario = serde_yaml::from_str(
            "name: p\nxds: 3\nvars:\n  mode: scenario\n  keep: 1\nsteps: []\n",
        )
        .unwrap();
        let options = RunOptions {
            vars: vec![("mode".to_string(), "cli".to_string())],
            ports: vec![("Backend".to_string(), 8080)],
            ..Default::default()
        };

        let params = initial_params(&scenario, Path::new("/s"), &options, &Config::default());

        assert_eq!(params.xds, 3);
        assert_eq!(params.var("mode"), Some(&json!("cli")));
        assert_eq!(params.var("keep"), Some(&json!(1)));
        assert_eq!(params.var("scenario_dir"), Some(&json!("/s")));
        assert_eq!(params.port("Backend"), Some(8080));
    }
}
