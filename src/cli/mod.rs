//! CLI command handling
//!
//! Dispatches CLI commands and formats the run summary.

use std::path::Path;

use colored::Colorize;
use serde_json::Value;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::driver::Params;
use crate::template;
use crate::testing::{run_scenario, RunOptions, TestResult};

/// Dispatch a CLI command
pub fn dispatch(command: Commands, verbose: bool) -> Result<()> {
    let config = Config::load()?;

    match command {
        Commands::Run {
            scenarios,
            vars,
            ports,
            xds,
            fail_fast,
        } => {
            let options = RunOptions {
                verbose,
                vars,
                ports,
                xds,
            };

            let mut results = Vec::with_capacity(scenarios.len());
            for path in &scenarios {
                let result = run_scenario(path, &options, &config)
                    .unwrap_or_else(|e| load_failure(path, e));
                let failed = !result.passed;
                results.push(result);
                if failed && fail_fast {
                    break;
                }
            }

            print_summary(&results);

            let failed = results.iter().filter(|r| !r.passed).count();
            if failed > 0 {
                return Err(Error::TestAssertion(format!(
                    "{} of {} scenario(s) failed",
                    failed,
                    results.len()
                )));
            }
            Ok(())
        }

        Commands::Render {
            template: template_path,
            output,
            vars,
            ports,
            xds,
        } => {
            let mut params = Params::new(xds.unwrap_or(config.defaults.xds));
            for (name, value) in vars {
                params.set_var(&name, value);
            }
            for (name, port) in ports {
                params.set_port(&name, port);
            }

            render_one(&template_path, &output, &params)?;
            println!("Rendered {}", output.display());
            Ok(())
        }
    }
}

fn render_one(template_path: &Path, output: &Path, params: &Params) -> Result<()> {
    let text = std::fs::read_to_string(template_path).map_err(|e| Error::FileRead {
        path: template_path.display().to_string(),
        error: e.to_string(),
    })?;
    let name = template_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| template_path.display().to_string());

    template::render_file(output, &name, &text, &Value::Object(params.context()))
}

/// A scenario that could not be loaded or built counts as failed
fn load_failure(path: &Path, error: Error) -> TestResult {
    tracing::error!(path = %path.display(), %error, "failed to load scenario");
    println!(
        "\n{} {}: {}",
        "✗".red().bold(),
        path.display().to_string().white().bold(),
        error
    );
    TestResult {
        name: path.display().to_string(),
        passed: false,
        steps_run: 0,
        steps_total: 0,
        failed_step: None,
        error: Some(error.to_string()),
    }
}

fn print_summary(results: &[TestResult]) {
    if results.len() < 2 {
        return;
    }

    println!("{}", "Summary:".cyan());
    for result in results {
        if result.passed {
            println!("  {} {}", "✓".green(), result.name);
        } else {
            let at = match &result.failed_step {
                Some(step) => format!(
                    " (step {}/{} {})",
                    result.steps_run, result.steps_total, step
                ),
                None => String::new(),
            };
            println!(
                "  {} {}{}: {}",
                "✗".red(),
                result.name,
                at,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}
