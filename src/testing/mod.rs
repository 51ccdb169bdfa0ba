//! YAML scenario runner
//!
//! Reads scenario files, builds the listed steps and runs them through the
//! scenario engine, reporting each step on the console.

mod config;
mod runner;

pub use config::*;
pub use runner::{build_step, load_scenario, run_scenario, RunOptions, TestResult};
