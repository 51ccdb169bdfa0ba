//! Proxy e2e scenario driver
//!
//! Runs ordered test steps against a shared parameter set, always unwinding
//! the steps that succeeded in reverse order, and renders the templated
//! proxy configs those steps consume.

pub mod cli;
pub mod commands;
pub mod common;
pub mod driver;
pub mod steps;
pub mod template;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use driver::{Counter, Params, Scenario, Step};
