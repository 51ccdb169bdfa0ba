//! Error types for the scenario driver
//!
//! Template and filesystem errors carry the document name or path and the
//! phase that failed, so callers can tell a bad template from a missing
//! directory without inspecting the message text.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the scenario driver
#[derive(Error, Debug)]
pub enum Error {
    // === Template Errors ===
    #[error("template '{name}': parse error at line {line}: {message}")]
    TemplateParse {
        name: String,
        line: usize,
        message: String,
    },

    #[error("template '{name}': {message}")]
    TemplateExec { name: String, message: String },

    // === Filesystem Errors ===
    #[error("failed to create dir {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create file {}: {source}", path.display())]
    CreateFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write file {}: {source}", path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Step Errors ===
    #[error("step '{step}' failed: {message}")]
    StepFailed { step: String, message: String },

    #[error("process '{program}': {message}")]
    Process { program: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Test assertion failed: {0}")]
    TestAssertion(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create a step failure for a named step
    pub fn step_failed(step: &str, message: impl Into<String>) -> Self {
        Self::StepFailed {
            step: step.to_string(),
            message: message.into(),
        }
    }

    /// Create a process error
    pub fn process(program: &str, message: impl Into<String>) -> Self {
        Self::Process {
            program: program.to_string(),
            message: message.into(),
        }
    }

    /// Create a template execution error
    pub fn template_exec(name: &str, message: impl Into<String>) -> Self {
        Self::TemplateExec {
            name: name.to_string(),
            message: message.into(),
        }
    }
}
