//! Run shell commands

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use crate::common::{Error, Result};
use crate::driver::{Params, Step};

/// Run `sh -c <command>` and fail on a non-zero exit
///
/// The command text is expanded against the parameters. An optional
/// teardown command runs on cleanup; its failures are logged only.
#[derive(Debug, Clone)]
pub struct Shell {
    command: String,
    teardown: Option<String>,
    dir: Option<PathBuf>,
    /// Teardown text as expanded during `run`
    pending_teardown: Option<String>,
}

impl Shell {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            teardown: None,
            dir: None,
            pending_teardown: None,
        }
    }

    pub fn teardown(mut self, command: &str) -> Self {
        self.teardown = Some(command.to_string());
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.dir = Some(dir.to_path_buf());
        self
    }

    fn exec(&self, command: &str) -> Result<Output> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }
        cmd.output()
            .map_err(|e| Error::process("sh", format!("failed to execute '{}': {}", command, e)))
    }
}

impl Step for Shell {
    fn run(&mut self, params: &mut Params) -> Result<()> {
        let command = params.fill(&self.command)?;
        // Expand now: cleanup has no access to the parameters.
        self.pending_teardown = self
            .teardown
            .as_deref()
            .map(|t| params.fill(t))
            .transpose()?;

        tracing::debug!(%command, "running shell command");
        let output = self.exec(&command)?;

        if !output.status.success() {
            return Err(Error::process(
                "sh",
                format!(
                    "'{}' failed with exit code {:?}: {}",
                    command,
                    output.status.code(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }
        Ok(())
    }

    fn cleanup(&mut self) {
        let Some(teardown) = self.pending_teardown.take() else {
            return;
        };
        match self.exec(&teardown) {
            Ok(output) if output.status.success() => {}
            Ok(output) => tracing::warn!(
                command = %teardown,
                code = ?output.status.code(),
                "teardown command failed"
            ),
            Err(e) => tracing::warn!(command = %teardown, error = %e, "teardown command failed"),
        }
    }

    fn name(&self) -> String {
        format!("shell '{}'", self.command)
    }
}
