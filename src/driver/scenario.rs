//! Scenario execution with guaranteed reverse-order cleanup

use std::panic::{self, AssertUnwindSafe};

use super::params::Params;
use crate::common::Result;

/// One unit of scenario work
///
/// `run` acquires whatever the step needs (a process, a file, a snapshot)
/// and may publish values into `params` for later steps. `cleanup` is only
/// called after `run` returned `Ok`, so it may assume everything was
/// acquired.
pub trait Step {
    fn run(&mut self, params: &mut Params) -> Result<()>;

    fn cleanup(&mut self);

    /// Label used in logs and reports
    fn name(&self) -> String {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("step")
            .to_string()
    }
}

/// Where a scenario is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioState {
    NotStarted,
    Running,
    Completed,
    /// Step at this index returned an error
    Failed(usize),
}

/// An ordered list of steps executed as one test
pub struct Scenario {
    steps: Vec<Box<dyn Step>>,
    state: ScenarioState,
}

impl Scenario {
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Self {
            steps,
            state: ScenarioState::NotStarted,
        }
    }

    pub fn push(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn state(&self) -> ScenarioState {
        self.state
    }

    /// Run every step in order, stopping at the first failure
    ///
    /// Whatever happens, every step whose `run` succeeded is cleaned up in
    /// reverse order before this returns. The failing step's error is
    /// returned as-is.
    pub fn run(&mut self, params: &mut Params) -> Result<()> {
        tracing::info!(
            steps = self.steps.len(),
            xds = params.xds,
            ports = ?params.ports,
            vars = ?params.vars,
            "running scenario"
        );
        self.state = ScenarioState::Running;

        let mut stack = CleanupStack {
            steps: &mut self.steps,
            passed: 0,
        };

        let mut outcome = Ok(());
        for index in 0..stack.steps.len() {
            let step = &mut stack.steps[index];
            tracing::debug!(index, step = %step.name(), "running step");

            if let Err(e) = step.run(params) {
                tracing::error!(index, step = %step.name(), error = %e, "step failed");
                outcome = Err((index, e));
                break;
            }
            stack.passed += 1;
        }

        drop(stack);

        match outcome {
            Ok(()) => {
                self.state = ScenarioState::Completed;
                tracing::info!("scenario completed");
                Ok(())
            }
            Err((index, e)) => {
                self.state = ScenarioState::Failed(index);
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.steps.iter().map(|s| s.name()).collect();
        f.debug_struct("Scenario")
            .field("steps", &names)
            .field("state", &self.state)
            .finish()
    }
}

/// Steps `0..passed` have run successfully; dropping the stack cleans them
/// up last-first. Runs on normal exit and while unwinding from a panic in
/// a step's `run`.
struct CleanupStack<'a> {
    steps: &'a mut [Box<dyn Step>],
    passed: usize,
}

impl Drop for CleanupStack<'_> {
    fn drop(&mut self) {
        for step in self.steps[..self.passed].iter_mut().rev() {
            let name = step.name();
            tracing::debug!(step = %name, "cleaning up");

            // A panicking cleanup must not stop the rest of the pass.
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| step.cleanup())) {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                tracing::error!(step = %name, panic = %message, "cleanup panicked");
            }
        }
    }
}
