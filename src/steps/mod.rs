//! Built-in steps
//!
//! Test authors can implement [`crate::driver::Step`] themselves; these
//! cover the common pieces of a proxy scenario and back the YAML runner.

mod http;
mod process;
mod render;
mod shell;
mod snapshot;
mod vars;

use std::time::Duration;

use crate::common::Result;
use crate::driver::{Params, Step};

pub use http::HttpGet;
pub use process::Spawn;
pub use render::{RenderConfig, TemplateSource};
pub use shell::Shell;
pub use snapshot::UpdateSnapshot;
pub use vars::{AllocatePorts, SetVars};

/// Pause the scenario, e.g. to let a proxy pick up a new config
#[derive(Debug, Clone)]
pub struct Sleep(pub Duration);

impl Step for Sleep {
    fn run(&mut self, _params: &mut Params) -> Result<()> {
        std::thread::sleep(self.0);
        Ok(())
    }

    fn cleanup(&mut self) {}

    fn name(&self) -> String {
        format!("sleep {}ms", self.0.as_millis())
    }
}
