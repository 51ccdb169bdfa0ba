//! Scenario engine
//!
//! A [`Scenario`] runs its [`Step`]s in order against a shared [`Params`]
//! set and always unwinds the successful ones in reverse order.

mod counter;
mod params;
mod scenario;
mod snapshot;
mod yaml;

pub use counter::Counter;
pub use params::Params;
pub use scenario::{Scenario, ScenarioState, Step};
pub use snapshot::{Snapshot, SnapshotCache};
pub use yaml::read_yaml;
