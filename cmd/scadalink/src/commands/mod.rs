//! CLI commands module.

mod hmi;
mod plant;
mod sim;
mod util;

pub use hmi::HmiCommand;
pub use plant::PlantCommand;
pub use sim::SimCommand;

// Re-export utils for use in commands
pub(crate) use util::*;
