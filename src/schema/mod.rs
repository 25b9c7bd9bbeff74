//! Schema module - Configuration, parameter and architecture types.

mod architecture;
mod config;
mod parameters;

pub use architecture::*;
pub use config::*;
pub use parameters::*;
