pub mod agent;
pub mod algorithms;
pub mod batch_simulation;
pub mod config;
pub mod error;
pub mod grid;
pub mod metrics;
pub mod path;
pub mod pool;
pub mod simulation;
pub mod statistics;

pub use config::SearchSettings;
pub use error::{Error, Result};
pub use grid::{Grid, GridOracle, Point};
pub use path::{Path, PathId, RepairOutcome, Role, StepOutcome};
pub use pool::PathPool;
