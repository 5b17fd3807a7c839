pub mod a_star;
pub mod common;

pub use common::{heuristic, Algorithm, DistanceMetric};
