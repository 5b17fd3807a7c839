use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// No algorithm in the metrics file has enough logged runs to average.
    #[error("no algorithm in {path:?} has at least {needed} logged runs")]
    NotEnoughRuns { path: PathBuf, needed: usize },
}
