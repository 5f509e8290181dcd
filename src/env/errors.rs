use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("unknown benchmark: {0}")]
    UnknownBenchmark(String),

    #[error("unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("action {action} is outside the action space of {size} passes")]
    InvalidAction { action: usize, size: usize },

    #[error("step called before reset")]
    NotReset,

    #[error("no benchmarks to cycle over")]
    NoBenchmarks,

    #[error("environment is closed")]
    Closed,
}
