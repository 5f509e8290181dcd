use serde::{Deserialize, Serialize};
use std::fmt;

/// A program to optimize, addressed as `benchmark://<dataset>/<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Benchmark(String);

impl Benchmark {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn from_parts(dataset: &str, name: &str) -> Self {
        Self(format!("benchmark://{dataset}/{name}"))
    }

    pub fn uri(&self) -> &str {
        &self.0
    }

    pub fn dataset(&self) -> Option<&str> {
        self.path().map(|(dataset, _)| dataset)
    }

    pub fn name(&self) -> Option<&str> {
        self.path().map(|(_, name)| name)
    }

    fn path(&self) -> Option<(&str, &str)> {
        self.0.strip_prefix("benchmark://")?.split_once('/')
    }
}

impl fmt::Display for Benchmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the environment hands back after one action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step<O, I> {
    pub obs: O,
    pub reward: f64,
    pub done: bool,
    pub info: I,
}
