//! Benchmark corpora and the train/validation/test partition.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Benchmark, EnvError};

pub const NPB: &str = "npb-v0";
pub const CHSTONE: &str = "chstone-v0";

const NPB_SIZE: usize = 122;

const CHSTONE_PROGRAMS: &[&str] = &[
    "adpcm", "aes", "blowfish", "dfadd", "dfdiv", "dfmul", "dfsin", "gsm", "jpeg", "mips",
    "motion", "sha",
];

/// A named, ordered collection of benchmarks.
#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    benchmarks: Vec<Benchmark>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, names: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        let name = name.into();
        let benchmarks = names
            .into_iter()
            .map(|n| Benchmark::from_parts(&name, n.as_ref()))
            .collect();
        Self { name, benchmarks }
    }

    pub fn npb() -> Self {
        Self::new(NPB, (1..=NPB_SIZE).map(|i| i.to_string()))
    }

    pub fn chstone() -> Self {
        Self::new(CHSTONE, CHSTONE_PROGRAMS)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn benchmarks(&self) -> &[Benchmark] {
        &self.benchmarks
    }

    pub fn contains(&self, benchmark: &Benchmark) -> bool {
        self.benchmarks.contains(benchmark)
    }
}

/// Every dataset the environment knows about.
#[derive(Debug, Clone)]
pub struct Corpora {
    datasets: Vec<Dataset>,
}

impl Corpora {
    pub fn new(datasets: Vec<Dataset>) -> Self {
        Self { datasets }
    }

    pub fn get(&self, name: &str) -> Result<&Dataset, EnvError> {
        self.datasets
            .iter()
            .find(|d| d.name() == name)
            .ok_or_else(|| EnvError::UnknownDataset(name.to_string()))
    }

    pub fn contains(&self, benchmark: &Benchmark) -> bool {
        benchmark
            .dataset()
            .and_then(|name| self.get(name).ok())
            .is_some_and(|d| d.contains(benchmark))
    }
}

impl Default for Corpora {
    fn default() -> Self {
        Self::new(vec![Dataset::npb(), Dataset::chstone()])
    }
}

/// How to carve the corpora into train, validation and test sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub train_dataset: String,
    pub train_count: usize,
    pub val_count: usize,
    pub test_dataset: String,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_dataset: NPB.to_string(),
            train_count: 50,
            val_count: 5,
            test_dataset: CHSTONE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetSplit {
    pub train: Vec<Benchmark>,
    pub val: Vec<Benchmark>,
    pub test: Vec<Benchmark>,
}

/// Train is the first `train_count` benchmarks of the train dataset, validation
/// the next `val_count`, and test is the whole test dataset. Short datasets
/// yield short sets rather than an error.
pub fn split(corpora: &Corpora, cfg: &SplitConfig) -> Result<DatasetSplit, EnvError> {
    let source = corpora.get(&cfg.train_dataset)?;
    let head: Vec<Benchmark> = source
        .benchmarks()
        .iter()
        .take(cfg.train_count.saturating_add(cfg.val_count))
        .cloned()
        .collect();
    let cut = cfg.train_count.min(head.len());
    let (train, val) = head.split_at(cut);
    let test = corpora.get(&cfg.test_dataset)?.benchmarks().to_vec();

    info!(
        train = train.len(),
        val = val.len(),
        test = test.len(),
        "partitioned benchmark corpora"
    );

    Ok(DatasetSplit {
        train: train.to_vec(),
        val: val.to_vec(),
        test,
    })
}
