pub mod datasets;
mod errors;
pub mod passes;
mod session;
mod traits;
mod types;
mod wrappers;

pub use datasets::{Corpora, Dataset, DatasetSplit, SplitConfig};
pub use errors::EnvError;
pub use passes::{PassPipelineEnv, PassPipelineProvider};
pub use session::Session;
pub use traits::{Env, EnvProvider};
pub use types::{Benchmark, Step};
pub use wrappers::{CycleOverBenchmarks, TimeLimit};
