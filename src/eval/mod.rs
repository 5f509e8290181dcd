mod errors;
mod evaluator;
mod switching;

pub use errors::EvalError;
pub use evaluator::{EpisodeRecord, SequenceEvaluator, run_agent, run_sequences};
pub use switching::{Active, RegressionScope, SequencePair, SwitchingPolicy};
