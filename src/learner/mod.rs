mod errors;
mod handle;
mod q_table;
mod traits;

pub use errors::LearnerError;
pub use handle::AgentHandle;
pub use q_table::{GreedyPolicy, QTable};
pub use traits::{Agent, Trainer};
