use thiserror::Error;

use crate::env::EnvError;

#[derive(Error, Debug)]
pub enum LearnerError {
    #[error(transparent)]
    Env(#[from] EnvError),

    #[error("invalid training config: {0}")]
    InvalidConfig(String),

    #[error("training finished without producing a checkpoint")]
    NoCheckpoint,
}
