use thiserror::Error;

use crate::env::EnvError;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error(transparent)]
    Env(#[from] EnvError),

    #[error("candidate sequence {0} is empty")]
    EmptySequence(&'static str),
}
