use thiserror::Error;

use crate::eval::EvalError;
use crate::learner::LearnerError;
use crate::runtime;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("no trained agent; call train first")]
    NotTrained,

    #[error("training failed: {0}")]
    Learner(#[from] LearnerError),

    #[error("evaluation failed: {0}")]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Runtime(#[from] runtime::Error),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::NotTrained => 409,
            ApiError::Runtime(runtime::Error::UnknownMethod(_)) => 404,
            ApiError::Runtime(runtime::Error::Deserialize(_)) => 400,
            _ => 500,
        }
    }
}
