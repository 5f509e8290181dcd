mod errors;
pub mod http;
mod service;
mod types;

pub use errors::ApiError;
pub use service::{OptimizerService, Workspace, evaluate};
pub use types::{ErrorResponse, EvaluateResponse, TrainResponse};
