pub mod api;
pub mod config;
pub mod env;
pub mod eval;
pub mod learner;
pub mod runtime;
pub mod train;
