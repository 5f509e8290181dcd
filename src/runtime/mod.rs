pub mod codec;
mod error;
mod handle;
mod scheduler;
mod service;
mod task;

pub use error::Error;
pub use handle::TaskHandle;
pub use scheduler::{BlockingScheduler, Scheduler, SchedulerConfig};
pub use service::{MethodDefinition, Service, Verb};
pub use task::{Task, TaskWrapper};
