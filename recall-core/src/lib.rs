pub mod calendar;
pub mod errors;
pub mod filters;
pub mod models;
pub mod repo;
pub mod scheduler;
pub mod service;
pub mod stage;
pub mod stats;

pub use calendar::add_calendar_days;
pub use errors::*;
pub use filters::*;
pub use models::*;
pub use repo::*;
pub use scheduler::*;
pub use service::*;
pub use stage::*;
pub use stats::*;
