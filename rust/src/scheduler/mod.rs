//! Resource-constrained list scheduler.
//!
//! Places every task of a validated graph at its earliest start that honors
//! both precedence and resource capacity, producing an immutable `Schedule`.

mod core;
mod resource_schedule;
mod schedule;

pub use core::{schedule, ListScheduler, SchedulerError};
pub use resource_schedule::ResourceSchedule;
pub use schedule::Schedule;
