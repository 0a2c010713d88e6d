//! Metrics derived from a finished schedule.
//!
//! Everything here reads the `Schedule` and never changes it: makespan,
//! critical path, per-task slack and per-resource utilization series.

mod critical_path;
mod timing;
mod utilization;

use serde::Serialize;

use crate::config::SchedulingConfig;
use crate::scheduler::Schedule;

pub use critical_path::critical_path;
pub use timing::{task_timings, TaskTiming};
pub use utilization::{resource_utilization, ResourceUtilization, UtilizationPoint};

/// Graph-level annotations of a schedule.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Metrics {
    /// Latest finish offset across all tasks.
    pub makespan: f64,
    /// Task ids of the critical chain, in execution order.
    pub critical_path: Vec<String>,
    /// Per-task timing, indexed like the schedule entries.
    pub timings: Vec<TaskTiming>,
    /// Per-resource occupancy, in ascending resource id order.
    pub utilization: Vec<ResourceUtilization>,
}

impl Metrics {
    pub fn timing(&self, task_id: &str) -> Option<&TaskTiming> {
        self.timings.iter().find(|t| t.task_id == task_id)
    }

    pub fn resource(&self, resource_id: &str) -> Option<&ResourceUtilization> {
        self.utilization.iter().find(|u| u.resource_id == resource_id)
    }
}

/// Annotate a schedule with makespan, critical path, slack and utilization.
pub fn analyze(schedule: &Schedule, config: &SchedulingConfig) -> Metrics {
    let graph = schedule.graph().graph();
    let makespan = schedule.makespan();

    let critical_path = critical_path(schedule, config)
        .into_iter()
        .map(|idx| graph.task(idx).id.clone())
        .collect();

    Metrics {
        makespan,
        critical_path,
        timings: task_timings(schedule, config),
        utilization: resource_utilization(schedule, config),
    }
}
