//! Dependency-graph scheduler for Rhylthyme programs.
//!
//! Turns a program's steps, dependency edges and resource constraints into
//! the timed data the visualizer renders:
//!
//! 1. `graph` builds an arena-indexed task graph from raw records
//! 2. `validate` rejects dangling references and cycles and fixes the order
//! 3. `scheduler` places every task, honoring precedence and capacity
//! 4. `metrics` derives makespan, critical path, slack and utilization
//!
//! Everything is synchronous and pure; independent runs share no state.

use thiserror::Error;

pub mod cache;
mod config;
pub mod graph;
mod interner;
pub mod logging;
pub mod metrics;
mod models;
pub mod program;
mod report;
pub mod scheduler;
pub mod validate;

#[cfg(feature = "python")]
mod python;

pub use cache::ScheduleCache;
pub use config::SchedulingConfig;
pub use graph::{Graph, GraphError};
pub use interner::{ResourceIdx, TaskIdx};
pub use metrics::{analyze, Metrics, ResourceUtilization, TaskTiming, UtilizationPoint};
pub use models::{
    Allocation, Capacity, ResourceRecord, ResourceRequirement, ScheduleEntry, TaskRecord,
};
pub use program::{Program, ProgramError};
pub use report::{ScheduleReport, WallClockEntry};
pub use scheduler::{schedule, Schedule, SchedulerError};
pub use validate::{validate, ValidatedGraph, ValidationError};

/// Any failure of a scheduling run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Malformed input: {0}")]
    MalformedInput(#[from] GraphError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Scheduling(#[from] SchedulerError),
    #[error("Invalid program: {0}")]
    Program(#[from] ProgramError),
}

/// Build, validate, schedule and analyze in one call.
///
/// Returns either a complete schedule satisfying every constraint or the
/// first defect found; never a partial schedule.
pub fn schedule_and_analyze(
    tasks: Vec<TaskRecord>,
    resources: Vec<ResourceRecord>,
    config: &SchedulingConfig,
) -> Result<ScheduleReport, Error> {
    let graph = Graph::build(tasks, resources)?;
    let validated = validate(graph)?;
    log_changes!(
        config.verbosity,
        "Validated {} tasks on {} resources",
        validated.graph().task_count(),
        validated.graph().resource_count()
    );

    let schedule = schedule(&validated, config)?;
    let metrics = analyze(&schedule, config);
    log_changes!(
        config.verbosity,
        "Makespan {} via {}",
        metrics.makespan,
        metrics.critical_path.join(" -> ")
    );

    Ok(ScheduleReport { schedule, metrics })
}

/// Lower a program and run it through `schedule_and_analyze`.
pub fn schedule_program(
    program: &Program,
    config: &SchedulingConfig,
) -> Result<ScheduleReport, Error> {
    let lowered = program.lower(config)?;
    schedule_and_analyze(lowered.tasks, lowered.resources, config)
}
