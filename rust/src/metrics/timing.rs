//! Precedence-only timing using forward and backward passes.

use serde::Serialize;

use crate::config::SchedulingConfig;
use crate::interner::TaskIdx;
use crate::scheduler::Schedule;

/// Per-task timing information.
///
/// Earliest and latest offsets ignore resources; slack and resource delay
/// compare them against the resource-constrained schedule.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TaskTiming {
    pub task_id: String,
    /// Earliest possible start time (from forward pass).
    pub earliest_start: f64,
    /// Earliest possible finish time (from forward pass).
    pub earliest_finish: f64,
    /// Latest start that does not push out the makespan (from backward pass).
    pub latest_start: f64,
    /// Latest finish that does not push out the makespan (from backward pass).
    pub latest_finish: f64,
    /// latest_start - scheduled start.
    pub slack: f64,
    /// scheduled start - earliest_start; time lost waiting on resources.
    pub resource_delay: f64,
    /// Zero slack within the configured tolerance.
    pub critical: bool,
}

/// Compute timings for every task, indexed like the schedule entries.
///
/// The backward pass is anchored at the schedule's own makespan, so slack is
/// never negative for a schedule that honors precedence.
pub fn task_timings(schedule: &Schedule, config: &SchedulingConfig) -> Vec<TaskTiming> {
    let validated = schedule.graph();
    let graph = validated.graph();
    let order = validated.topological_order();
    let n = graph.task_count();
    let makespan = schedule.makespan();

    // Forward pass: earliest start/finish
    let mut earliest_start = vec![0.0; n];
    let mut earliest_finish = vec![0.0; n];
    for &idx in order {
        let task = graph.task(idx);
        let es = graph
            .predecessors(idx)
            .iter()
            .map(|&p| earliest_finish[p as usize])
            .fold(task.release, f64::max);
        earliest_start[idx as usize] = es;
        earliest_finish[idx as usize] = es + task.duration;
    }

    // Backward pass: latest start/finish in reverse topological order
    let mut latest_start = vec![0.0; n];
    let mut latest_finish = vec![0.0; n];
    for &idx in order.iter().rev() {
        let lf = graph
            .successors(idx)
            .iter()
            .map(|&s| latest_start[s as usize])
            .fold(makespan, f64::min);
        latest_finish[idx as usize] = lf;
        latest_start[idx as usize] = lf - graph.task(idx).duration;
    }

    (0..n as TaskIdx)
        .map(|idx| {
            let i = idx as usize;
            let start = schedule.entry(idx).start;
            let slack = latest_start[i] - start;
            TaskTiming {
                task_id: graph.task(idx).id.clone(),
                earliest_start: earliest_start[i],
                earliest_finish: earliest_finish[i],
                latest_start: latest_start[i],
                latest_finish: latest_finish[i],
                slack,
                resource_delay: start - earliest_start[i],
                critical: slack.abs() <= config.epsilon,
            }
        })
        .collect()
}
