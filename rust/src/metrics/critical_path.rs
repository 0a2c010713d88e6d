//! Critical path extraction by walking the schedule backwards.

use std::cmp::Ordering;

use crate::config::SchedulingConfig;
use crate::interner::TaskIdx;
use crate::scheduler::Schedule;

/// Order candidates by duration, then by index (ascending id).
fn shorter_first(schedule: &Schedule, a: TaskIdx, b: TaskIdx) -> Ordering {
    schedule
        .entry(a)
        .duration
        .total_cmp(&schedule.entry(b).duration)
        .then(a.cmp(&b))
}

/// Critical path in execution order.
///
/// Starts at the task finishing at the makespan and repeatedly steps to the
/// predecessor whose finish equals the current task's start. Ties go to the
/// smallest duration, then the smallest id. The walk ends at a task with no
/// predecessors, or at one whose start was set by a release offset or a
/// resource wait rather than by any predecessor.
pub fn critical_path(schedule: &Schedule, config: &SchedulingConfig) -> Vec<TaskIdx> {
    let graph = schedule.graph().graph();
    let makespan = schedule.makespan();

    let Some(mut current) = (0..schedule.len() as TaskIdx)
        .filter(|&t| config.same_offset(schedule.entry(t).finish, makespan))
        .min_by(|&a, &b| shorter_first(schedule, a, b))
    else {
        return Vec::new();
    };

    let mut path = vec![current];
    loop {
        let start = schedule.entry(current).start;
        let next = graph
            .predecessors(current)
            .iter()
            .copied()
            .filter(|&p| config.same_offset(schedule.entry(p).finish, start))
            .min_by(|&a, &b| shorter_first(schedule, a, b));
        match next {
            Some(p) => {
                path.push(p);
                current = p;
            }
            None => break,
        }
    }

    path.reverse();
    path
}
