//! Core list scheduler implementation.
//!
//! Tasks are placed one at a time in the validated topological order. Each
//! task starts at its precedence bound unless a required resource would be
//! oversubscribed, in which case it slides forward to the first instant where
//! capacity frees up on every resource it needs.
//!
//! This greedy policy is deterministic and favors earlier-queued tasks when
//! resources are scarce. It does not minimize makespan under contention.

use thiserror::Error;

use crate::config::SchedulingConfig;
use crate::graph::{Graph, TaskNode};
use crate::interner::TaskIdx;
use crate::models::{Allocation, ScheduleEntry};
use crate::validate::ValidatedGraph;
use crate::{log_changes, log_checks, log_debug};

use super::resource_schedule::ResourceSchedule;
use super::schedule::Schedule;

/// Errors that can occur during scheduling.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error(
        "Task '{task}' requires {demand} of resource '{resource}', which only has capacity {capacity}"
    )]
    ResourceCapacity {
        task: String,
        resource: String,
        demand: f64,
        capacity: f64,
    },
}

/// Greedy resource-constrained list scheduler.
pub struct ListScheduler<'a> {
    graph: &'a ValidatedGraph,
    config: &'a SchedulingConfig,
}

impl<'a> ListScheduler<'a> {
    pub fn new(graph: &'a ValidatedGraph, config: &'a SchedulingConfig) -> Self {
        Self { graph, config }
    }

    /// Run the scheduling algorithm.
    ///
    /// Fails as a whole if any task can never fit its resources.
    pub fn schedule(&self) -> Result<Schedule, SchedulerError> {
        let graph = self.graph.graph();
        let verbosity = self.config.verbosity;

        let mut resource_schedules: Vec<ResourceSchedule> = graph
            .resources()
            .iter()
            .map(|r| ResourceSchedule::new(r.id.clone(), r.capacity))
            .collect();

        let mut starts = vec![0.0; graph.task_count()];
        let mut finishes = vec![0.0; graph.task_count()];

        for &idx in self.graph.topological_order() {
            let task = graph.task(idx);
            self.check_capacity(graph, task)?;

            let bound = graph
                .predecessors(idx)
                .iter()
                .map(|&p| finishes[p as usize])
                .fold(task.release, f64::max);

            let (start, blocker) = self.find_start(task, bound, &resource_schedules);
            let finish = start + task.duration;

            if let Some(resource) = blocker {
                log_checks!(
                    verbosity,
                    "  Delayed {} from {} to {} waiting for {}",
                    task.id,
                    bound,
                    start,
                    resource
                );
            }
            log_changes!(
                verbosity,
                "  Scheduled task {} from {} to {}",
                task.id,
                start,
                finish
            );

            for &(r, quantity) in &task.requirements {
                resource_schedules[r as usize].add_allocation(start, finish, quantity);
            }
            starts[idx as usize] = start;
            finishes[idx as usize] = finish;
        }

        let entries = (0..graph.task_count() as TaskIdx)
            .map(|idx| {
                let task = graph.task(idx);
                ScheduleEntry {
                    task_id: task.id.clone(),
                    label: task.label.clone(),
                    group: task.group.clone(),
                    duration: task.duration,
                    start: starts[idx as usize],
                    finish: finishes[idx as usize],
                    allocations: task
                        .requirements
                        .iter()
                        .map(|&(r, quantity)| Allocation {
                            resource_id: graph.resource(r).id.clone(),
                            quantity,
                        })
                        .collect(),
                }
            })
            .collect();

        Ok(Schedule::new(self.graph.clone(), entries))
    }

    fn check_capacity(&self, graph: &Graph, task: &TaskNode) -> Result<(), SchedulerError> {
        for &(r, quantity) in &task.requirements {
            let resource = graph.resource(r);
            if !resource.capacity.admits(quantity) {
                return Err(SchedulerError::ResourceCapacity {
                    task: task.id.clone(),
                    resource: resource.id.clone(),
                    demand: quantity,
                    capacity: resource.capacity.as_finite().unwrap_or(f64::INFINITY),
                });
            }
        }
        Ok(())
    }

    /// Earliest start at or after `bound` where every requirement fits,
    /// with the id of the last resource that pushed it later.
    ///
    /// Each resource reports its own earliest fit from the current start; the
    /// start moves to the latest of those until every resource agrees.
    fn find_start<'s>(
        &self,
        task: &TaskNode,
        bound: f64,
        schedules: &'s [ResourceSchedule],
    ) -> (f64, Option<&'s str>) {
        let mut start = bound;
        let mut blocker = None;
        loop {
            let mut next = start;
            for &(r, quantity) in &task.requirements {
                let resource = &schedules[r as usize];
                let fit = resource.earliest_fit(start, task.duration, quantity);
                if fit > next {
                    log_debug!(
                        self.config.verbosity,
                        "  {} waits on {} until {}",
                        task.id,
                        resource.resource_id,
                        fit
                    );
                    next = fit;
                    blocker = Some(resource.resource_id.as_str());
                }
            }
            if next == start {
                return (start, blocker);
            }
            start = next;
        }
    }
}

/// Schedule a validated graph with the default list scheduler.
pub fn schedule(
    graph: &ValidatedGraph,
    config: &SchedulingConfig,
) -> Result<Schedule, SchedulerError> {
    ListScheduler::new(graph, config).schedule()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::models::{ResourceRecord, TaskRecord};
    use crate::validate::validate;

    fn run(tasks: Vec<TaskRecord>, resources: Vec<ResourceRecord>) -> Schedule {
        try_run(tasks, resources).unwrap()
    }

    fn try_run(
        tasks: Vec<TaskRecord>,
        resources: Vec<ResourceRecord>,
    ) -> Result<Schedule, SchedulerError> {
        let graph = validate(Graph::build(tasks, resources).unwrap()).unwrap();
        schedule(&graph, &SchedulingConfig::default())
    }

    fn span(schedule: &Schedule, id: &str) -> (f64, f64) {
        let entry = schedule.get(id).unwrap();
        (entry.start, entry.finish)
    }

    #[test]
    fn test_simple_sequential_tasks() {
        let schedule = run(
            vec![
                TaskRecord::new("a", 5.0),
                TaskRecord::new("b", 3.0).with_predecessor("a"),
            ],
            vec![],
        );
        assert_eq!(span(&schedule, "a"), (0.0, 5.0));
        assert_eq!(span(&schedule, "b"), (5.0, 8.0));
    }

    #[test]
    fn test_parallel_tasks_on_different_resources() {
        let schedule = run(
            vec![
                TaskRecord::new("a", 5.0).with_resource("r1", 1.0),
                TaskRecord::new("b", 3.0).with_resource("r2", 1.0),
            ],
            vec![
                ResourceRecord::finite("r1", 1.0),
                ResourceRecord::finite("r2", 1.0),
            ],
        );
        assert_eq!(span(&schedule, "a").0, 0.0);
        assert_eq!(span(&schedule, "b").0, 0.0);
    }

    #[test]
    fn test_shared_resource_serializes_independent_tasks() {
        let schedule = run(
            vec![
                TaskRecord::new("a", 4.0).with_resource("oven", 1.0),
                TaskRecord::new("b", 2.0).with_resource("oven", 1.0),
            ],
            vec![ResourceRecord::finite("oven", 1.0)],
        );
        // a is queued first (ascending id)
        assert_eq!(span(&schedule, "a"), (0.0, 4.0));
        assert_eq!(span(&schedule, "b"), (4.0, 6.0));
    }

    #[test]
    fn test_capacity_allows_partial_overlap() {
        let schedule = run(
            vec![
                TaskRecord::new("a", 4.0).with_resource("burner", 1.0),
                TaskRecord::new("b", 4.0).with_resource("burner", 1.0),
                TaskRecord::new("c", 1.0).with_resource("burner", 1.0),
            ],
            vec![ResourceRecord::finite("burner", 2.0)],
        );
        assert_eq!(span(&schedule, "a").0, 0.0);
        assert_eq!(span(&schedule, "b").0, 0.0);
        assert_eq!(span(&schedule, "c").0, 4.0);
    }

    #[test]
    fn test_later_task_can_backfill_earlier_gap() {
        // b is released late; c has no constraint and fills the oven before b
        let schedule = run(
            vec![
                TaskRecord::new("b", 2.0)
                    .with_resource("oven", 1.0)
                    .with_release(10.0),
                TaskRecord::new("c", 3.0).with_resource("oven", 1.0),
                TaskRecord::new("d", 10.0).with_resource("oven", 1.0),
            ],
            vec![ResourceRecord::finite("oven", 1.0)],
        );
        assert_eq!(span(&schedule, "b"), (10.0, 12.0));
        assert_eq!(span(&schedule, "c"), (0.0, 3.0));
        // d does not fit between c and b, so it goes after b
        assert_eq!(span(&schedule, "d"), (12.0, 22.0));
    }

    #[test]
    fn test_zero_duration_task_ignores_resources() {
        let schedule = run(
            vec![
                TaskRecord::new("a", 5.0).with_resource("oven", 1.0),
                TaskRecord::new("m", 0.0).with_resource("oven", 1.0),
                TaskRecord::new("z", 1.0).with_predecessor("m"),
            ],
            vec![ResourceRecord::finite("oven", 1.0)],
        );
        assert_eq!(span(&schedule, "m"), (0.0, 0.0));
        assert_eq!(span(&schedule, "z"), (0.0, 1.0));
    }

    #[test]
    fn test_unbounded_resource_never_delays() {
        let schedule = run(
            vec![
                TaskRecord::new("a", 5.0).with_resource("air", 100.0),
                TaskRecord::new("b", 5.0).with_resource("air", 100.0),
            ],
            vec![ResourceRecord::unbounded("air")],
        );
        assert_eq!(span(&schedule, "b").0, 0.0);
    }

    #[test]
    fn test_release_offset() {
        let schedule = run(vec![TaskRecord::new("a", 5.0).with_release(300.0)], vec![]);
        assert_eq!(span(&schedule, "a"), (300.0, 305.0));
    }

    #[test]
    fn test_demand_over_capacity_fails_whole_run() {
        let err = try_run(
            vec![
                TaskRecord::new("a", 1.0).with_resource("pcr", 1.0),
                TaskRecord::new("b", 1.0).with_resource("pcr", 5.0),
            ],
            vec![ResourceRecord::finite("pcr", 3.0)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            SchedulerError::ResourceCapacity {
                task: "b".to_string(),
                resource: "pcr".to_string(),
                demand: 5.0,
                capacity: 3.0,
            }
        );
    }

    #[test]
    fn test_allocations_reported_per_entry() {
        let schedule = run(
            vec![TaskRecord::new("a", 2.0)
                .with_resource("oven", 1.0)
                .with_resource("counter", 2.0)],
            vec![
                ResourceRecord::finite("oven", 1.0),
                ResourceRecord::finite("counter", 4.0),
            ],
        );
        let entry = schedule.get("a").unwrap();
        let names: Vec<&str> = entry
            .allocations
            .iter()
            .map(|a| a.resource_id.as_str())
            .collect();
        assert_eq!(names, vec!["oven", "counter"]);
        assert_eq!(entry.allocations[1].quantity, 2.0);
    }

    #[test]
    fn test_many_tasks_serialized_on_one_resource() {
        let n = 5000;
        let tasks = (0..n)
            .map(|i| TaskRecord::new(format!("t{i:05}"), 1.0).with_resource("oven", 1.0))
            .collect();
        let schedule = run(tasks, vec![ResourceRecord::finite("oven", 1.0)]);
        assert_eq!(schedule.makespan(), n as f64);
        for (i, entry) in schedule.entries().iter().enumerate() {
            assert_eq!(entry.start, i as f64);
        }
    }

    #[test]
    fn test_merged_fractional_demand_within_capacity() {
        let schedule = run(
            vec![
                TaskRecord::new("a", 1.0)
                    .with_resource("bench", 0.1)
                    .with_resource("bench", 0.2),
                TaskRecord::new("b", 1.0).with_resource("bench", 0.1),
            ],
            vec![ResourceRecord::finite("bench", 0.3)],
        );
        assert_eq!(span(&schedule, "a"), (0.0, 1.0));
        assert_eq!(span(&schedule, "b"), (1.0, 2.0));
    }

    #[test]
    fn test_wait_on_every_required_resource() {
        // c needs both; oven frees at 4, mixer at 6
        let schedule = run(
            vec![
                TaskRecord::new("a", 4.0).with_resource("oven", 1.0),
                TaskRecord::new("b", 6.0).with_resource("mixer", 1.0),
                TaskRecord::new("c", 2.0)
                    .with_resource("oven", 1.0)
                    .with_resource("mixer", 1.0),
            ],
            vec![
                ResourceRecord::finite("oven", 1.0),
                ResourceRecord::finite("mixer", 1.0),
            ],
        );
        assert_eq!(span(&schedule, "c"), (6.0, 8.0));
    }
}
