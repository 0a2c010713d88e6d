//! Resource occupancy series for the resource view.

use serde::Serialize;

use crate::config::SchedulingConfig;
use crate::interner::TaskIdx;
use crate::models::Capacity;
use crate::scheduler::Schedule;

/// Quantity in use from `time` until the next point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct UtilizationPoint {
    pub time: f64,
    pub in_use: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResourceUtilization {
    pub resource_id: String,
    /// Legend text for the resource view, when the program gave one.
    pub description: Option<String>,
    pub capacity: Capacity,
    /// Change events in time order; usage is 0 before the first one.
    pub events: Vec<UtilizationPoint>,
    /// Highest concurrent usage.
    pub peak: f64,
    /// Busy area over capacity * makespan, for finite resources.
    pub average_load: Option<f64>,
}

/// Build one occupancy series per resource, in ascending resource id order.
pub fn resource_utilization(
    schedule: &Schedule,
    config: &SchedulingConfig,
) -> Vec<ResourceUtilization> {
    let graph = schedule.graph().graph();
    let makespan = schedule.makespan();

    // (time, delta) per resource; zero-length tasks hold nothing
    let mut deltas: Vec<Vec<(f64, f64)>> = vec![Vec::new(); graph.resource_count()];
    let mut busy_area = vec![0.0; graph.resource_count()];
    for idx in 0..schedule.len() as TaskIdx {
        let entry = schedule.entry(idx);
        if entry.duration <= 0.0 {
            continue;
        }
        for &(r, quantity) in &graph.task(idx).requirements {
            if quantity <= 0.0 {
                continue;
            }
            deltas[r as usize].push((entry.start, quantity));
            deltas[r as usize].push((entry.finish, -quantity));
            busy_area[r as usize] += quantity * entry.duration;
        }
    }

    graph
        .resources()
        .iter()
        .zip(deltas)
        .zip(busy_area)
        .map(|((resource, mut deltas), area)| {
            deltas.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut events: Vec<UtilizationPoint> = Vec::new();
            let mut in_use = 0.0;
            let mut peak: f64 = 0.0;
            let mut i = 0;
            while i < deltas.len() {
                let time = deltas[i].0;
                while i < deltas.len() && config.same_offset(deltas[i].0, time) {
                    in_use += deltas[i].1;
                    i += 1;
                }
                if in_use.abs() <= config.epsilon {
                    in_use = 0.0;
                }
                let changed = events
                    .last()
                    .map_or(in_use != 0.0, |p| !config.same_offset(p.in_use, in_use));
                if changed {
                    events.push(UtilizationPoint { time, in_use });
                }
                peak = peak.max(in_use);
            }

            let average_load = match resource.capacity {
                Capacity::Finite(limit) if makespan > 0.0 => Some(area / (limit * makespan)),
                _ => None,
            };

            ResourceUtilization {
                resource_id: resource.id.clone(),
                description: resource.description.clone(),
                capacity: resource.capacity,
                events,
                peak,
                average_load,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::models::{ResourceRecord, TaskRecord};
    use crate::scheduler::schedule;
    use crate::validate::validate;

    fn utilization(
        tasks: Vec<TaskRecord>,
        resources: Vec<ResourceRecord>,
    ) -> Vec<ResourceUtilization> {
        let config = SchedulingConfig::default();
        let graph = validate(Graph::build(tasks, resources).unwrap()).unwrap();
        let schedule = schedule(&graph, &config).unwrap();
        resource_utilization(&schedule, &config)
    }

    fn points(series: &ResourceUtilization) -> Vec<(f64, f64)> {
        series.events.iter().map(|p| (p.time, p.in_use)).collect()
    }

    #[test]
    fn test_overlapping_tasks() {
        let series = utilization(
            vec![
                TaskRecord::new("a", 4.0).with_resource("burner", 1.0),
                TaskRecord::new("b", 2.0).with_resource("burner", 1.0),
            ],
            vec![ResourceRecord::finite("burner", 2.0)],
        );
        assert_eq!(points(&series[0]), vec![(0.0, 2.0), (2.0, 1.0), (4.0, 0.0)]);
        assert_eq!(series[0].peak, 2.0);
        // (4 + 2) busy units over 2 burners * 4 time units
        assert_eq!(series[0].average_load, Some(0.75));
    }

    #[test]
    fn test_back_to_back_handoff_merges() {
        let series = utilization(
            vec![
                TaskRecord::new("a", 3.0).with_resource("oven", 1.0),
                TaskRecord::new("b", 3.0).with_resource("oven", 1.0),
            ],
            vec![ResourceRecord::finite("oven", 1.0)],
        );
        // b takes over at 3 without the series dipping to 0
        assert_eq!(points(&series[0]), vec![(0.0, 1.0), (6.0, 0.0)]);
        assert_eq!(series[0].average_load, Some(1.0));
    }

    #[test]
    fn test_unused_and_unbounded_resources() {
        let series = utilization(
            vec![
                TaskRecord::new("a", 2.0).with_resource("air", 7.0),
                TaskRecord::new("m", 0.0).with_resource("spare", 1.0),
            ],
            vec![
                ResourceRecord::unbounded("air"),
                ResourceRecord::finite("spare", 1.0).with_description("Spare burner"),
            ],
        );
        assert_eq!(series[0].resource_id, "air");
        assert_eq!(series[0].description, None);
        assert_eq!(points(&series[0]), vec![(0.0, 7.0), (2.0, 0.0)]);
        assert_eq!(series[0].average_load, None);

        assert_eq!(series[1].resource_id, "spare");
        assert_eq!(series[1].description.as_deref(), Some("Spare burner"));
        assert!(series[1].events.is_empty());
        assert_eq!(series[1].peak, 0.0);
        assert_eq!(series[1].average_load, Some(0.0));
    }
}
