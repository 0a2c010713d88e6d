//! Task graph model.
//!
//! Tasks and resources are stored in arenas indexed in ascending id order, so
//! iterating indices is deterministic and matches id ordering. Edges are kept
//! as index adjacency lists in both directions.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::interner::{IdInterner, ResourceIdx, TaskIdx};
use crate::models::{Capacity, ResourceRecord, TaskRecord};

/// Structural defects in the raw program records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Duplicate task id: {0}")]
    DuplicateTask(String),
    #[error("Duplicate resource id: {0}")]
    DuplicateResource(String),
    #[error("Task '{task}' references unknown resource '{resource}'")]
    UnknownResource { task: String, resource: String },
    #[error("Empty {0} id")]
    EmptyId(&'static str),
    #[error("Invalid {field} for '{id}': {value}")]
    InvalidValue {
        id: String,
        field: &'static str,
        value: f64,
    },
}

/// A task in the graph arena.
#[derive(Clone, Debug)]
pub struct TaskNode {
    pub id: String,
    pub label: String,
    pub group: Option<String>,
    pub duration: f64,
    /// Earliest start allowed regardless of predecessors.
    pub release: f64,
    /// Required resources with quantities; one entry per resource.
    pub requirements: Vec<(ResourceIdx, f64)>,
}

#[derive(Clone, Debug)]
pub struct ResourceNode {
    pub id: String,
    pub capacity: Capacity,
    pub description: Option<String>,
}

/// Immutable task graph built from raw records.
#[derive(Clone, Debug)]
pub struct Graph {
    tasks: Vec<TaskNode>,
    resources: Vec<ResourceNode>,
    task_index: IdInterner,
    resource_index: IdInterner,
    predecessors: Vec<Vec<TaskIdx>>,
    successors: Vec<Vec<TaskIdx>>,
    /// Predecessor ids that named no task: (task, missing id).
    unresolved: Vec<(TaskIdx, String)>,
}

fn check_value(id: &str, field: &'static str, value: f64) -> Result<(), GraphError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(GraphError::InvalidValue {
            id: id.to_string(),
            field,
            value,
        })
    }
}

impl Graph {
    /// Build the graph from raw task and resource records.
    ///
    /// Predecessor ids that do not name a task are kept aside for the
    /// validator rather than rejected here.
    pub fn build(
        mut tasks: Vec<TaskRecord>,
        mut resources: Vec<ResourceRecord>,
    ) -> Result<Self, GraphError> {
        // Stable sort keeps the first duplicate in input position
        resources.sort_by(|a, b| a.id.cmp(&b.id));
        tasks.sort_by(|a, b| a.id.cmp(&b.id));

        let mut resource_index = IdInterner::with_capacity(resources.len());
        let mut resource_nodes = Vec::with_capacity(resources.len());
        for resource in resources {
            if resource.id.is_empty() {
                return Err(GraphError::EmptyId("resource"));
            }
            if let Capacity::Finite(limit) = resource.capacity {
                if !(limit.is_finite() && limit > 0.0) {
                    return Err(GraphError::InvalidValue {
                        id: resource.id,
                        field: "capacity",
                        value: limit,
                    });
                }
            }
            if resource_index.insert_unique(&resource.id).is_none() {
                return Err(GraphError::DuplicateResource(resource.id));
            }
            resource_nodes.push(ResourceNode {
                id: resource.id,
                capacity: resource.capacity,
                description: resource.description,
            });
        }

        let mut task_index = IdInterner::with_capacity(tasks.len());
        for task in &tasks {
            if task.id.is_empty() {
                return Err(GraphError::EmptyId("task"));
            }
            if task_index.insert_unique(&task.id).is_none() {
                return Err(GraphError::DuplicateTask(task.id.clone()));
            }
        }

        let n = tasks.len();
        let mut task_nodes = Vec::with_capacity(n);
        let mut predecessors: Vec<Vec<TaskIdx>> = vec![Vec::new(); n];
        let mut successors: Vec<Vec<TaskIdx>> = vec![Vec::new(); n];
        let mut unresolved = Vec::new();

        for (idx, task) in tasks.into_iter().enumerate() {
            check_value(&task.id, "duration", task.duration)?;
            let release = task.release.unwrap_or(0.0);
            check_value(&task.id, "release", release)?;

            // Merge repeated requirements on the same resource
            let mut requirements: Vec<(ResourceIdx, f64)> = Vec::new();
            let mut positions: FxHashMap<ResourceIdx, usize> = FxHashMap::default();
            for req in &task.resources {
                check_value(&task.id, "quantity", req.quantity)?;
                let Some(r) = resource_index.get(&req.resource_id) else {
                    return Err(GraphError::UnknownResource {
                        task: task.id.clone(),
                        resource: req.resource_id.clone(),
                    });
                };
                match positions.get(&r) {
                    Some(&pos) => requirements[pos].1 += req.quantity,
                    None => {
                        positions.insert(r, requirements.len());
                        requirements.push((r, req.quantity));
                    }
                }
            }

            for pred_id in &task.predecessors {
                match task_index.get(pred_id) {
                    Some(pred) => {
                        if !predecessors[idx].contains(&pred) {
                            predecessors[idx].push(pred);
                            successors[pred as usize].push(idx as TaskIdx);
                        }
                    }
                    None => unresolved.push((idx as TaskIdx, pred_id.clone())),
                }
            }

            task_nodes.push(TaskNode {
                id: task.id,
                label: task.label,
                group: task.group,
                duration: task.duration,
                release,
                requirements,
            });
        }

        Ok(Self {
            tasks: task_nodes,
            resources: resource_nodes,
            task_index,
            resource_index,
            predecessors,
            successors,
            unresolved,
        })
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    #[inline]
    pub fn task(&self, idx: TaskIdx) -> &TaskNode {
        &self.tasks[idx as usize]
    }

    #[inline]
    pub fn resource(&self, idx: ResourceIdx) -> &ResourceNode {
        &self.resources[idx as usize]
    }

    pub fn tasks(&self) -> &[TaskNode] {
        &self.tasks
    }

    pub fn resources(&self) -> &[ResourceNode] {
        &self.resources
    }

    pub fn task_idx(&self, id: &str) -> Option<TaskIdx> {
        self.task_index.get(id)
    }

    pub fn resource_idx(&self, id: &str) -> Option<ResourceIdx> {
        self.resource_index.get(id)
    }

    #[inline]
    pub fn predecessors(&self, idx: TaskIdx) -> &[TaskIdx] {
        &self.predecessors[idx as usize]
    }

    #[inline]
    pub fn successors(&self, idx: TaskIdx) -> &[TaskIdx] {
        &self.successors[idx as usize]
    }

    pub fn unresolved(&self) -> &[(TaskIdx, String)] {
        &self.unresolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kitchen() -> Vec<ResourceRecord> {
        vec![
            ResourceRecord::finite("stove", 2.0),
            ResourceRecord::unbounded("counter"),
        ]
    }

    #[test]
    fn test_indices_follow_id_order() {
        let tasks = vec![
            TaskRecord::new("toast", 60.0),
            TaskRecord::new("bacon", 600.0),
            TaskRecord::new("eggs", 150.0).with_predecessor("bacon"),
        ];
        let graph = Graph::build(tasks, kitchen()).unwrap();

        assert_eq!(graph.task_idx("bacon"), Some(0));
        assert_eq!(graph.task_idx("eggs"), Some(1));
        assert_eq!(graph.task_idx("toast"), Some(2));
        assert_eq!(graph.resource_idx("counter"), Some(0));
        assert_eq!(graph.predecessors(1), &[0]);
        assert_eq!(graph.successors(0), &[1]);
    }

    #[test]
    fn test_duplicate_task_rejected() {
        let tasks = vec![TaskRecord::new("a", 1.0), TaskRecord::new("a", 2.0)];
        let err = Graph::build(tasks, vec![]).unwrap_err();
        assert_eq!(err, GraphError::DuplicateTask("a".to_string()));
    }

    #[test]
    fn test_duplicate_resource_rejected() {
        let resources = vec![
            ResourceRecord::finite("oven", 1.0),
            ResourceRecord::finite("oven", 2.0),
        ];
        let err = Graph::build(vec![], resources).unwrap_err();
        assert_eq!(err, GraphError::DuplicateResource("oven".to_string()));
    }

    #[test]
    fn test_unknown_resource_rejected() {
        let tasks = vec![TaskRecord::new("bake", 10.0).with_resource("oven", 1.0)];
        let err = Graph::build(tasks, kitchen()).unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownResource {
                task: "bake".to_string(),
                resource: "oven".to_string(),
            }
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Graph::build(vec![TaskRecord::new("a", -1.0)], vec![]).unwrap_err();
        assert!(matches!(err, GraphError::InvalidValue { field: "duration", .. }));

        let err = Graph::build(vec![TaskRecord::new("a", f64::NAN)], vec![]).unwrap_err();
        assert!(matches!(err, GraphError::InvalidValue { field: "duration", .. }));

        let err = Graph::build(vec![], vec![ResourceRecord::finite("r", 0.0)]).unwrap_err();
        assert!(matches!(err, GraphError::InvalidValue { field: "capacity", .. }));

        let tasks = vec![TaskRecord::new("a", 1.0).with_resource("stove", -2.0)];
        let err = Graph::build(tasks, kitchen()).unwrap_err();
        assert!(matches!(err, GraphError::InvalidValue { field: "quantity", .. }));
    }

    #[test]
    fn test_dangling_predecessor_recorded_not_rejected() {
        let tasks = vec![TaskRecord::new("a", 1.0).with_predecessor("ghost")];
        let graph = Graph::build(tasks, vec![]).unwrap();
        assert_eq!(graph.unresolved(), &[(0, "ghost".to_string())]);
        assert!(graph.predecessors(0).is_empty());
    }

    #[test]
    fn test_repeated_edges_and_requirements_collapse() {
        let tasks = vec![
            TaskRecord::new("a", 1.0),
            TaskRecord::new("b", 1.0)
                .with_predecessor("a")
                .with_predecessor("a")
                .with_resource("stove", 1.0)
                .with_resource("stove", 0.5),
        ];
        let graph = Graph::build(tasks, kitchen()).unwrap();
        let b = graph.task_idx("b").unwrap();
        assert_eq!(graph.predecessors(b).len(), 1);
        assert_eq!(graph.successors(0).len(), 1);
        let stove = graph.resource_idx("stove").unwrap();
        assert_eq!(graph.task(b).requirements, vec![(stove, 1.5)]);
    }
}
