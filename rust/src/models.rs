//! Core data types for the scheduling system.
//!
//! Input records (`TaskRecord`, `ResourceRecord`) are what callers hand in
//! after parsing a program file; output records (`ScheduleEntry`,
//! `Allocation`) are what the rendering layer reads back. Offsets and
//! durations share one time unit (seconds for lowered programs).

use serde::{Deserialize, Serialize};

/// Slack allowed when summing fractional quantities against a capacity.
pub(crate) const CAPACITY_TOLERANCE: f64 = 1e-9;

/// Amount of a resource available at any instant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capacity {
    Finite(f64),
    Unbounded,
}

impl Capacity {
    /// Whether a single task demanding `quantity` could ever run.
    pub fn admits(&self, quantity: f64) -> bool {
        match self {
            Capacity::Finite(limit) => quantity <= *limit + CAPACITY_TOLERANCE,
            Capacity::Unbounded => true,
        }
    }

    pub fn as_finite(&self) -> Option<f64> {
        match self {
            Capacity::Finite(limit) => Some(*limit),
            Capacity::Unbounded => None,
        }
    }
}

/// A quantity of a resource held by a task for its whole duration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequirement {
    pub resource_id: String,
    pub quantity: f64,
}

/// A task ("step") as described by the program.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub duration: f64,
    /// Predecessor task ids, in declaration order.
    #[serde(default)]
    pub predecessors: Vec<String>,
    #[serde(default)]
    pub resources: Vec<ResourceRequirement>,
    /// Earliest offset the task may start at.
    #[serde(default)]
    pub release: Option<f64>,
    /// Track the task belongs to, passed through for the renderer.
    #[serde(default)]
    pub group: Option<String>,
}

impl TaskRecord {
    pub fn new(id: impl Into<String>, duration: f64) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            duration,
            predecessors: Vec::new(),
            resources: Vec::new(),
            release: None,
            group: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_predecessor(mut self, id: impl Into<String>) -> Self {
        self.predecessors.push(id.into());
        self
    }

    pub fn with_resource(mut self, resource_id: impl Into<String>, quantity: f64) -> Self {
        self.resources.push(ResourceRequirement {
            resource_id: resource_id.into(),
            quantity,
        });
        self
    }

    pub fn with_release(mut self, offset: f64) -> Self {
        self.release = Some(offset);
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// A shared resource and how much of it exists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub id: String,
    pub capacity: Capacity,
    #[serde(default)]
    pub description: Option<String>,
}

impl ResourceRecord {
    pub fn finite(id: impl Into<String>, capacity: f64) -> Self {
        Self {
            id: id.into(),
            capacity: Capacity::Finite(capacity),
            description: None,
        }
    }

    pub fn unbounded(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            capacity: Capacity::Unbounded,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A resource held by a scheduled task over `[start, finish)`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Allocation {
    pub resource_id: String,
    pub quantity: f64,
}

/// A task that has been scheduled.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScheduleEntry {
    pub task_id: String,
    pub label: String,
    pub group: Option<String>,
    pub duration: f64,
    pub start: f64,
    pub finish: f64,
    pub allocations: Vec<Allocation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_admits() {
        assert!(Capacity::Finite(3.0).admits(3.0));
        assert!(!Capacity::Finite(3.0).admits(5.0));
        assert!(Capacity::Unbounded.admits(1e12));
        assert_eq!(Capacity::Unbounded.as_finite(), None);
    }

    #[test]
    fn test_capacity_admits_float_sums() {
        // 0.1 + 0.2 lands just above 0.3 in binary floating point
        assert!(Capacity::Finite(0.3).admits(0.1 + 0.2));
        assert!(!Capacity::Finite(0.3).admits(0.31));
    }

    #[test]
    fn test_task_record_builder_defaults_label_to_id() {
        let task = TaskRecord::new("bake", 1800.0)
            .with_predecessor("mix")
            .with_resource("oven", 1.0);
        assert_eq!(task.label, "bake");
        assert_eq!(task.predecessors, vec!["mix".to_string()]);
        assert_eq!(task.resources[0].resource_id, "oven");
    }

    #[test]
    fn test_records_deserialize_with_defaults() {
        let task: TaskRecord = serde_json::from_str(r#"{"id": "a", "duration": 5}"#).unwrap();
        assert!(task.predecessors.is_empty());
        assert_eq!(task.release, None);

        let resource: ResourceRecord =
            serde_json::from_str(r#"{"id": "oven", "capacity": {"finite": 2}}"#).unwrap();
        assert_eq!(resource.capacity, Capacity::Finite(2.0));

        let resource: ResourceRecord =
            serde_json::from_str(r#"{"id": "air", "capacity": "unbounded"}"#).unwrap();
        assert_eq!(resource.capacity, Capacity::Unbounded);
    }
}
