//! Python bindings used by the web visualizer.
//!
//! The visualizer builds `Task`/`Resource` objects from a parsed program and
//! reads back a plain dict it can hand straight to the DAG, timeline and
//! resource views.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::{schedule_and_analyze, ResourceRecord, ScheduleReport, SchedulingConfig, TaskRecord};

/// Task input (PyO3 wrapper).
#[pyclass(name = "Task")]
#[derive(Clone, Debug)]
pub struct PyTask {
    #[pyo3(get, set)]
    pub id: String,
    #[pyo3(get, set)]
    pub duration: f64,
    #[pyo3(get, set)]
    pub predecessors: Vec<String>,
    #[pyo3(get, set)]
    pub resources: Vec<(String, f64)>,
    #[pyo3(get, set)]
    pub label: Option<String>,
    #[pyo3(get, set)]
    pub release: Option<f64>,
    #[pyo3(get, set)]
    pub group: Option<String>,
}

#[pymethods]
impl PyTask {
    #[new]
    #[pyo3(signature = (id, duration, predecessors=None, resources=None, label=None, release=None, group=None))]
    fn new(
        id: String,
        duration: f64,
        predecessors: Option<Vec<String>>,
        resources: Option<Vec<(String, f64)>>,
        label: Option<String>,
        release: Option<f64>,
        group: Option<String>,
    ) -> Self {
        Self {
            id,
            duration,
            predecessors: predecessors.unwrap_or_default(),
            resources: resources.unwrap_or_default(),
            label,
            release,
            group,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Task(id={:?}, duration={}, predecessors={}, resources={})",
            self.id,
            self.duration,
            self.predecessors.len(),
            self.resources.len()
        )
    }
}

impl From<PyTask> for TaskRecord {
    fn from(task: PyTask) -> Self {
        let label = task.label.unwrap_or_else(|| task.id.clone());
        let mut record = TaskRecord::new(task.id, task.duration).with_label(label);
        record.predecessors = task.predecessors;
        for (resource_id, quantity) in task.resources {
            record = record.with_resource(resource_id, quantity);
        }
        record.release = task.release;
        record.group = task.group;
        record
    }
}

/// Resource input (PyO3 wrapper). `capacity=None` means unbounded.
#[pyclass(name = "Resource")]
#[derive(Clone, Debug)]
pub struct PyResource {
    #[pyo3(get, set)]
    pub id: String,
    #[pyo3(get, set)]
    pub capacity: Option<f64>,
    #[pyo3(get, set)]
    pub description: Option<String>,
}

#[pymethods]
impl PyResource {
    #[new]
    #[pyo3(signature = (id, capacity=None, description=None))]
    fn new(id: String, capacity: Option<f64>, description: Option<String>) -> Self {
        Self {
            id,
            capacity,
            description,
        }
    }

    fn __repr__(&self) -> String {
        format!("Resource(id={:?}, capacity={:?})", self.id, self.capacity)
    }
}

impl From<PyResource> for ResourceRecord {
    fn from(resource: PyResource) -> Self {
        let mut record = match resource.capacity {
            Some(limit) => ResourceRecord::finite(resource.id, limit),
            None => ResourceRecord::unbounded(resource.id),
        };
        record.description = resource.description;
        record
    }
}

#[pymethods]
impl SchedulingConfig {
    #[new]
    #[pyo3(signature = (verbosity=0, epsilon=1e-9, enforce_actors=false, actor_resource_id=None))]
    fn py_new(
        verbosity: u8,
        epsilon: f64,
        enforce_actors: bool,
        actor_resource_id: Option<String>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            verbosity,
            epsilon,
            enforce_actors,
            actor_resource_id: actor_resource_id.unwrap_or(defaults.actor_resource_id),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "SchedulingConfig(verbosity={}, epsilon={}, enforce_actors={})",
            self.verbosity, self.epsilon, self.enforce_actors
        )
    }
}

fn report_to_dict<'py>(py: Python<'py>, report: &ScheduleReport) -> PyResult<Bound<'py, PyDict>> {
    let tasks = PyList::empty_bound(py);
    for entry in report.schedule.entries() {
        let item = PyDict::new_bound(py);
        item.set_item("id", &entry.task_id)?;
        item.set_item("label", &entry.label)?;
        item.set_item("group", entry.group.as_deref())?;
        item.set_item("start", entry.start)?;
        item.set_item("finish", entry.finish)?;
        item.set_item("duration", entry.duration)?;
        let allocations: Vec<(&str, f64)> = entry
            .allocations
            .iter()
            .map(|a| (a.resource_id.as_str(), a.quantity))
            .collect();
        item.set_item("allocations", allocations)?;
        tasks.append(item)?;
    }

    let timings = PyDict::new_bound(py);
    for timing in &report.metrics.timings {
        let item = PyDict::new_bound(py);
        item.set_item("earliest_start", timing.earliest_start)?;
        item.set_item("latest_start", timing.latest_start)?;
        item.set_item("slack", timing.slack)?;
        item.set_item("resource_delay", timing.resource_delay)?;
        item.set_item("critical", timing.critical)?;
        timings.set_item(&timing.task_id, item)?;
    }

    let utilization = PyDict::new_bound(py);
    for series in &report.metrics.utilization {
        let item = PyDict::new_bound(py);
        item.set_item("description", series.description.as_deref())?;
        item.set_item("capacity", series.capacity.as_finite())?;
        let events: Vec<(f64, f64)> = series.events.iter().map(|p| (p.time, p.in_use)).collect();
        item.set_item("events", events)?;
        item.set_item("peak", series.peak)?;
        item.set_item("average_load", series.average_load)?;
        utilization.set_item(&series.resource_id, item)?;
    }

    let out = PyDict::new_bound(py);
    out.set_item("tasks", tasks)?;
    out.set_item("makespan", report.metrics.makespan)?;
    out.set_item("critical_path", &report.metrics.critical_path)?;
    out.set_item("timings", timings)?;
    out.set_item("utilization", utilization)?;
    Ok(out)
}

/// Schedule tasks and compute metrics.
///
/// # Returns
/// * Dict with `tasks`, `makespan`, `critical_path`, `timings`, `utilization`
///
/// # Raises
/// * ValueError on malformed input, dangling references, cycles, or a task
///   demanding more than a resource's capacity
#[pyfunction]
#[pyo3(name = "schedule_and_analyze", signature = (tasks, resources, config=None))]
fn py_schedule_and_analyze<'py>(
    py: Python<'py>,
    tasks: Vec<PyTask>,
    resources: Vec<PyResource>,
    config: Option<SchedulingConfig>,
) -> PyResult<Bound<'py, PyDict>> {
    let config = config.unwrap_or_default();
    let report = schedule_and_analyze(
        tasks.into_iter().map(TaskRecord::from).collect(),
        resources.into_iter().map(ResourceRecord::from).collect(),
        &config,
    )
    .map_err(|e| PyValueError::new_err(e.to_string()))?;
    report_to_dict(py, &report)
}

/// The rhylthyme_scheduler Python module.
#[pymodule]
fn rhylthyme_scheduler(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyTask>()?;
    m.add_class::<PyResource>()?;
    m.add_class::<SchedulingConfig>()?;
    m.add_function(wrap_pyfunction!(py_schedule_and_analyze, m)?)?;
    Ok(())
}
