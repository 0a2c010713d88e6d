//! Rhylthyme program descriptions and their lowering into scheduler records.
//!
//! A program groups steps into parallel tracks. Each step names at most one
//! constrained task (tool or station), a start trigger and a duration. The
//! serde layout matches the program file format, so a caller that parsed the
//! file can deserialize straight into `Program`.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SchedulingConfig;
use crate::models::{ResourceRecord, TaskRecord};

/// Defects in a program that the graph layer cannot see.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProgramError {
    #[error("Duplicate resource constraint for task '{0}'")]
    DuplicateConstraint(String),
    #[error("Resource constraint '{0}' allows no concurrent use")]
    ZeroCapacity(String),
    #[error("Step '{step}' has an invalid duration: {reason}")]
    InvalidDuration { step: String, reason: String },
    #[error("Step '{step}' has an invalid start offset: {offset}")]
    InvalidOffset { step: String, offset: f64 },
    #[error("Program '{0}' declares zero actors")]
    NoActors(String),
    #[error("Step '{step}' uses task '{task}' which has no resource constraint")]
    UnconstrainedTask { step: String, task: String },
}

/// When a step may begin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StartTrigger {
    ProgramStart,
    AfterStep {
        #[serde(rename = "stepId")]
        step_id: String,
    },
    ProgramStartOffset {
        #[serde(rename = "offsetSeconds")]
        offset_seconds: f64,
    },
}

/// How long a step takes, in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StepDuration {
    Fixed {
        seconds: f64,
    },
    /// Completion is confirmed by an operator; planning uses the default.
    Variable {
        #[serde(rename = "minSeconds")]
        min_seconds: f64,
        #[serde(rename = "maxSeconds")]
        max_seconds: f64,
        #[serde(rename = "defaultSeconds")]
        default_seconds: f64,
        #[serde(rename = "triggerName", default)]
        trigger_name: Option<String>,
    },
}

impl StepDuration {
    /// Planned duration in seconds.
    pub fn planned_seconds(&self) -> f64 {
        match self {
            StepDuration::Fixed { seconds } => *seconds,
            StepDuration::Variable {
                default_seconds, ..
            } => *default_seconds,
        }
    }

    fn check(&self) -> Result<(), String> {
        let valid = |s: f64| s.is_finite() && s >= 0.0;
        match self {
            StepDuration::Fixed { seconds } if !valid(*seconds) => {
                Err(format!("fixed duration {seconds}"))
            }
            StepDuration::Variable {
                min_seconds,
                max_seconds,
                default_seconds,
                ..
            } => {
                if ![*min_seconds, *max_seconds, *default_seconds]
                    .into_iter()
                    .all(valid)
                {
                    return Err("variable bounds must be non-negative".to_string());
                }
                if !(min_seconds <= default_seconds && default_seconds <= max_seconds) {
                    return Err(format!(
                        "default {default_seconds} outside [{min_seconds}, {max_seconds}]"
                    ));
                }
                Ok(())
            }
            StepDuration::Fixed { .. } => Ok(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub step_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Constrained task this step occupies, if any.
    #[serde(default)]
    pub task: Option<String>,
    pub start_trigger: StartTrigger,
    pub duration: StepDuration,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub track_id: String,
    pub name: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Limit on how many steps may use a task at once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceConstraint {
    pub task: String,
    pub max_concurrent: u32,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub program_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Number of workers available to run steps.
    #[serde(default)]
    pub actors: Option<u32>,
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub resource_constraints: Vec<ResourceConstraint>,
}

/// Scheduler input produced from a program.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoweredProgram {
    pub tasks: Vec<TaskRecord>,
    pub resources: Vec<ResourceRecord>,
}

impl Program {
    /// Lower the program into task and resource records.
    ///
    /// Each step becomes a task grouped under its track. A step's `task`
    /// consumes one unit of the matching constraint; `afterStep` becomes a
    /// predecessor edge and `programStartOffset` a release offset. Unknown
    /// step or task references are left for graph validation to report.
    pub fn lower(&self, config: &SchedulingConfig) -> Result<LoweredProgram, ProgramError> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut resources = Vec::with_capacity(self.resource_constraints.len() + 1);
        for constraint in &self.resource_constraints {
            if !seen.insert(constraint.task.as_str()) {
                return Err(ProgramError::DuplicateConstraint(constraint.task.clone()));
            }
            if constraint.max_concurrent == 0 {
                return Err(ProgramError::ZeroCapacity(constraint.task.clone()));
            }
            let mut record =
                ResourceRecord::finite(constraint.task.clone(), constraint.max_concurrent as f64);
            record.description = constraint.description.clone();
            resources.push(record);
        }

        let actor_pool = match (config.enforce_actors, self.actors) {
            (true, Some(0)) => return Err(ProgramError::NoActors(self.program_id.clone())),
            (true, Some(actors)) => {
                if seen.contains(config.actor_resource_id.as_str()) {
                    return Err(ProgramError::DuplicateConstraint(
                        config.actor_resource_id.clone(),
                    ));
                }
                resources.push(
                    ResourceRecord::finite(config.actor_resource_id.clone(), actors as f64)
                        .with_description("Available actors"),
                );
                Some(config.actor_resource_id.as_str())
            }
            _ => None,
        };

        let mut tasks = Vec::new();
        for track in &self.tracks {
            for step in &track.steps {
                step.duration
                    .check()
                    .map_err(|reason| ProgramError::InvalidDuration {
                        step: step.step_id.clone(),
                        reason,
                    })?;
                let duration = step.duration.planned_seconds();

                let mut task = TaskRecord::new(step.step_id.clone(), duration)
                    .with_label(step.name.clone())
                    .with_group(track.track_id.clone());

                match &step.start_trigger {
                    StartTrigger::ProgramStart => {}
                    StartTrigger::AfterStep { step_id } => {
                        task = task.with_predecessor(step_id.clone());
                    }
                    StartTrigger::ProgramStartOffset { offset_seconds } => {
                        if !(offset_seconds.is_finite() && *offset_seconds >= 0.0) {
                            return Err(ProgramError::InvalidOffset {
                                step: step.step_id.clone(),
                                offset: *offset_seconds,
                            });
                        }
                        task = task.with_release(*offset_seconds);
                    }
                }

                if let Some(name) = &step.task {
                    if !seen.contains(name.as_str()) {
                        return Err(ProgramError::UnconstrainedTask {
                            step: step.step_id.clone(),
                            task: name.clone(),
                        });
                    }
                    task = task.with_resource(name.clone(), 1.0);
                }
                if let Some(pool) = actor_pool {
                    if duration > 0.0 {
                        task = task.with_resource(pool, 1.0);
                    }
                }
                tasks.push(task);
            }
        }

        Ok(LoweredProgram { tasks, resources })
    }
}
