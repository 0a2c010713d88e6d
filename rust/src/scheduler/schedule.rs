//! The finished, immutable output of a scheduling run.

use serde::{Serialize, Serializer};

use crate::interner::TaskIdx;
use crate::models::ScheduleEntry;
use crate::validate::ValidatedGraph;

/// Timed schedule for every task of a validated graph.
///
/// Entries are indexed like the graph arena (ascending task id). The graph is
/// kept alongside so derived metrics can walk edges by index.
#[derive(Clone, Debug)]
pub struct Schedule {
    graph: ValidatedGraph,
    entries: Vec<ScheduleEntry>,
}

impl Schedule {
    pub(crate) fn new(graph: ValidatedGraph, entries: Vec<ScheduleEntry>) -> Self {
        Self { graph, entries }
    }

    pub fn graph(&self) -> &ValidatedGraph {
        &self.graph
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    #[inline]
    pub fn entry(&self, idx: TaskIdx) -> &ScheduleEntry {
        &self.entries[idx as usize]
    }

    pub fn get(&self, task_id: &str) -> Option<&ScheduleEntry> {
        self.graph
            .graph()
            .task_idx(task_id)
            .map(|idx| self.entry(idx))
    }

    /// Latest finish offset; 0 for an empty schedule.
    pub fn makespan(&self) -> f64 {
        self.entries.iter().map(|e| e.finish).fold(0.0, f64::max)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Schedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}
