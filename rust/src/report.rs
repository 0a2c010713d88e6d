//! Combined scheduler output handed to the rendering layer.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::metrics::{Metrics, TaskTiming};
use crate::models::ScheduleEntry;
use crate::scheduler::Schedule;

/// Schedule plus the metrics derived from it.
#[derive(Clone, Debug, Serialize)]
pub struct ScheduleReport {
    pub schedule: Schedule,
    pub metrics: Metrics,
}

/// A scheduled task placed on the wall clock.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WallClockEntry {
    pub task_id: String,
    pub start_at: NaiveDateTime,
    pub finish_at: NaiveDateTime,
}

fn offset_to_datetime(anchor: NaiveDateTime, seconds: f64) -> NaiveDateTime {
    let millis = (seconds * 1000.0).round() as i64;
    anchor
        .checked_add_signed(Duration::milliseconds(millis))
        .unwrap_or(NaiveDateTime::MAX)
}

impl ScheduleReport {
    pub fn entry(&self, task_id: &str) -> Option<&ScheduleEntry> {
        self.schedule.get(task_id)
    }

    pub fn timing(&self, task_id: &str) -> Option<&TaskTiming> {
        self.schedule
            .graph()
            .graph()
            .task_idx(task_id)
            .and_then(|idx| self.metrics.timings.get(idx as usize))
    }

    /// Project offsets (in seconds) onto the wall clock, starting at `anchor`.
    ///
    /// Entries come out in start order, ties by task id.
    pub fn wall_clock(&self, anchor: NaiveDateTime) -> Vec<WallClockEntry> {
        let mut entries: Vec<&ScheduleEntry> = self.schedule.entries().iter().collect();
        entries.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.task_id.cmp(&b.task_id)));
        entries
            .into_iter()
            .map(|e| WallClockEntry {
                task_id: e.task_id.clone(),
                start_at: offset_to_datetime(anchor, e.start),
                finish_at: offset_to_datetime(anchor, e.finish),
            })
            .collect()
    }
}
