//! Caller-owned memo of scheduling results.
//!
//! The scheduler itself keeps no state between runs. A service that sees the
//! same program repeatedly can hold a `ScheduleCache` and look results up by
//! a fingerprint of the input records. Entries keep their input so a
//! fingerprint collision never returns another program's report.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHasher};

use crate::config::SchedulingConfig;
use crate::models::{Capacity, ResourceRecord, TaskRecord};
use crate::report::ScheduleReport;
use crate::Error;

struct CacheEntry {
    tasks: Vec<TaskRecord>,
    resources: Vec<ResourceRecord>,
    epsilon: f64,
    report: Arc<ScheduleReport>,
}

impl CacheEntry {
    fn matches(&self, tasks: &[TaskRecord], resources: &[ResourceRecord], epsilon: f64) -> bool {
        self.epsilon.to_bits() == epsilon.to_bits()
            && self.tasks == tasks
            && self.resources == resources
    }
}

/// Memo of successful reports keyed by input fingerprint.
///
/// Failed runs are not stored; they are cheap to reproduce and callers
/// usually fix the input rather than resubmit it.
#[derive(Default)]
pub struct ScheduleCache {
    entries: FxHashMap<u64, CacheEntry>,
    hits: usize,
    misses: usize,
}

/// Fingerprint of everything that affects a report.
///
/// Verbosity is left out since it only changes logging.
pub fn fingerprint(
    tasks: &[TaskRecord],
    resources: &[ResourceRecord],
    config: &SchedulingConfig,
) -> u64 {
    let mut hasher = FxHasher::default();
    for task in tasks {
        task.id.hash(&mut hasher);
        task.label.hash(&mut hasher);
        task.duration.to_bits().hash(&mut hasher);
        task.predecessors.hash(&mut hasher);
        for req in &task.resources {
            req.resource_id.hash(&mut hasher);
            req.quantity.to_bits().hash(&mut hasher);
        }
        task.release.map(f64::to_bits).hash(&mut hasher);
        task.group.hash(&mut hasher);
    }
    for resource in resources {
        resource.id.hash(&mut hasher);
        match resource.capacity {
            Capacity::Finite(limit) => limit.to_bits().hash(&mut hasher),
            Capacity::Unbounded => u64::MAX.hash(&mut hasher),
        }
        resource.description.hash(&mut hasher);
    }
    config.epsilon.to_bits().hash(&mut hasher);
    hasher.finish()
}

impl ScheduleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached report for this input, computing it on a miss.
    pub fn get_or_compute(
        &mut self,
        tasks: &[TaskRecord],
        resources: &[ResourceRecord],
        config: &SchedulingConfig,
    ) -> Result<Arc<ScheduleReport>, Error> {
        let key = fingerprint(tasks, resources, config);
        if let Some(entry) = self.entries.get(&key) {
            if entry.matches(tasks, resources, config.epsilon) {
                self.hits += 1;
                return Ok(Arc::clone(&entry.report));
            }
        }

        self.misses += 1;
        let report = Arc::new(crate::schedule_and_analyze(
            tasks.to_vec(),
            resources.to_vec(),
            config,
        )?);
        self.entries.insert(
            key,
            CacheEntry {
                tasks: tasks.to_vec(),
                resources: resources.to_vec(),
                epsilon: config.epsilon,
                report: Arc::clone(&report),
            },
        );
        Ok(report)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Vec<TaskRecord>, Vec<ResourceRecord>) {
        (
            vec![
                TaskRecord::new("a", 4.0).with_resource("oven", 1.0),
                TaskRecord::new("b", 2.0).with_resource("oven", 1.0),
            ],
            vec![ResourceRecord::finite("oven", 1.0)],
        )
    }

    #[test]
    fn test_hit_returns_same_report() {
        let (tasks, resources) = sample();
        let config = SchedulingConfig::default();
        let mut cache = ScheduleCache::new();

        let first = cache.get_or_compute(&tasks, &resources, &config).unwrap();
        let second = cache.get_or_compute(&tasks, &resources, &config).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_changed_input_misses() {
        let (mut tasks, resources) = sample();
        let config = SchedulingConfig::default();
        let mut cache = ScheduleCache::new();

        cache.get_or_compute(&tasks, &resources, &config).unwrap();
        tasks[1].duration = 3.0;
        let report = cache.get_or_compute(&tasks, &resources, &config).unwrap();

        assert_eq!(report.metrics.makespan, 7.0);
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_verbosity_does_not_change_fingerprint() {
        let (tasks, resources) = sample();
        let quiet = SchedulingConfig::default();
        let loud = SchedulingConfig::default().with_verbosity(3);
        assert_eq!(
            fingerprint(&tasks, &resources, &quiet),
            fingerprint(&tasks, &resources, &loud)
        );
    }

    #[test]
    fn test_errors_are_not_cached() {
        let tasks = vec![TaskRecord::new("a", 1.0).with_resource("oven", 2.0)];
        let resources = vec![ResourceRecord::finite("oven", 1.0)];
        let mut cache = ScheduleCache::new();

        assert!(cache
            .get_or_compute(&tasks, &resources, &SchedulingConfig::default())
            .is_err());
        assert!(cache.is_empty());
    }
}
