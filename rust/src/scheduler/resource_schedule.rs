//! Resource occupancy tracking as a piecewise-constant usage profile.

use crate::models::{Capacity, CAPACITY_TOLERANCE};

/// Tracks how much of one resource is held over time.
///
/// The profile is a list of breakpoints `(time, in_use)`, sorted by time;
/// `in_use` holds from that breakpoint until the next one, and usage before
/// the first breakpoint is zero. Allocations are half-open `[start, finish)`
/// intervals, so a task finishing at `t` frees its share for a task starting
/// at `t`. Adjacent breakpoints with equal usage are merged, so back-to-back
/// allocations keep the profile short.
#[derive(Clone, Debug)]
pub struct ResourceSchedule {
    pub resource_id: String,
    pub capacity: Capacity,
    profile: Vec<(f64, f64)>,
}

impl ResourceSchedule {
    pub fn new(resource_id: String, capacity: Capacity) -> Self {
        Self {
            resource_id,
            capacity,
            profile: Vec::new(),
        }
    }

    /// Index of the breakpoint at `t`, inserting one if needed.
    fn split_at(&mut self, t: f64) -> usize {
        let idx = self.profile.partition_point(|&(s, _)| s < t);
        if idx < self.profile.len() && self.profile[idx].0 == t {
            return idx;
        }
        let carried = if idx == 0 { 0.0 } else { self.profile[idx - 1].1 };
        self.profile.insert(idx, (t, carried));
        idx
    }

    /// Drop the breakpoint at `idx` if it does not change usage.
    fn merge_at(&mut self, idx: usize) {
        if idx >= self.profile.len() {
            return;
        }
        let before = if idx == 0 { 0.0 } else { self.profile[idx - 1].1 };
        if self.profile[idx].1 == before {
            self.profile.remove(idx);
        }
    }

    /// Record that `quantity` is held over `[start, finish)`.
    ///
    /// Empty intervals and zero quantities occupy nothing and are dropped.
    pub fn add_allocation(&mut self, start: f64, finish: f64, quantity: f64) {
        if finish <= start || quantity <= 0.0 {
            return;
        }
        let first = self.split_at(start);
        let last = self.split_at(finish);
        for point in &mut self.profile[first..last] {
            point.1 += quantity;
        }
        // Merge the later breakpoint first so `first` stays valid
        self.merge_at(last);
        self.merge_at(first);
    }

    /// Total quantity held at instant `t`.
    pub fn in_use_at(&self, t: f64) -> f64 {
        match self.profile.partition_point(|&(s, _)| s <= t) {
            0 => 0.0,
            idx => self.profile[idx - 1].1,
        }
    }

    /// Number of breakpoints in the usage profile.
    pub fn breakpoints(&self) -> usize {
        self.profile.len()
    }

    /// Earliest start at or after `from` where `quantity` more fits for the
    /// whole window `[start, start + duration)`.
    ///
    /// Walks the profile forward once: whenever a segment inside the window
    /// is too full, the window restarts where that segment ends. Returns
    /// infinity when the quantity can never fit.
    pub fn earliest_fit(&self, from: f64, duration: f64, quantity: f64) -> f64 {
        let limit = match self.capacity {
            Capacity::Unbounded => return from,
            Capacity::Finite(limit) => limit,
        };
        if duration <= 0.0 || quantity <= 0.0 {
            return from;
        }
        let allowed = limit + CAPACITY_TOLERANCE - quantity;
        if allowed < 0.0 {
            return f64::INFINITY;
        }

        let mut start = from;
        // Segment `next - 1` contains `start`; segments from `next` on begin after it
        let mut next = self.profile.partition_point(|&(s, _)| s <= start);
        if next > 0 && self.profile[next - 1].1 > allowed {
            match self.profile.get(next) {
                Some(&(s, _)) => start = s,
                None => return f64::INFINITY,
            }
        }

        while next < self.profile.len() && self.profile[next].0 < start + duration {
            let (_, in_use) = self.profile[next];
            next += 1;
            if in_use > allowed {
                match self.profile.get(next) {
                    Some(&(s, _)) => start = s,
                    None => return f64::INFINITY,
                }
            }
        }
        start
    }

    /// Whether `quantity` more fits for the whole window starting at `start`.
    pub fn fits(&self, start: f64, duration: f64, quantity: f64) -> bool {
        self.earliest_fit(start, duration, quantity) == start
    }
}
