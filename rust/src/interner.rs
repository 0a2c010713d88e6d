//! String interning for task and resource ids.
//!
//! The graph is an arena: tasks and resources live in vectors and refer to
//! each other by integer index. The interner maps the string ids callers
//! use onto those indices; the arena nodes keep the ids for the way back.

use rustc_hash::FxHashMap;

/// Index of a task in the graph arena.
pub type TaskIdx = u32;

/// Index of a resource in the graph arena.
pub type ResourceIdx = u32;

/// Map from string ids to dense `u32` indices, assigned in insertion order.
#[derive(Debug, Clone, Default)]
pub struct IdInterner {
    to_int: FxHashMap<String, u32>,
}

impl IdInterner {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            to_int: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Intern a string that must not have been seen before.
    ///
    /// Returns `None` if the string is already interned.
    pub fn insert_unique(&mut self, s: &str) -> Option<u32> {
        if self.to_int.contains_key(s) {
            return None;
        }
        let id = self.to_int.len() as u32;
        self.to_int.insert(s.to_string(), id);
        Some(id)
    }

    #[inline]
    pub fn get(&self, s: &str) -> Option<u32> {
        self.to_int.get(s).copied()
    }
}
