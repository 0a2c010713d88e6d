//! Structural validation of the task graph.
//!
//! Checks that every predecessor reference resolves and that the dependency
//! edges form a DAG, then fixes the topological order the scheduler will use.
//! Validation is strict: any cycle, including a task depending on itself,
//! rejects the whole graph.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use thiserror::Error;

use crate::graph::Graph;
use crate::interner::TaskIdx;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Task '{task}' depends on unknown task '{missing}'")]
    DanglingReference { task: String, missing: String },
    #[error("Circular dependency detected: {}", format_cycle(.cycle))]
    Cycle { cycle: Vec<String> },
}

fn format_cycle(cycle: &[String]) -> String {
    let mut parts: Vec<&str> = cycle.iter().map(String::as_str).collect();
    if let Some(first) = cycle.first() {
        parts.push(first);
    }
    parts.join(" -> ")
}

/// A graph that passed validation, with its scheduling order.
#[derive(Clone, Debug)]
pub struct ValidatedGraph {
    graph: Graph,
    order: Vec<TaskIdx>,
}

impl ValidatedGraph {
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Topological order, ties broken by ascending task id.
    pub fn topological_order(&self) -> &[TaskIdx] {
        &self.order
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }
}

/// Validate the graph, tagging it as safe to schedule.
pub fn validate(graph: Graph) -> Result<ValidatedGraph, ValidationError> {
    if let Some((task, missing)) = graph.unresolved().first() {
        return Err(ValidationError::DanglingReference {
            task: graph.task(*task).id.clone(),
            missing: missing.clone(),
        });
    }

    if let Some(cycle) = find_cycle(&graph) {
        return Err(ValidationError::Cycle {
            cycle: cycle
                .into_iter()
                .map(|idx| graph.task(idx).id.clone())
                .collect(),
        });
    }

    let order = topological_order(&graph);
    Ok(ValidatedGraph { graph, order })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Depth-first search over successor edges with an explicit stack.
///
/// Returns the tasks of the first cycle found, in edge order, starting at the
/// task that was revisited.
fn find_cycle(graph: &Graph) -> Option<Vec<TaskIdx>> {
    let n = graph.task_count();
    let mut marks = vec![Mark::Unvisited; n];
    // (task, position of the next successor to visit)
    let mut stack: Vec<(TaskIdx, usize)> = Vec::new();

    for root in 0..n as TaskIdx {
        if marks[root as usize] != Mark::Unvisited {
            continue;
        }
        marks[root as usize] = Mark::OnStack;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let (task, pos) = *frame;
            let successors = graph.successors(task);
            if pos == successors.len() {
                marks[task as usize] = Mark::Done;
                stack.pop();
                continue;
            }
            frame.1 += 1;

            let next = successors[pos];
            match marks[next as usize] {
                Mark::OnStack => {
                    let start = stack.iter().position(|(t, _)| *t == next).unwrap_or(0);
                    return Some(stack[start..].iter().map(|(t, _)| *t).collect());
                }
                Mark::Unvisited => {
                    marks[next as usize] = Mark::OnStack;
                    stack.push((next, 0));
                }
                Mark::Done => {}
            }
        }
    }

    None
}

/// Kahn's algorithm with a min-heap so the lowest index (smallest id) among
/// ready tasks always goes first. Requires an acyclic graph.
fn topological_order(graph: &Graph) -> Vec<TaskIdx> {
    let n = graph.task_count();
    let mut in_degree: Vec<usize> = (0..n as TaskIdx)
        .map(|t| graph.predecessors(t).len())
        .collect();

    let mut ready: BinaryHeap<Reverse<TaskIdx>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, &degree)| degree == 0)
        .map(|(t, _)| Reverse(t as TaskIdx))
        .collect();

    let mut order = Vec::with_capacity(n);
    while let Some(Reverse(task)) = ready.pop() {
        order.push(task);
        for &next in graph.successors(task) {
            let degree = &mut in_degree[next as usize];
            *degree -= 1;
            if *degree == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    order
}
