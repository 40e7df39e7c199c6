//! Dependency graph over work orders: cycle detection and topological order.
//!
//! Nodes are dense indices in input order; parent and child edges are
//! adjacency lists over those indices, with a single id-to-index map at the
//! boundary. Duplicate parent ids are tolerated (the edge is simply counted
//! twice); a self-edge surfaces as a cycle.

use rustc_hash::FxHashMap;
use std::collections::VecDeque;

use crate::models::WorkOrderDoc;

/// Errors from graph construction and ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A work order depends on an id not present in the input set.
    DanglingDependency {
        work_order_id: String,
        missing_id: String,
    },
    /// The dependency relation contains a cycle.
    CircularDependency { path: Vec<String> },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DanglingDependency {
                work_order_id,
                missing_id,
            } => write!(
                f,
                "Work order {} depends on unknown work order {}",
                work_order_id, missing_id
            ),
            Self::CircularDependency { path } => {
                write!(f, "Circular dependency detected: {}", path.join(" -> "))
            }
        }
    }
}

impl std::error::Error for GraphError {}

#[derive(Clone, Copy, PartialEq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Parent/child index over a set of work orders.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    ids: Vec<String>,
    parents: Vec<Vec<usize>>,
    children: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Builds the graph, failing on any dependency id that names no work
    /// order in the set.
    pub fn build(work_orders: &[WorkOrderDoc]) -> Result<Self, GraphError> {
        let ids: Vec<String> = work_orders.iter().map(|wo| wo.doc_id.clone()).collect();
        let index_of: FxHashMap<&str, usize> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        let mut parents: Vec<Vec<usize>> = vec![Vec::new(); work_orders.len()];
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); work_orders.len()];
        for (i, wo) in work_orders.iter().enumerate() {
            for dep_id in &wo.data.depends_on_work_order_ids {
                let Some(&p) = index_of.get(dep_id.as_str()) else {
                    return Err(GraphError::DanglingDependency {
                        work_order_id: wo.doc_id.clone(),
                        missing_id: dep_id.clone(),
                    });
                };
                parents[i].push(p);
                children[p].push(i);
            }
        }

        Ok(Self {
            ids,
            parents,
            children,
        })
    }

    /// Work order id for a node index.
    pub fn id_of(&self, index: usize) -> &str {
        &self.ids[index]
    }

    /// Parent indices (prerequisites) of a node. May contain duplicates.
    pub fn parents_of(&self, index: usize) -> &[usize] {
        &self.parents[index]
    }

    /// Finds a dependency cycle, if any, and reports the closing path.
    ///
    /// Three-color depth-first search over parent edges; a gray neighbor
    /// closes a cycle. All components are examined.
    pub fn detect_cycle(&self) -> Option<Vec<String>> {
        let mut color = vec![Color::White; self.ids.len()];
        let mut stack: Vec<usize> = Vec::new();
        for start in 0..self.ids.len() {
            if color[start] == Color::White {
                if let Some(cycle) = self.visit(start, &mut color, &mut stack) {
                    return Some(cycle.into_iter().map(|i| self.ids[i].clone()).collect());
                }
            }
        }
        None
    }

    fn visit(&self, node: usize, color: &mut [Color], stack: &mut Vec<usize>) -> Option<Vec<usize>> {
        color[node] = Color::Gray;
        stack.push(node);
        for &parent in &self.parents[node] {
            match color[parent] {
                Color::Gray => {
                    // The gray node is on the stack; the cycle is the suffix
                    // from its first occurrence, closed back on itself.
                    let pos = stack.iter().position(|&n| n == parent).unwrap_or(0);
                    let mut cycle: Vec<usize> = stack[pos..].to_vec();
                    cycle.push(parent);
                    return Some(cycle);
                }
                Color::White => {
                    if let Some(cycle) = self.visit(parent, color, stack) {
                        return Some(cycle);
                    }
                }
                Color::Black => {}
            }
        }
        stack.pop();
        color[node] = Color::Black;
        None
    }

    /// Topological order via Kahn's algorithm.
    ///
    /// Zero-indegree nodes are seeded in input order and the queue is FIFO,
    /// so ties resolve deterministically by input position. A short output
    /// means a cycle; that is a hard failure even though `detect_cycle`
    /// already covers it.
    pub fn toposort(&self) -> Result<Vec<usize>, GraphError> {
        let mut in_degree: Vec<usize> = self.parents.iter().map(|p| p.len()).collect();
        let mut queue: VecDeque<usize> = (0..self.ids.len())
            .filter(|&i| in_degree[i] == 0)
            .collect();

        let mut order: Vec<usize> = Vec::with_capacity(self.ids.len());
        while let Some(node) = queue.pop_front() {
            order.push(node);
            for &child in &self.children[node] {
                in_degree[child] -= 1;
                if in_degree[child] == 0 {
                    queue.push_back(child);
                }
            }
        }

        if order.len() != self.ids.len() {
            let path: Vec<String> = (0..self.ids.len())
                .filter(|&i| in_degree[i] > 0)
                .map(|i| self.ids[i].clone())
                .collect();
            return Err(GraphError::CircularDependency { path });
        }
        Ok(order)
    }
}
