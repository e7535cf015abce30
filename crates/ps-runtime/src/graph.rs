//! Module registry names and their declared data dependencies.
//!
//! The graph records, for every consumer, the ordered list of producers whose
//! outputs make up its input batch. Cycles are legal: each consumer reads the
//! producers' outputs from the previous tick.

use std::collections::HashMap;

use crate::error::{SchedulerError, SchedulerResult};

/// Consumer module and the ordered producers feeding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub consumer: String,
    pub producers: Vec<String>,
}

/// Registered module names plus dependency edges, both in declaration order.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    modules: Vec<String>,
    index: HashMap<String, usize>,
    edges: Vec<DependencyEdge>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module name. Returns its registry index.
    pub fn add_module(&mut self, name: &str) -> SchedulerResult<usize> {
        if name.is_empty() {
            return Err(SchedulerError::Configuration {
                what: "module name must not be empty".to_string(),
            });
        }
        if self.index.contains_key(name) {
            return Err(SchedulerError::Configuration {
                what: format!("module '{name}' already registered"),
            });
        }
        let idx = self.modules.len();
        self.modules.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        Ok(idx)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Declare the producers of `consumer`. Returns the resolved indices
    /// `(consumer, producers)`.
    pub fn declare(
        &mut self,
        consumer: &str,
        producers: &[&str],
    ) -> SchedulerResult<(usize, Vec<usize>)> {
        let consumer_idx = self.resolve(consumer, "consumer")?;
        if self.edges.iter().any(|e| e.consumer == consumer) {
            return Err(SchedulerError::Configuration {
                what: format!("dependencies of '{consumer}' already declared"),
            });
        }

        let mut producer_idx = Vec::with_capacity(producers.len());
        for (pos, producer) in producers.iter().enumerate() {
            if producers[..pos].contains(producer) {
                return Err(SchedulerError::Configuration {
                    what: format!("producer '{producer}' listed twice for '{consumer}'"),
                });
            }
            producer_idx.push(self.resolve(producer, "producer")?);
        }

        self.edges.push(DependencyEdge {
            consumer: consumer.to_string(),
            producers: producers.iter().map(|p| p.to_string()).collect(),
        });
        Ok((consumer_idx, producer_idx))
    }

    fn resolve(&self, name: &str, role: &str) -> SchedulerResult<usize> {
        self.index_of(name)
            .ok_or_else(|| SchedulerError::Configuration {
                what: format!("{role} module '{name}' is not registered"),
            })
    }

    /// Registered names in registration order.
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    /// Edges in declaration order.
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub fn producers_of(&self, consumer: &str) -> Option<&[String]> {
        self.edges
            .iter()
            .find(|e| e.consumer == consumer)
            .map(|e| e.producers.as_slice())
    }

    /// True when no chain of dependencies loops back on itself.
    pub fn is_acyclic(&self) -> bool {
        // Kahn's algorithm over producer -> consumer edges
        let mut in_degree = vec![0usize; self.modules.len()];
        let mut adj: Vec<Vec<usize>> = vec![Vec::new(); self.modules.len()];
        for edge in &self.edges {
            let Some(consumer) = self.index_of(&edge.consumer) else {
                continue;
            };
            for producer in edge.producers.iter().filter_map(|p| self.index_of(p)) {
                adj[producer].push(consumer);
                in_degree[consumer] += 1;
            }
        }

        let mut queue: Vec<usize> = (0..self.modules.len())
            .filter(|&i| in_degree[i] == 0)
            .collect();
        let mut visited = 0;
        while let Some(node) = queue.pop() {
            visited += 1;
            for &next in &adj[node] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push(next);
                }
            }
        }

        visited == self.modules.len()
    }
}
