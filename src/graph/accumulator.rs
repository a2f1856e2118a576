use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

use super::types::{Edge, NewNode, Node};

/// Nodes in first-seen order and edges in append order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphSnapshot {
  pub nodes: Vec<Node>,
  pub edges: Vec<Edge>,
}

#[derive(Debug, Default)]
struct GraphState {
  // keyed on the type label, so `Other("dns")` and `Dns` are one identity
  index: HashMap<(String, String), usize>,
  nodes: Vec<Node>,
  edges: Vec<Edge>,
}

/// Shared accumulator for one run.
///
/// Nodes are unique per (type, name); a repeat observation bumps the weight
/// and keeps the first description and region. Edges are appended as given,
/// with no dedup and no check that either end exists.
#[derive(Debug, Default)]
pub struct Graph {
  state: Mutex<GraphState>,
}

impl Graph {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn upsert_node(&self, node: NewNode) {
    let mut state = self.state();
    let key = (node.node_type.as_str().to_string(), node.name.clone());

    if let Some(&i) = state.index.get(&key) {
      state.nodes[i].weight += 1;
      return;
    }

    let i = state.nodes.len();
    state.nodes.push(Node {
      node_type: node.node_type,
      name: node.name,
      description: node.description,
      weight: 1,
      region: node.region,
    });
    state.index.insert(key, i);
  }

  pub fn add_edge(&self, edge: Edge) {
    self.state().edges.push(edge);
  }

  pub fn snapshot(&self) -> GraphSnapshot {
    let state = self.state();
    GraphSnapshot {
      nodes: state.nodes.clone(),
      edges: state.edges.clone(),
    }
  }

  /// (nodes, edges) accumulated so far.
  pub fn counts(&self) -> (usize, usize) {
    let state = self.state();
    (state.nodes.len(), state.edges.len())
  }

  // Every mutation leaves the state consistent, so a poisoned lock is safe to reuse.
  fn state(&self) -> MutexGuard<'_, GraphState> {
    match self.state.lock() {
      Ok(guard) => guard,
      Err(poisoned) => {
        warn!("recovered poisoned graph lock");
        poisoned.into_inner()
      }
    }
  }
}
